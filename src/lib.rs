//! # resalloc
//!
//! Deadlock analysis over resource-allocation snapshots.
//!
//! resalloc answers questions about a system of processes competing for
//! counted resources. Each call takes an immutable snapshot and returns a
//! verdict; nothing is remembered between calls.
//!
//! ## Features
//!
//! - Banker's safety and request algorithms
//! - Cycle detection on resource-allocation graphs
//! - Multi-instance deadlock detection (work/finish)
//! - Victim selection for recovery, with pluggable policies
//! - Step-by-step acquisition simulation
//! - JSON request/response contract, CLI and C ABI
//! - Optional analysis event log (`logging` feature) with compact export
//!
//! ## Example
//!
//! ```
//! use resalloc::{ResourceModel, banker};
//!
//! let model = ResourceModel::anonymous(
//!     &[10, 5, 7],
//!     &vec![vec![7, 5, 3], vec![3, 2, 2], vec![9, 0, 2], vec![2, 2, 2], vec![4, 3, 3]],
//!     &vec![vec![0, 1, 0], vec![2, 0, 0], vec![3, 0, 2], vec![2, 1, 1], vec![0, 0, 2]],
//! )
//! .unwrap();
//!
//! let report = banker::is_safe(&model);
//! assert!(report.safe);
//! assert_eq!(report.sequence_names(&model), ["P2", "P4", "P1", "P3", "P5"]);
//! ```

mod core;
pub use crate::core::{
    Engine, EngineConfig, banker, detector,
    error::{AnalysisError, RequestRejection, Result},
    graph::{self, ResourceAllocationGraph, detect_cycle},
    model::ResourceModel,
    recovery::{self, HoldMostNeedLeast, MinAllocation, PolicyKind, VictimPolicy},
    simulation::{self, SimulationReport, Step},
    types::{
        Available, DeadlockReport, DeadlockSource, LogEntry, Matrix, Operation, ProcessId,
        RawMatrix, ResourceId, Units, Verdict,
    },
};

#[cfg(feature = "logging")]
pub use crate::core::logger::EventLogger;

pub mod export;
pub mod ffi;
pub mod protocol;
pub use protocol::{Request, Response};
