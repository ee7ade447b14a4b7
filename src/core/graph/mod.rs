//! Graph module for deadlock detection
//!
//! This module contains the resource-allocation graph used for single-instance
//! deadlock detection: processes and resources as nodes, allocation edges
//! (resource to process) and request edges (process to resource).

pub mod rag;

pub use rag::{EdgeKind, NodeKind, ResourceAllocationGraph, detect_cycle};
