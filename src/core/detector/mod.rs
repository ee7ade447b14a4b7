//! Deadlock detection over current state
//!
//! Single-instance detection lives with the graph (`core::graph`); this
//! module holds the matrix-based detector for resources with several
//! instances, where a cycle alone does not prove deadlock.

pub mod multi_instance;

pub use multi_instance::{MultiInstanceReport, detect, detect_in_model};
