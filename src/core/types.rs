use crate::core::error::Result;
use crate::core::model::{free_units, validate_matrix, validate_vector};
use serde::{Deserialize, Serialize};

/// Process identifier type
///
/// Names a row of every matrix, e.g. `"P1"`.
pub type ProcessId = String;

/// Resource identifier type
///
/// Names a column of every matrix, e.g. `"R1"`.
pub type ResourceId = String;

/// Units of a resource
pub type Units = u64;

/// Matrix as it arrives on the wire: signed so negative entries can be reported
pub type RawMatrix = Vec<Vec<i64>>;

/// Validated, row-major matrix (processes x resources)
pub type Matrix = Vec<Vec<Units>>;

/// Where the free-units vector of a snapshot comes from
///
/// Banker bookkeeping always derives availability from the totals. Detection
/// scenarios may hand in a manual vector that does not agree with the
/// allocation matrix; that vector is taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Available {
    /// `total[j] - sum_i allocation[i][j]`
    Derived { total: Vec<i64> },
    /// Explicit vector supplied by the caller
    Overridden(Vec<i64>),
}

impl Available {
    /// Resolve into a concrete free-units vector for the given allocation
    ///
    /// # Errors
    /// Returns `ShapeMismatch` or `NegativeValue` for a malformed vector, and
    /// `AllocationExceedsTotal` when a derived column would go negative.
    pub fn resolve(&self, allocation: &Matrix, columns: usize) -> Result<Vec<Units>> {
        match self {
            Available::Overridden(raw) => validate_vector("available", raw, columns),
            Available::Derived { total } => {
                let total = validate_vector("total", total, columns)?;
                free_units(&total, allocation)
            }
        }
    }
}

/// Validate a raw allocation matrix for use with an `Available` variant
pub(crate) fn validate_allocation(raw: &RawMatrix, columns: usize) -> Result<Matrix> {
    validate_matrix("allocation", raw, raw.len(), columns)
}

/// The operation an analysis event belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Step-by-step acquisition replay
    Simulate,
    /// Banker safety algorithm
    BankerSafe,
    /// Banker request algorithm
    BankerRequest,
    /// Single-instance RAG cycle check
    Detect,
    /// Multi-instance work/finish detection
    DetectMulti,
    /// Victim selection
    Recovery,
}

/// Outcome class recorded for an analysis event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Simulation finished (some steps may have been denied)
    Completed,
    /// State admits a safe sequence
    Safe,
    /// State admits no safe sequence
    Unsafe,
    /// Banker request applied
    Granted,
    /// Banker request rolled back
    Denied,
    /// Deadlock present
    Deadlock,
    /// No deadlock present
    NoDeadlock,
    /// Victim chosen
    VictimSelected,
    /// Input failed validation
    Rejected,
}

/// Which detector confirmed a deadlock
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeadlockSource {
    /// Cycle in a single-instance resource-allocation graph
    ResourceAllocationGraph,
    /// Work/finish algorithm over multi-instance matrices
    MultiInstance,
}

/// Represents a confirmed deadlock
///
/// Passed to the engine's deadlock callback whenever a detection request
/// returns a positive verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlockReport {
    /// Detector that produced the verdict
    pub source: DeadlockSource,

    /// Processes (or graph nodes) involved
    ///
    /// For multi-instance detection these are the unfinished process names in
    /// row order. For graph detection this is the node path of the cycle.
    pub processes: Vec<String>,

    /// ISO-8601 timestamp of the detection
    pub timestamp: String,
}

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Operation that was requested
    pub operation: Operation,
    /// Outcome class
    pub verdict: Verdict,
    /// Safe sequence, deadlocked set, cycle path, victim, or denied processes
    pub processes: Vec<String>,
    /// Absolute timestamp of the event (seconds since Unix Epoch)
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_available_subtracts_allocation() {
        let allocation = vec![vec![1, 0, 2], vec![0, 3, 0]];
        let available = Available::Derived {
            total: vec![4, 3, 2],
        };
        assert_eq!(available.resolve(&allocation, 3).unwrap(), vec![3, 0, 0]);
    }

    #[test]
    fn test_derived_available_rejects_overcommit() {
        let allocation = vec![vec![2], vec![2]];
        let available = Available::Derived { total: vec![3] };
        let err = available.resolve(&allocation, 1).unwrap_err();
        assert_eq!(err.kind(), "AllocationExceedsTotal");

        let max = i64::MAX as u64;
        let allocation = vec![vec![max], vec![max], vec![max]];
        let err = Available::Derived { total: vec![1] }
            .resolve(&allocation, 1)
            .unwrap_err();
        assert_eq!(err.kind(), "AllocationExceedsTotal");
    }

    #[test]
    fn test_overridden_available_is_taken_verbatim() {
        // Holds more than the totals would allow; the override wins
        let allocation = vec![vec![5, 5]];
        let available = Available::Overridden(vec![1, 0]);
        assert_eq!(available.resolve(&allocation, 2).unwrap(), vec![1, 0]);

        let err = Available::Overridden(vec![1])
            .resolve(&allocation, 2)
            .unwrap_err();
        assert_eq!(err.kind(), "ShapeMismatch");
    }
}
