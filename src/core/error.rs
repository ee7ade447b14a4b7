//! Error types for the analysis engine
//!
//! Every input check runs before an algorithm starts, so these errors always
//! describe a malformed snapshot, never a half-finished computation. Negative
//! verdicts (unsafe state, deadlock, denied request) are not errors.

use thiserror::Error;

/// Why a Banker request was rejected before the safety check ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestRejection {
    /// The process index does not name a row of the matrices
    NoSuchProcess { index: usize, processes: usize },
    /// The process index arrived negative from the wire
    NegativeProcessIndex { index: i64 },
    /// The request asks for more than the process may still claim
    ExceedsNeed {
        resource: usize,
        requested: u64,
        need: u64,
    },
    /// The request asks for more than is currently free
    ExceedsAvailable {
        resource: usize,
        requested: u64,
        available: u64,
    },
}

impl std::fmt::Display for RequestRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestRejection::NoSuchProcess { index, processes } => {
                write!(f, "process index {index} out of range (0..{processes})")
            }
            RequestRejection::NegativeProcessIndex { index } => {
                write!(f, "process index {index} out of range (negative)")
            }
            RequestRejection::ExceedsNeed {
                resource,
                requested,
                need,
            } => write!(
                f,
                "requested {requested} of resource {resource} but remaining need is {need}"
            ),
            RequestRejection::ExceedsAvailable {
                resource,
                requested,
                available,
            } => write!(
                f,
                "requested {requested} of resource {resource} but only {available} available"
            ),
        }
    }
}

/// Errors produced while validating a snapshot or a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// A vector or matrix does not have the expected dimensions
    #[error("shape mismatch in `{field}`: expected {expected}, found {found}")]
    ShapeMismatch {
        field: &'static str,
        expected: String,
        found: String,
    },

    /// An entry that counts units is below zero
    #[error("negative value {value} in `{field}` at row {row:?}, column {column}")]
    NegativeValue {
        field: &'static str,
        row: Option<usize>,
        column: usize,
        value: i64,
    },

    /// A process holds more than it declared as its maximum
    #[error(
        "allocation {allocated} exceeds max demand {demand} at row {row}, column {column}"
    )]
    AllocationExceedsDemand {
        row: usize,
        column: usize,
        allocated: u64,
        demand: u64,
    },

    /// More units are allocated than the resource owns
    #[error("allocated {allocated} units of column {column} but total is {total}")]
    AllocationExceedsTotal {
        column: usize,
        allocated: u128,
        total: u64,
    },

    /// A derived column total does not fit in a unit count
    #[error("units in column {column} of `{field}` sum to {sum}, past the largest unit count")]
    UnitOverflow {
        field: &'static str,
        column: usize,
        sum: u128,
    },

    /// The Banker request cannot be evaluated
    #[error("invalid request: {0}")]
    InvalidRequest(RequestRejection),

    /// The same identifier appears twice in a process or resource list
    #[error("duplicate {field} identifier `{id}`")]
    DuplicateId { field: &'static str, id: String },

    /// A simulation step or initial holding names a resource that was never declared
    #[error("unknown resource `{resource}` in {location}")]
    UnknownResource { location: String, resource: String },

    /// A simulation step asks for zero units
    #[error("step {step} requests zero units")]
    ZeroUnits { step: usize },

    /// Recovery was asked for but no process can be chosen as victim
    #[error("no victim candidate among {processes} processes")]
    NoVictim { processes: usize },
}

impl AnalysisError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::ShapeMismatch { .. } => "ShapeMismatch",
            AnalysisError::NegativeValue { .. } => "NegativeValue",
            AnalysisError::AllocationExceedsDemand { .. } => "AllocationExceedsDemand",
            AnalysisError::AllocationExceedsTotal { .. } => "AllocationExceedsTotal",
            AnalysisError::UnitOverflow { .. } => "UnitOverflow",
            AnalysisError::InvalidRequest(_) => "InvalidRequest",
            AnalysisError::DuplicateId { .. } => "DuplicateId",
            AnalysisError::UnknownResource { .. } => "UnknownResource",
            AnalysisError::ZeroUnits { .. } => "ZeroUnits",
            AnalysisError::NoVictim { .. } => "NoVictim",
        }
    }

    pub(crate) fn shape(
        field: &'static str,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        AnalysisError::ShapeMismatch {
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl From<RequestRejection> for AnalysisError {
    fn from(reason: RequestRejection) -> Self {
        AnalysisError::InvalidRequest(reason)
    }
}

/// Result alias used by every analyzer
pub type Result<T> = std::result::Result<T, AnalysisError>;
