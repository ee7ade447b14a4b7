//! Banker's algorithm: safety check and request evaluation
//!
//! Both operations read a [`ResourceModel`] and never modify it. The request
//! algorithm evaluates a tentative state built on a private copy, so a denied
//! request leaves the caller's snapshot exactly as it was.

use crate::core::error::{RequestRejection, Result};
use crate::core::model::{ResourceModel, add_into, validate_vector};
use crate::core::types::{Matrix, ProcessId, Units};
use crate::core::work_finish;

/// Result of the safety algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyReport {
    /// Whether every process can finish
    pub safe: bool,
    /// Row indices of the safe sequence; empty when unsafe
    pub sequence: Vec<usize>,
    /// Processes that could not finish, ascending; empty when safe
    pub unfinished: Vec<usize>,
    /// Work vector at the end of the scan
    pub work: Vec<Units>,
}

impl SafetyReport {
    /// Safe sequence as process names
    pub fn sequence_names(&self, model: &ResourceModel) -> Vec<ProcessId> {
        self.sequence
            .iter()
            .map(|&row| model.processes()[row].clone())
            .collect()
    }
}

/// Result of the request algorithm for a well-formed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The tentative state is safe and becomes the new state
    Granted {
        /// Allocation matrix with the request applied
        allocation: Matrix,
        /// Free units after the grant
        available: Vec<Units>,
        /// Safety report of the new state
        safety: SafetyReport,
    },
    /// The tentative state is unsafe and was discarded
    Denied {
        /// Safety report of the discarded tentative state
        safety: SafetyReport,
    },
}

impl RequestOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, RequestOutcome::Granted { .. })
    }
}

/// Run the safety algorithm on a validated snapshot
///
/// Starts from `work = available`, repeatedly releases the lowest-index
/// unfinished process whose need fits in `work`, and reports the order in
/// which processes finished. The state is safe iff every process finishes.
pub fn is_safe(model: &ResourceModel) -> SafetyReport {
    let need = model.need();
    let fixpoint = work_finish::run(
        model.available(),
        &need,
        model.allocation(),
        vec![false; model.process_count()],
    );

    let unfinished = fixpoint.unfinished();
    let safe = unfinished.is_empty();

    SafetyReport {
        safe,
        sequence: if safe { fixpoint.order } else { Vec::new() },
        unfinished,
        work: fixpoint.work,
    }
}

/// Evaluate a resource request from one process
///
/// # Arguments
/// * `model` - Current validated state
/// * `process` - Row index of the requesting process
/// * `request` - Units requested per resource
///
/// # Returns
/// `Granted` with the new allocation if the resulting state is safe,
/// `Denied` otherwise. `model` is never modified.
///
/// # Errors
/// - `ShapeMismatch` / `NegativeValue` for a malformed request vector
/// - `InvalidRequest` if the process index is out of range, or the request
///   exceeds the process's remaining need or the free units
pub fn request_resources(
    model: &ResourceModel,
    process: usize,
    request: &[i64],
) -> Result<RequestOutcome> {
    let request = validate_vector("request", request, model.resource_count())?;

    if process >= model.process_count() {
        return Err(RequestRejection::NoSuchProcess {
            index: process,
            processes: model.process_count(),
        }
        .into());
    }

    let need = &model.need()[process];
    let available = model.available();

    for (resource, &requested) in request.iter().enumerate() {
        if requested > need[resource] {
            return Err(RequestRejection::ExceedsNeed {
                resource,
                requested,
                need: need[resource],
            }
            .into());
        }
        if requested > available[resource] {
            return Err(RequestRejection::ExceedsAvailable {
                resource,
                requested,
                available: available[resource],
            }
            .into());
        }
    }

    // Tentative state lives only in this copy
    let mut allocation = model.allocation().clone();
    add_into(&mut allocation[process], &request);
    let tentative = model.with_allocation(allocation);

    let safety = is_safe(&tentative);
    if !safety.safe {
        return Ok(RequestOutcome::Denied { safety });
    }

    let available = tentative.available();
    Ok(RequestOutcome::Granted {
        allocation: tentative.allocation().clone(),
        available,
        safety,
    })
}
