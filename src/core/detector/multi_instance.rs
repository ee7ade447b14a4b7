use crate::core::error::Result;
use crate::core::model::{ResourceModel, validate_matrix};
use crate::core::types::{Available, RawMatrix, Units, validate_allocation};
use crate::core::work_finish;

/// Result of multi-instance deadlock detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiInstanceReport {
    /// Whether at least one process can never finish
    pub deadlock: bool,
    /// Rows of the deadlocked processes, ascending; empty when no deadlock
    pub deadlocked: Vec<usize>,
    /// Order in which holding processes were able to finish
    pub completion_order: Vec<usize>,
    /// Work vector after every finishable process released its allocation,
    /// saturated at `Units::MAX`
    pub work: Vec<Units>,
}

/// Detect deadlock among processes with pending requests on multi-instance resources
///
/// Unlike the safety algorithm this evaluates *current* pending requests, not
/// future maximum demand. A process that holds nothing starts finished: it
/// cannot keep anyone else waiting, whatever it is requesting.
///
/// # Arguments
/// * `available` - Free units, derived from totals or given explicitly
/// * `allocation` - Units held per process
/// * `request` - Units each process is currently waiting for
///
/// # Errors
/// `ShapeMismatch` or `NegativeValue` for malformed input, and
/// `AllocationExceedsTotal` when a derived availability would go negative.
pub fn detect(
    available: &Available,
    allocation: &RawMatrix,
    request: &RawMatrix,
) -> Result<MultiInstanceReport> {
    let columns = match available {
        Available::Derived { total } => total.len(),
        Available::Overridden(vector) => vector.len(),
    };
    let allocation = validate_allocation(allocation, columns)?;
    let request = validate_matrix("request", request, allocation.len(), columns)?;
    let work = available.resolve(&allocation, columns)?;

    let finish = allocation
        .iter()
        .map(|row| row.iter().all(|&units| units == 0))
        .collect();

    let fixpoint = work_finish::run(work, &request, &allocation, finish);
    let deadlocked = fixpoint.unfinished();

    Ok(MultiInstanceReport {
        deadlock: !deadlocked.is_empty(),
        deadlocked,
        completion_order: fixpoint.order,
        work: fixpoint.work,
    })
}

/// Detect deadlock against a validated model's derived availability
///
/// # Errors
/// `ShapeMismatch` or `NegativeValue` for a malformed request matrix.
pub fn detect_in_model(model: &ResourceModel, request: &RawMatrix) -> Result<MultiInstanceReport> {
    let request = validate_matrix(
        "request",
        request,
        model.process_count(),
        model.resource_count(),
    )?;
    let finish = model
        .allocation()
        .iter()
        .map(|row| row.iter().all(|&units| units == 0))
        .collect();

    let fixpoint = work_finish::run(model.available(), &request, model.allocation(), finish);
    let deadlocked = fixpoint.unfinished();

    Ok(MultiInstanceReport {
        deadlock: !deadlocked.is_empty(),
        deadlocked,
        completion_order: fixpoint.order,
        work: fixpoint.work,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_units_saturate_without_wrapping() {
        let max = i64::MAX;
        let report = detect(
            &Available::Overridden(vec![max]),
            &vec![vec![max], vec![max], vec![max]],
            &vec![vec![0], vec![max], vec![max]],
        )
        .unwrap();
        assert!(!report.deadlock);
        assert_eq!(report.completion_order, vec![0, 1, 2]);
        assert_eq!(report.work, vec![Units::MAX]);
    }

    #[test]
    fn test_derived_availability_rejects_sum_past_u64() {
        let max = i64::MAX;
        let err = detect(
            &Available::Derived { total: vec![max] },
            &vec![vec![max], vec![max], vec![max]],
            &vec![vec![0], vec![0], vec![0]],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "AllocationExceedsTotal");
    }

    #[test]
    fn test_crossed_holders_deadlock() {
        let report = detect(
            &Available::Overridden(vec![0, 0]),
            &vec![vec![1, 0], vec![0, 1]],
            &vec![vec![0, 1], vec![1, 0]],
        )
        .unwrap();
        assert!(report.deadlock);
        assert_eq!(report.deadlocked, vec![0, 1]);
    }

    #[test]
    fn test_cycle_broken_by_spare_instance() {
        // Same crossing, but one spare unit of R2 lets P1 finish first
        let report = detect(
            &Available::Overridden(vec![0, 1]),
            &vec![vec![1, 0], vec![0, 1]],
            &vec![vec![0, 1], vec![1, 0]],
        )
        .unwrap();
        assert!(!report.deadlock);
        assert!(report.deadlocked.is_empty());
        assert_eq!(report.completion_order, vec![0, 1]);
        assert_eq!(report.work, vec![1, 2]);
    }

    #[test]
    fn test_idle_process_starts_finished() {
        // P3 holds nothing and asks for the impossible; it is not deadlocked
        let report = detect(
            &Available::Overridden(vec![0]),
            &vec![vec![1], vec![0]],
            &vec![vec![0], vec![99]],
        )
        .unwrap();
        assert!(!report.deadlock);
    }

    #[test]
    fn test_partial_deadlock_reports_only_stuck_rows() {
        // Rows 1 and 2 wait on each other; row 0 can finish but frees nothing they need
        let report = detect(
            &Available::Derived {
                total: vec![2, 1, 1],
            },
            &vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]],
            &vec![vec![0, 0, 0], vec![0, 0, 1], vec![0, 1, 0]],
        )
        .unwrap();
        assert!(report.deadlock);
        assert_eq!(report.deadlocked, vec![1, 2]);
    }

    #[test]
    fn test_shape_is_checked() {
        let err = detect(
            &Available::Overridden(vec![0, 0]),
            &vec![vec![1, 0]],
            &vec![vec![0, 1], vec![1, 0]],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "ShapeMismatch");
    }

    #[test]
    fn test_model_variant_uses_derived_availability() {
        let model = ResourceModel::anonymous(
            &[1, 1],
            &vec![vec![1, 1], vec![1, 1]],
            &vec![vec![1, 0], vec![0, 1]],
        )
        .unwrap();
        let report = detect_in_model(&model, &vec![vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(report.deadlocked, vec![0, 1]);
    }
}
