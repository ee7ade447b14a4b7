//! Work/finish fixpoint shared by the safety algorithm and multi-instance detection
//!
//! Both algorithms ask the same question: starting from `work`, which
//! processes can have their outstanding demand met, finish, and hand their
//! allocation back? They differ only in what "demand" means (remaining need vs.
//! pending requests) and in which processes start out finished.

use crate::core::model::{add_into, fits};
use crate::core::types::{Matrix, Units};

/// Result of running the fixpoint to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fixpoint {
    /// Rows in the order they finished (rows finished at start are not listed)
    pub order: Vec<usize>,
    /// Work vector after every finishable row released its allocation
    ///
    /// Saturates at `Units::MAX`; every demand is at most `i64::MAX`, so the
    /// fit checks stay exact.
    pub work: Vec<Units>,
    /// Final finish flag per row
    pub finish: Vec<bool>,
}

impl Fixpoint {
    /// Rows that never finished, ascending
    pub fn unfinished(&self) -> Vec<usize> {
        self.finish
            .iter()
            .enumerate()
            .filter(|(_, done)| !**done)
            .map(|(row, _)| row)
            .collect()
    }
}

/// Run the fixpoint
///
/// Each round scans from row 0 and takes the first unfinished row whose
/// demand fits in `work`; the scan restarts after every hit, so the lowest
/// eligible index always wins. Stops when a full scan finds nothing.
pub(crate) fn run(
    mut work: Vec<Units>,
    demand: &Matrix,
    allocation: &Matrix,
    mut finish: Vec<bool>,
) -> Fixpoint {
    let mut order = Vec::with_capacity(finish.len());

    while let Some(row) =
        (0..finish.len()).find(|&row| !finish[row] && fits(&demand[row], &work))
    {
        add_into(&mut work, &allocation[row]);
        finish[row] = true;
        order.push(row);
    }

    Fixpoint {
        order,
        work,
        finish,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_index_restarts_after_each_hit() {
        // Row 1 unlocks row 0, which must then be taken before row 2
        let demand = vec![vec![2], vec![1], vec![0]];
        let allocation = vec![vec![1], vec![1], vec![1]];
        let result = run(vec![1], &demand, &allocation, vec![false; 3]);
        assert_eq!(result.order, vec![1, 0, 2]);
        assert_eq!(result.work, vec![4]);
        assert!(result.unfinished().is_empty());
    }

    #[test]
    fn test_prefinished_rows_are_skipped() {
        let demand = vec![vec![9], vec![9]];
        let allocation = vec![vec![0], vec![1]];
        let result = run(vec![0], &demand, &allocation, vec![true, false]);
        assert!(result.order.is_empty());
        assert_eq!(result.unfinished(), vec![1]);
    }
}
