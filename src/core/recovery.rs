//! Deadlock recovery by process termination
//!
//! Recovery is advisory: it names a victim and shows the allocation matrix
//! that would result from terminating it. It does not re-run detection.

use crate::core::error::{AnalysisError, RequestRejection, Result};
use crate::core::model::ResourceModel;
use crate::core::types::{Matrix, ProcessId, Units};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Strategy for choosing which deadlocked process to terminate
pub trait VictimPolicy: std::fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Pick one of `candidates` (ascending row indices); row 0 when empty
    fn select(&self, model: &ResourceModel, candidates: &[usize]) -> usize;
}

/// Terminate the candidate holding the fewest units in total
///
/// Ties go to the lowest row.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinAllocation;

impl VictimPolicy for MinAllocation {
    fn name(&self) -> &'static str {
        "min_allocation"
    }

    fn select(&self, model: &ResourceModel, candidates: &[usize]) -> usize {
        candidates
            .iter()
            .copied()
            .min_by_key(|&row| (model.held_by(row), row))
            .unwrap_or_default()
    }
}

/// Terminate the candidate holding the most relative to what it still needs
///
/// Cost is `held / (remaining_need + 1)`; the highest cost wins, ties go to
/// the lowest row. Favors processes that would release a lot while being
/// close to done anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldMostNeedLeast;

impl VictimPolicy for HoldMostNeedLeast {
    fn name(&self) -> &'static str {
        "hold_most_need_least"
    }

    fn select(&self, model: &ResourceModel, candidates: &[usize]) -> usize {
        let Some((&first, rest)) = candidates.split_first() else {
            return 0;
        };
        let need = model.need();
        let cost = |row: usize| -> (u128, u128) {
            let remaining: u128 = need[row].iter().map(|&units| u128::from(units)).sum();
            (model.held_by(row), remaining + 1)
        };

        let mut best = first;
        for &row in rest {
            let (held, denominator) = cost(row);
            let (best_held, best_denominator) = cost(best);
            if compare_ratios(held, denominator, best_held, best_denominator) == Ordering::Greater {
                best = row;
            }
        }
        best
    }
}

/// Exact ordering of `a / b` against `c / d` for non-zero denominators
///
/// Walks the continued-fraction expansions, so no product is ever formed.
fn compare_ratios(mut a: u128, mut b: u128, mut c: u128, mut d: u128) -> Ordering {
    loop {
        let (q1, r1) = (a / b, a % b);
        let (q2, r2) = (c / d, c % d);
        if q1 != q2 {
            return q1.cmp(&q2);
        }
        match (r1, r2) {
            (0, 0) => return Ordering::Equal,
            (0, _) => return Ordering::Less,
            (_, 0) => return Ordering::Greater,
            // r1/b vs r2/d orders the same as d/r2 vs b/r1
            _ => (a, b, c, d) = (d, r2, b, r1),
        }
    }
}

/// Built-in policies, selectable by name on the wire and on the command line
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    MinAllocation,
    HoldMostNeedLeast,
}

impl PolicyKind {
    pub fn policy(self) -> &'static dyn VictimPolicy {
        match self {
            PolicyKind::MinAllocation => &MinAllocation,
            PolicyKind::HoldMostNeedLeast => &HoldMostNeedLeast,
        }
    }
}

impl VictimPolicy for PolicyKind {
    fn name(&self) -> &'static str {
        self.policy().name()
    }

    fn select(&self, model: &ResourceModel, candidates: &[usize]) -> usize {
        self.policy().select(model, candidates)
    }
}

/// The process chosen for termination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victim {
    /// Row of the victim
    pub index: usize,
    /// Identifier of the victim
    pub name: ProcessId,
    /// Units returned to the pool, per resource
    pub released: Vec<Units>,
}

/// Proposed recovery action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPlan {
    pub victim: Victim,
    /// Input allocation with the victim's row zeroed
    pub new_allocation: Matrix,
}

/// Suggest a victim and the allocation left after terminating it
///
/// # Arguments
/// * `model` - Deadlocked state
/// * `deadlocked` - Rows confirmed deadlocked by a detector; when `None`,
///   every process holding at least one unit is a candidate
/// * `policy` - Victim selection strategy
///
/// # Errors
/// - `InvalidRequest` if `deadlocked` names a row outside the model
/// - `NoVictim` if there is no candidate at all
pub fn suggest_recovery(
    model: &ResourceModel,
    deadlocked: Option<&[usize]>,
    policy: &dyn VictimPolicy,
) -> Result<RecoveryPlan> {
    let mut candidates: Vec<usize> = match deadlocked {
        Some(rows) => {
            if let Some(&index) = rows.iter().find(|&&row| row >= model.process_count()) {
                return Err(RequestRejection::NoSuchProcess {
                    index,
                    processes: model.process_count(),
                }
                .into());
            }
            rows.to_vec()
        }
        None => (0..model.process_count())
            .filter(|&row| model.held_by(row) > 0)
            .collect(),
    };
    candidates.sort_unstable();
    candidates.dedup();

    if candidates.is_empty() {
        return Err(AnalysisError::NoVictim {
            processes: model.process_count(),
        });
    }

    let index = policy.select(model, &candidates);
    let released = model.allocation()[index].clone();

    let mut new_allocation = model.allocation().clone();
    new_allocation[index].iter_mut().for_each(|units| *units = 0);

    Ok(RecoveryPlan {
        victim: Victim {
            index,
            name: model.processes()[index].clone(),
            released,
        },
        new_allocation,
    })
}
