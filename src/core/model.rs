//! Validated resource snapshots
//!
//! A [`ResourceModel`] is the canonical form every analyzer works from: fixed
//! row order (processes), fixed column order (resources), unsigned units, and
//! an id-to-index map for each axis. Building one runs every structural check
//! up front so the algorithms themselves never meet malformed input.

use crate::core::error::{AnalysisError, Result};
use crate::core::types::{Matrix, ProcessId, RawMatrix, ResourceId, Units};
use fxhash::FxHashMap;

/// Validated snapshot of resources, processes, allocation and max demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceModel {
    resources: Vec<ResourceId>,
    processes: Vec<ProcessId>,
    total: Vec<Units>,
    allocation: Matrix,
    max_demand: Matrix,
    resource_index: FxHashMap<ResourceId, usize>,
    process_index: FxHashMap<ProcessId, usize>,
}

impl ResourceModel {
    /// Build a model from named resources and processes
    ///
    /// Column order is the order of `resources`, row order is the order of
    /// `processes`; the model never reorders either axis.
    ///
    /// # Errors
    /// - `DuplicateId` if a name repeats on either axis
    /// - `ShapeMismatch` if a vector or matrix has the wrong dimensions
    /// - `NegativeValue` for any negative entry
    /// - `AllocationExceedsDemand` if a process holds more than its maximum
    /// - `AllocationExceedsTotal` if a column is over-allocated
    pub fn new(
        resources: Vec<ResourceId>,
        total: &[i64],
        processes: Vec<ProcessId>,
        max_demand: &RawMatrix,
        allocation: &RawMatrix,
    ) -> Result<Self> {
        let total = validate_vector("total", total, resources.len())?;
        Self::with_totals(resources, total, processes, max_demand, allocation)
    }

    fn with_totals(
        resources: Vec<ResourceId>,
        total: Vec<Units>,
        processes: Vec<ProcessId>,
        max_demand: &RawMatrix,
        allocation: &RawMatrix,
    ) -> Result<Self> {
        let columns = resources.len();
        let rows = processes.len();

        let resource_index = index_ids("resource", &resources)?;
        let process_index = index_ids("process", &processes)?;

        let max_demand = validate_matrix("max_demand", max_demand, rows, columns)?;
        let allocation = validate_matrix("allocation", allocation, rows, columns)?;

        for (row, (held, limit)) in allocation.iter().zip(&max_demand).enumerate() {
            for (column, (&allocated, &demand)) in held.iter().zip(limit).enumerate() {
                if allocated > demand {
                    return Err(AnalysisError::AllocationExceedsDemand {
                        row,
                        column,
                        allocated,
                        demand,
                    });
                }
            }
        }

        free_units(&total, &allocation)?;

        Ok(ResourceModel {
            resources,
            processes,
            total,
            allocation,
            max_demand,
            resource_index,
            process_index,
        })
    }

    /// Build a model from bare matrices, labelling rows `P1..Pn` and columns `R1..Rm`
    ///
    /// The process count is taken from the allocation matrix and the resource
    /// count from `total`.
    pub fn anonymous(total: &[i64], max_demand: &RawMatrix, allocation: &RawMatrix) -> Result<Self> {
        Self::new(
            default_labels('R', total.len()),
            total,
            default_labels('P', allocation.len()),
            max_demand,
            allocation,
        )
    }

    /// Build a model when only holdings are known, not resource totals
    ///
    /// Totals are taken to be exactly the allocated column sums, i.e. nothing
    /// is free. Empty name lists fall back to default labels.
    ///
    /// # Errors
    /// Besides the checks of [`new`](Self::new), `UnitOverflow` if a column
    /// sum does not fit in [`Units`].
    pub fn from_holdings(
        resources: Vec<ResourceId>,
        processes: Vec<ProcessId>,
        max_demand: &RawMatrix,
        allocation: &RawMatrix,
    ) -> Result<Self> {
        let processes = if processes.is_empty() {
            default_labels('P', allocation.len())
        } else {
            processes
        };
        let resources = if resources.is_empty() {
            default_labels('R', allocation.first().map_or(0, Vec::len))
        } else {
            resources
        };

        let columns = resources.len();
        let checked = validate_matrix("allocation", allocation, processes.len(), columns)?;
        let total = column_sums(&checked, columns)
            .into_iter()
            .enumerate()
            .map(|(column, sum)| {
                Units::try_from(sum).map_err(|_| AnalysisError::UnitOverflow {
                    field: "allocation",
                    column,
                    sum,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::with_totals(resources, total, processes, max_demand, allocation)
    }

    /// Same snapshot with a different allocation matrix
    ///
    /// Used for tentative states; the caller guarantees the new matrix has the
    /// same shape and still satisfies the model's invariants.
    pub(crate) fn with_allocation(&self, allocation: Matrix) -> Self {
        ResourceModel {
            allocation,
            ..self.clone()
        }
    }

    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    pub fn processes(&self) -> &[ProcessId] {
        &self.processes
    }

    pub fn total(&self) -> &[Units] {
        &self.total
    }

    pub fn allocation(&self) -> &Matrix {
        &self.allocation
    }

    pub fn max_demand(&self) -> &Matrix {
        &self.max_demand
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Row of the named process
    pub fn process_index(&self, id: &str) -> Option<usize> {
        self.process_index.get(id).copied()
    }

    /// Column of the named resource
    pub fn resource_index(&self, id: &str) -> Option<usize> {
        self.resource_index.get(id).copied()
    }

    /// Remaining claim per process: `max_demand - allocation`
    ///
    /// Never stored; validation guarantees no entry underflows.
    pub fn need(&self) -> Matrix {
        self.max_demand
            .iter()
            .zip(&self.allocation)
            .map(|(demand, held)| demand.iter().zip(held).map(|(&d, &h)| d - h).collect())
            .collect()
    }

    /// Free units per resource: `total - sum(allocation)`
    pub fn available(&self) -> Vec<Units> {
        let mut free = self.total.clone();
        for row in &self.allocation {
            for (slot, &units) in free.iter_mut().zip(row) {
                *slot -= units;
            }
        }
        free
    }

    /// Total units currently held by one process, summed across resources
    pub fn held_by(&self, row: usize) -> u128 {
        self.allocation
            .get(row)
            .map_or(0, |r| r.iter().map(|&units| u128::from(units)).sum())
    }
}

/// `P1, P2, ...` style labels
pub fn default_labels(prefix: char, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}{i}")).collect()
}

/// Element-wise `lhs <= rhs`
pub(crate) fn fits(lhs: &[Units], rhs: &[Units]) -> bool {
    lhs.iter().zip(rhs).all(|(l, r)| l <= r)
}

/// Element-wise `acc += row`, saturating at `Units::MAX`
pub(crate) fn add_into(acc: &mut [Units], row: &[Units]) {
    for (a, &r) in acc.iter_mut().zip(row) {
        *a = a.saturating_add(r);
    }
}

/// Per-column sums, widened so no row count of `Units` entries can overflow
pub(crate) fn column_sums(matrix: &Matrix, columns: usize) -> Vec<u128> {
    let mut sums = vec![0u128; columns];
    for row in matrix {
        for (sum, &units) in sums.iter_mut().zip(row) {
            *sum += u128::from(units);
        }
    }
    sums
}

/// `total - sum(allocation)` per column
///
/// # Errors
/// `AllocationExceedsTotal` for the first column allocated past its total.
pub(crate) fn free_units(total: &[Units], allocation: &Matrix) -> Result<Vec<Units>> {
    total
        .iter()
        .zip(column_sums(allocation, total.len()))
        .enumerate()
        .map(|(column, (&total, allocated))| {
            u128::from(total)
                .checked_sub(allocated)
                .and_then(|free| Units::try_from(free).ok())
                .ok_or(AnalysisError::AllocationExceedsTotal {
                    column,
                    allocated,
                    total,
                })
        })
        .collect()
}

pub(crate) fn validate_vector(field: &'static str, raw: &[i64], len: usize) -> Result<Vec<Units>> {
    if raw.len() != len {
        return Err(AnalysisError::shape(
            field,
            format!("{len} entries"),
            format!("{} entries", raw.len()),
        ));
    }
    raw.iter()
        .enumerate()
        .map(|(column, &value)| {
            Units::try_from(value).map_err(|_| AnalysisError::NegativeValue {
                field,
                row: None,
                column,
                value,
            })
        })
        .collect()
}

pub(crate) fn validate_matrix(
    field: &'static str,
    raw: &RawMatrix,
    rows: usize,
    columns: usize,
) -> Result<Matrix> {
    if raw.len() != rows {
        return Err(AnalysisError::shape(
            field,
            format!("{rows} rows"),
            format!("{} rows", raw.len()),
        ));
    }

    let mut matrix = Vec::with_capacity(rows);
    for (row, entries) in raw.iter().enumerate() {
        if entries.len() != columns {
            return Err(AnalysisError::shape(
                field,
                format!("{columns} columns in row {row}"),
                format!("{} columns", entries.len()),
            ));
        }
        let mut checked = Vec::with_capacity(columns);
        for (column, &value) in entries.iter().enumerate() {
            let units = Units::try_from(value).map_err(|_| AnalysisError::NegativeValue {
                field,
                row: Some(row),
                column,
                value,
            })?;
            checked.push(units);
        }
        matrix.push(checked);
    }
    Ok(matrix)
}

fn index_ids(field: &'static str, ids: &[String]) -> Result<FxHashMap<String, usize>> {
    let mut index = FxHashMap::default();
    for (position, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), position).is_some() {
            return Err(AnalysisError::DuplicateId {
                field,
                id: id.clone(),
            });
        }
    }
    Ok(index)
}
