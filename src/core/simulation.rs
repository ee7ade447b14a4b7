//! Step-by-step acquisition replay
//!
//! A simulation takes a pool of resources and an ordered list of acquisition
//! steps and applies them in a single deterministic pass. A step that cannot
//! be satisfied is recorded as denied and changes nothing; it is not retried
//! and does not hold up later steps.

use crate::core::error::{AnalysisError, Result};
use crate::core::graph::{NodeKind, ResourceAllocationGraph};
use crate::core::model::{free_units, validate_vector};
use crate::core::types::{Matrix, ProcessId, ResourceId, Units};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One acquisition attempt: `process` asks for `units` of `resource`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub process: ProcessId,
    pub resource: ResourceId,
    #[serde(default = "Step::default_units")]
    pub units: i64,
}

impl Step {
    /// Single-unit step
    pub fn new(process: impl Into<ProcessId>, resource: impl Into<ResourceId>) -> Self {
        Step {
            process: process.into(),
            resource: resource.into(),
            units: 1,
        }
    }

    /// Multi-unit step
    pub fn with_units(mut self, units: i64) -> Self {
        self.units = units;
        self
    }

    fn default_units() -> i64 {
        1
    }

    fn action(&self) -> String {
        if self.units == 1 {
            format!("{} requests {}", self.process, self.resource)
        } else {
            format!(
                "{} requests {} units of {}",
                self.process, self.units, self.resource
            )
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Human-readable description of the step
    pub action: String,
    /// Whether the units were granted
    pub success: bool,
}

/// Full result of a simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// One record per input step, in input order
    pub steps: Vec<StepRecord>,
    /// Final holdings: process -> resource -> units
    pub processes: BTreeMap<ProcessId, BTreeMap<ResourceId, Units>>,
    /// Units allocated per resource at the end of the run
    pub resources: BTreeMap<ResourceId, Units>,
    /// Denied steps as (process, resource), still outstanding at the end
    #[serde(skip)]
    pub denied: Vec<(ProcessId, ResourceId)>,
}

impl SimulationReport {
    /// Build the resource-allocation graph of the final state
    ///
    /// Every held (process, resource) pair becomes an allocation edge and every
    /// denied step a request edge. All processes and resources appear as nodes.
    pub fn to_graph(&self) -> ResourceAllocationGraph {
        let mut graph = ResourceAllocationGraph::new();
        for process in self.processes.keys() {
            graph.add_typed_node(process, NodeKind::Process);
        }
        for resource in self.resources.keys() {
            graph.add_typed_node(resource, NodeKind::Resource);
        }
        for (process, held) in &self.processes {
            for (resource, &units) in held {
                if units > 0 {
                    graph.add_allocation(resource, process);
                }
            }
        }
        for (process, resource) in &self.denied {
            graph.add_request(process, resource);
        }
        graph
    }
}

/// Process rows: declared order first, then first-seen order
struct Rows {
    names: Vec<ProcessId>,
    index: FxHashMap<ProcessId, usize>,
}

impl Rows {
    fn new(declared: &[ProcessId]) -> Result<Self> {
        let mut rows = Rows {
            names: Vec::with_capacity(declared.len()),
            index: FxHashMap::default(),
        };
        for name in declared {
            if rows.index.contains_key(name) {
                return Err(AnalysisError::DuplicateId {
                    field: "process",
                    id: name.clone(),
                });
            }
            rows.row(name);
        }
        Ok(rows)
    }

    fn row(&mut self, name: &str) -> usize {
        if let Some(&row) = self.index.get(name) {
            return row;
        }
        let row = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), row);
        row
    }
}

/// Replay `steps` against an empty pool
///
/// See [`run_from`].
pub fn run(
    resources: &BTreeMap<ResourceId, i64>,
    processes: &[ProcessId],
    steps: &[Step],
) -> Result<SimulationReport> {
    run_from(resources, processes, steps, &BTreeMap::new())
}

/// Replay `steps` starting from existing holdings
///
/// # Arguments
/// * `resources` - Total units per resource; key order is the column order
/// * `processes` - Declared processes; steps may name others, which are
///   appended in first-seen order
/// * `steps` - Acquisition attempts, applied strictly in order
/// * `initial` - Units already held before the first step
///
/// # Errors
/// Every check runs before the first step is applied:
/// - `NegativeValue` for negative totals, holdings or step units
/// - `ZeroUnits` for a step asking for nothing
/// - `UnknownResource` for a step or holding naming an undeclared resource
/// - `DuplicateId` for a repeated declared process
/// - `AllocationExceedsTotal` if initial holdings exceed a total
pub fn run_from(
    resources: &BTreeMap<ResourceId, i64>,
    processes: &[ProcessId],
    steps: &[Step],
    initial: &BTreeMap<ProcessId, BTreeMap<ResourceId, i64>>,
) -> Result<SimulationReport> {
    let names: Vec<&ResourceId> = resources.keys().collect();
    let raw_totals: Vec<i64> = resources.values().copied().collect();
    let totals = validate_vector("resources", &raw_totals, names.len())?;
    let columns: FxHashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(column, name)| (name.as_str(), column))
        .collect();

    let mut rows = Rows::new(processes)?;
    let mut allocation: Matrix = vec![vec![0; names.len()]; rows.names.len()];
    let grow = |allocation: &mut Matrix, row: usize| {
        while allocation.len() <= row {
            allocation.push(vec![0; names.len()]);
        }
    };

    for (process, held) in initial {
        let row = rows.row(process);
        grow(&mut allocation, row);
        for (resource, &units) in held {
            let column = *columns.get(resource.as_str()).ok_or_else(|| {
                AnalysisError::UnknownResource {
                    location: format!("initial holdings of {process}"),
                    resource: resource.clone(),
                }
            })?;
            allocation[row][column] = Units::try_from(units).map_err(|_| {
                AnalysisError::NegativeValue {
                    field: "initial",
                    row: Some(row),
                    column,
                    value: units,
                }
            })?;
        }
    }

    let mut available = free_units(&totals, &allocation)?;

    // Validate every step before applying any of them
    let mut plan = Vec::with_capacity(steps.len());
    for (position, step) in steps.iter().enumerate() {
        let column = *columns.get(step.resource.as_str()).ok_or_else(|| {
            AnalysisError::UnknownResource {
                location: format!("step {position}"),
                resource: step.resource.clone(),
            }
        })?;
        let units = match Units::try_from(step.units) {
            Ok(0) => return Err(AnalysisError::ZeroUnits { step: position }),
            Ok(units) => units,
            Err(_) => {
                return Err(AnalysisError::NegativeValue {
                    field: "steps",
                    row: Some(position),
                    column,
                    value: step.units,
                });
            }
        };
        plan.push((column, units));
    }

    let mut records = Vec::with_capacity(steps.len());
    let mut denied = Vec::new();
    for (step, (column, units)) in steps.iter().zip(plan) {
        let row = rows.row(&step.process);
        grow(&mut allocation, row);

        let success = available[column] >= units;
        if success {
            available[column] -= units;
            allocation[row][column] += units;
        } else {
            denied.push((step.process.clone(), step.resource.clone()));
        }
        records.push(StepRecord {
            action: step.action(),
            success,
        });
    }

    let processes: BTreeMap<ProcessId, BTreeMap<ResourceId, Units>> = rows
        .names
        .iter()
        .zip(&allocation)
        .map(|(process, row)| {
            let held: BTreeMap<ResourceId, Units> = names
                .iter()
                .zip(row)
                .map(|(&resource, &units)| (resource.clone(), units))
                .collect();
            (process.clone(), held)
        })
        .collect();

    let resources: BTreeMap<ResourceId, Units> = names
        .iter()
        .zip(totals.iter().zip(&available))
        .map(|(&resource, (&total, &free))| (resource.clone(), total - free))
        .collect();

    Ok(SimulationReport {
        steps: records,
        processes,
        resources,
        denied,
    })
}
