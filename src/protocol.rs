//! Request/response contract
//!
//! One request type per analysis operation, tagged on the wire by `"op"`.
//! Transport is left to the caller: the CLI reads requests from files, the
//! FFI layer from C strings, and anything else can feed [`Request`] values
//! to an [`Engine`](crate::Engine) directly.
//!
//! ```json
//! {"op": "banker.safe", "total": [3], "max_demand": [[2]], "allocation": [[1]]}
//! ```

use crate::core::banker::{self, RequestOutcome};
use crate::core::detector;
use crate::core::error::{AnalysisError, RequestRejection, Result};
use crate::core::graph::ResourceAllocationGraph;
use crate::core::model::{ResourceModel, default_labels};
use crate::core::recovery::{self, PolicyKind, Victim, VictimPolicy};
use crate::core::simulation::{self, SimulationReport, Step};
use crate::core::types::{
    Available, DeadlockSource, Matrix, Operation, ProcessId, RawMatrix, ResourceId, Units,
    Verdict,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    #[serde(rename = "simulate")]
    Simulate(SimulateRequest),
    #[serde(rename = "banker.safe")]
    BankerSafe(BankerSafeRequest),
    #[serde(rename = "banker.request")]
    BankerRequest(BankerRequestRequest),
    #[serde(rename = "detect")]
    Detect(DetectRequest),
    #[serde(rename = "detect.multi")]
    DetectMulti(DetectMultiRequest),
    #[serde(rename = "recovery")]
    Recovery(RecoveryRequest),
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Simulate(_) => Operation::Simulate,
            Request::BankerSafe(_) => Operation::BankerSafe,
            Request::BankerRequest(_) => Operation::BankerRequest,
            Request::Detect(_) => Operation::Detect,
            Request::DetectMulti(_) => Operation::DetectMulti,
            Request::Recovery(_) => Operation::Recovery,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateRequest {
    /// Total units per resource
    pub resources: BTreeMap<ResourceId, i64>,
    #[serde(default)]
    pub processes: Vec<ProcessId>,
    pub steps: Vec<Step>,
    /// Holdings before the first step
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub initial: BTreeMap<ProcessId, BTreeMap<ResourceId, i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankerSafeRequest {
    pub total: Vec<i64>,
    pub max_demand: RawMatrix,
    pub allocation: RawMatrix,
    /// Row names; `P1..Pn` when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<ProcessId>,
    /// Column names; `R1..Rm` when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankerRequestRequest {
    pub total: Vec<i64>,
    pub max_demand: RawMatrix,
    pub allocation: RawMatrix,
    /// Signed so a negative index is reported as an invalid request
    pub process_idx: i64,
    pub request: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<ProcessId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectMultiRequest {
    /// Explicit free units; takes precedence over `total`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<i64>>,
    /// Totals to derive free units from when `available` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Vec<i64>>,
    pub allocation: RawMatrix,
    pub request: RawMatrix,
}

impl DetectMultiRequest {
    fn available(&self) -> Result<Available> {
        match (&self.available, &self.total) {
            (Some(vector), _) => Ok(Available::Overridden(vector.clone())),
            (None, Some(total)) => Ok(Available::Derived {
                total: total.clone(),
            }),
            (None, None) => Err(AnalysisError::shape(
                "available",
                "an `available` or `total` vector",
                "neither",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRequest {
    #[serde(default)]
    pub processes: Vec<ProcessId>,
    pub allocation: RawMatrix,
    /// Declared maxima; taken equal to `allocation` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_demand: Option<RawMatrix>,
    #[serde(default)]
    pub resources: Vec<ResourceId>,
    /// Rows confirmed deadlocked; every holder is a candidate when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadlocked: Option<Vec<usize>>,
    /// Victim policy; the engine's default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyKind>,
}

/// Response to `banker.safe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankerSafeResponse {
    pub safe: bool,
    pub sequence: Vec<ProcessId>,
}

/// Response to `banker.request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankerRequestResponse {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_allocation: Option<Matrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<ProcessId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_available: Option<Vec<Units>>,
}

/// Response to `detect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectResponse {
    pub deadlock: bool,
    /// Node path of the first cycle found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
}

/// Response to `detect.multi`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectMultiResponse {
    pub deadlock: bool,
    pub deadlocked_processes: Vec<usize>,
}

/// Response to `recovery`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryResponse {
    pub victim: Victim,
    pub new_allocation: Matrix,
}

/// An analysis response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Simulate(SimulationReport),
    BankerSafe(BankerSafeResponse),
    BankerRequest(BankerRequestResponse),
    Detect(DetectResponse),
    DetectMulti(DetectMultiResponse),
    Recovery(RecoveryResponse),
}

impl Response {
    /// Outcome class of this response
    pub fn verdict(&self) -> Verdict {
        match self {
            Response::Simulate(_) => Verdict::Completed,
            Response::BankerSafe(r) if r.safe => Verdict::Safe,
            Response::BankerSafe(_) => Verdict::Unsafe,
            Response::BankerRequest(r) if r.granted => Verdict::Granted,
            Response::BankerRequest(_) => Verdict::Denied,
            Response::Detect(r) if r.deadlock => Verdict::Deadlock,
            Response::Detect(_) => Verdict::NoDeadlock,
            Response::DetectMulti(r) if r.deadlock => Verdict::Deadlock,
            Response::DetectMulti(_) => Verdict::NoDeadlock,
            Response::Recovery(_) => Verdict::VictimSelected,
        }
    }

    /// Processes the verdict is about
    ///
    /// Safe sequence, deadlocked set, cycle path or victim; empty otherwise.
    /// Multi-instance rows are named `P1..` since that request carries no names.
    pub fn involved(&self) -> Vec<String> {
        match self {
            Response::Simulate(report) => report
                .denied
                .iter()
                .map(|(process, _)| process.clone())
                .collect(),
            Response::BankerSafe(r) => r.sequence.clone(),
            Response::BankerRequest(r) => r.sequence.clone().unwrap_or_default(),
            Response::Detect(r) => r.cycle.clone().unwrap_or_default(),
            Response::DetectMulti(r) => r
                .deadlocked_processes
                .iter()
                .map(|row| format!("P{}", row + 1))
                .collect(),
            Response::Recovery(r) => vec![r.victim.name.clone()],
        }
    }

    /// Which detector produced a positive deadlock verdict, if any
    pub fn deadlock_source(&self) -> Option<DeadlockSource> {
        match self {
            Response::Detect(r) if r.deadlock => Some(DeadlockSource::ResourceAllocationGraph),
            Response::DetectMulti(r) if r.deadlock => Some(DeadlockSource::MultiInstance),
            _ => None,
        }
    }
}

/// Error body sent back for a failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// Wire form of a failed request: `{"error": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorResponse {
            error: ErrorBody {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(err: &AnalysisError) -> Self {
        ErrorResponse::new(err.kind(), err.to_string())
    }
}

fn banker_model(
    total: &[i64],
    max_demand: &RawMatrix,
    allocation: &RawMatrix,
    processes: &[ProcessId],
    resources: &[ResourceId],
) -> Result<ResourceModel> {
    let processes = if processes.is_empty() {
        default_labels('P', allocation.len())
    } else {
        processes.to_vec()
    };
    let resources = if resources.is_empty() {
        default_labels('R', total.len())
    } else {
        resources.to_vec()
    };
    ResourceModel::new(resources, total, processes, max_demand, allocation)
}

/// Run one request to completion
///
/// # Arguments
/// * `request` - The request to evaluate
/// * `default_policy` - Victim policy used when a recovery request names none
///
/// # Errors
/// Any validation failure of the request's snapshot.
pub fn dispatch(request: &Request, default_policy: &dyn VictimPolicy) -> Result<Response> {
    match request {
        Request::Simulate(r) => {
            simulation::run_from(&r.resources, &r.processes, &r.steps, &r.initial)
                .map(Response::Simulate)
        }
        Request::BankerSafe(r) => {
            let model = banker_model(
                &r.total,
                &r.max_demand,
                &r.allocation,
                &r.processes,
                &r.resources,
            )?;
            let report = banker::is_safe(&model);
            Ok(Response::BankerSafe(BankerSafeResponse {
                safe: report.safe,
                sequence: report.sequence_names(&model),
            }))
        }
        Request::BankerRequest(r) => {
            let model = banker_model(
                &r.total,
                &r.max_demand,
                &r.allocation,
                &r.processes,
                &r.resources,
            )?;
            let process = usize::try_from(r.process_idx).map_err(|_| {
                RequestRejection::NegativeProcessIndex {
                    index: r.process_idx,
                }
            })?;
            let response = match banker::request_resources(&model, process, &r.request)? {
                RequestOutcome::Granted {
                    allocation,
                    available,
                    safety,
                } => BankerRequestResponse {
                    granted: true,
                    new_allocation: Some(allocation),
                    sequence: Some(safety.sequence_names(&model)),
                    new_available: Some(available),
                },
                RequestOutcome::Denied { .. } => BankerRequestResponse {
                    granted: false,
                    new_allocation: None,
                    sequence: None,
                    new_available: None,
                },
            };
            Ok(Response::BankerRequest(response))
        }
        Request::Detect(r) => {
            let graph = ResourceAllocationGraph::from_parts(&r.nodes, &r.edges);
            let cycle = graph.find_cycle();
            Ok(Response::Detect(DetectResponse {
                deadlock: cycle.is_some(),
                cycle,
            }))
        }
        Request::DetectMulti(r) => {
            let report = detector::detect(&r.available()?, &r.allocation, &r.request)?;
            Ok(Response::DetectMulti(DetectMultiResponse {
                deadlock: report.deadlock,
                deadlocked_processes: report.deadlocked,
            }))
        }
        Request::Recovery(r) => {
            let max_demand = r.max_demand.as_ref().unwrap_or(&r.allocation);
            let model = ResourceModel::from_holdings(
                r.resources.clone(),
                r.processes.clone(),
                max_demand,
                &r.allocation,
            )?;
            let policy = match r.policy {
                Some(kind) => kind.policy(),
                None => default_policy,
            };
            let plan = recovery::suggest_recovery(&model, r.deadlocked.as_deref(), policy)?;
            Ok(Response::Recovery(RecoveryResponse {
                victim: plan.victim,
                new_allocation: plan.new_allocation,
            }))
        }
    }
}
