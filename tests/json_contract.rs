mod common;

use common::{ask, assert_no_deadlock, start_engine};
use resalloc::{Engine, Operation, Request, Response, Verdict};
use serde_json::{Value, json};

fn error_kind(engine: &Engine, request: Value) -> String {
    let out = ask(engine, request);
    assert!(
        out["error"]["message"].is_string(),
        "expected an error body, got {out}"
    );
    out["error"]["kind"].as_str().unwrap().to_string()
}

#[test]
fn every_operation_parses_from_its_tag() {
    let cases = [
        (
            json!({"op": "simulate", "resources": {"R1": 1}, "steps": []}),
            Operation::Simulate,
        ),
        (
            json!({"op": "banker.safe", "total": [], "max_demand": [], "allocation": []}),
            Operation::BankerSafe,
        ),
        (
            json!({"op": "banker.request", "total": [1], "max_demand": [[1]],
                   "allocation": [[0]], "process_idx": 0, "request": [1]}),
            Operation::BankerRequest,
        ),
        (json!({"op": "detect", "nodes": [], "edges": []}), Operation::Detect),
        (
            json!({"op": "detect.multi", "available": [], "allocation": [], "request": []}),
            Operation::DetectMulti,
        ),
        (
            json!({"op": "recovery", "allocation": [[1]]}),
            Operation::Recovery,
        ),
    ];

    let engine = Engine::new();
    for (value, operation) in cases {
        let request: Request = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(request.operation(), operation);

        let response: Response = engine.handle(&request).unwrap();
        assert_ne!(response.verdict(), Verdict::Rejected);

        // The request serializes back to the same wire form
        let again: Request = serde_json::from_value(serde_json::to_value(&request).unwrap()).unwrap();
        assert_eq!(again, request);
    }
}

#[test]
fn empty_inputs_have_trivial_answers() {
    let engine = Engine::new();
    assert_eq!(
        ask(&engine, json!({"op": "banker.safe", "total": [], "max_demand": [], "allocation": []})),
        json!({"safe": true, "sequence": []})
    );
    assert_eq!(ask(&engine, json!({"op": "detect"})), json!({"deadlock": false}));
    assert_eq!(
        ask(&engine, json!({"op": "detect.multi", "available": [], "allocation": [], "request": []})),
        json!({"deadlock": false, "deadlocked_processes": []})
    );
}

#[test]
fn validation_errors_carry_their_kind() {
    let h = start_engine();
    let engine = &h.engine;

    let cases = [
        (
            json!({"op": "banker.safe", "total": [1, 1], "max_demand": [[1]], "allocation": [[1]]}),
            "ShapeMismatch",
        ),
        (
            json!({"op": "banker.safe", "total": [-1], "max_demand": [[0]], "allocation": [[0]]}),
            "NegativeValue",
        ),
        (
            json!({"op": "banker.safe", "total": [5], "max_demand": [[1]], "allocation": [[2]]}),
            "AllocationExceedsDemand",
        ),
        (
            json!({"op": "banker.safe", "total": [1], "max_demand": [[2], [2]], "allocation": [[1], [1]]}),
            "AllocationExceedsTotal",
        ),
        (
            json!({"op": "banker.request", "total": [1], "max_demand": [[1]],
                   "allocation": [[0]], "process_idx": 9, "request": [1]}),
            "InvalidRequest",
        ),
        (
            json!({"op": "banker.request", "total": [1], "max_demand": [[1]],
                   "allocation": [[0]], "process_idx": -2, "request": [1]}),
            "InvalidRequest",
        ),
        (
            json!({"op": "banker.safe", "total": [1],
                   "max_demand": [[i64::MAX], [i64::MAX], [2]],
                   "allocation": [[i64::MAX], [i64::MAX], [2]]}),
            "AllocationExceedsTotal",
        ),
        (
            json!({"op": "recovery", "allocation": [[i64::MAX], [i64::MAX], [i64::MAX]]}),
            "UnitOverflow",
        ),
        (
            json!({"op": "simulate", "resources": {"R1": 1}, "processes": ["P1", "P1"], "steps": []}),
            "DuplicateId",
        ),
        (
            json!({"op": "simulate", "resources": {"R1": 1},
                   "steps": [{"process": "P1", "resource": "R9"}]}),
            "UnknownResource",
        ),
        (
            json!({"op": "simulate", "resources": {"R1": 1},
                   "steps": [{"process": "P1", "resource": "R1", "units": 0}]}),
            "ZeroUnits",
        ),
        (json!({"op": "banker.unsafe"}), "MalformedRequest"),
        (json!({"total": [1]}), "MalformedRequest"),
    ];

    for (request, kind) in cases {
        assert_eq!(error_kind(engine, request), kind);
    }
    assert_no_deadlock(&h);
}

#[test]
fn detect_accepts_untyped_node_names() {
    let engine = Engine::new();
    let out = ask(
        &engine,
        json!({"op": "detect", "edges": [["a", "b"], ["b", "c"], ["c", "a"]]}),
    );
    assert_eq!(out, json!({"deadlock": true, "cycle": ["a", "b", "c"]}));
}
