mod common;

use common::{TOTAL, ask, start_engine, textbook_max, textbook_model};
use resalloc::banker::{self, RequestOutcome};
use resalloc::{AnalysisError, RequestRejection, ResourceModel};
use serde_json::json;

/// Textbook state after P2 was granted [1, 0, 2]
fn after_first_grant() -> ResourceModel {
    let model = textbook_model();
    let RequestOutcome::Granted { allocation, .. } =
        banker::request_resources(&model, 1, &[1, 0, 2]).unwrap()
    else {
        panic!("first request should be granted");
    };
    let allocation: Vec<Vec<i64>> = allocation
        .iter()
        .map(|row| row.iter().map(|&units| units as i64).collect())
        .collect();
    ResourceModel::anonymous(&TOTAL, &textbook_max(), &allocation).unwrap()
}

#[test]
fn unsafe_request_is_denied_and_state_is_unchanged() {
    let model = after_first_grant();
    let snapshot = model.clone();

    let outcome = banker::request_resources(&model, 0, &[0, 2, 0]).unwrap();
    let RequestOutcome::Denied { safety } = outcome else {
        panic!("request should be denied");
    };
    assert!(!safety.safe);
    assert!(safety.sequence.is_empty());
    assert_eq!(safety.unfinished, vec![0, 1, 2, 3, 4]);

    assert_eq!(model, snapshot);
    assert_eq!(model.available(), vec![2, 3, 0]);
}

#[test]
fn denied_response_omits_new_state() {
    let model = after_first_grant();
    let allocation: Vec<Vec<u64>> = model.allocation().clone();

    let h = start_engine();
    let out = ask(
        &h.engine,
        json!({
            "op": "banker.request",
            "total": TOTAL,
            "max_demand": textbook_max(),
            "allocation": allocation,
            "process_idx": 0,
            "request": [0, 2, 0],
        }),
    );
    assert_eq!(out, json!({"granted": false}));
}

#[test]
fn invalid_requests_are_errors_not_denials() {
    let model = textbook_model();

    let err = banker::request_resources(&model, 3, &[0, 2, 0]).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InvalidRequest(RequestRejection::ExceedsNeed {
            resource: 1,
            requested: 2,
            need: 1,
        })
    );

    let err = banker::request_resources(&model, 0, &[4, 0, 0]).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InvalidRequest(RequestRejection::ExceedsAvailable {
            resource: 0,
            requested: 4,
            available: 3,
        })
    );

    let err = banker::request_resources(&model, 5, &[0, 0, 0]).unwrap_err();
    assert_eq!(err.kind(), "InvalidRequest");
}
