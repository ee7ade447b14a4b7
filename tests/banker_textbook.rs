mod common;

use common::{TOTAL, ask, start_engine, textbook_allocation, textbook_max, textbook_model};
use resalloc::banker::{self, RequestOutcome};
use serde_json::json;

#[test]
fn textbook_state_is_safe() {
    let model = textbook_model();
    assert_eq!(model.available(), vec![3, 3, 2]);

    let report = banker::is_safe(&model);
    assert!(report.safe);
    assert_eq!(report.sequence, vec![1, 3, 0, 2, 4]);
    assert_eq!(report.sequence_names(&model), ["P2", "P4", "P1", "P3", "P5"]);
    assert!(report.unfinished.is_empty());
    assert_eq!(report.work, vec![10, 5, 7]);

    // Same input, same answer
    assert_eq!(banker::is_safe(&model), report);
}

#[test]
fn textbook_state_through_the_engine() {
    let h = start_engine();
    let out = ask(
        &h.engine,
        json!({
            "op": "banker.safe",
            "total": TOTAL,
            "max_demand": textbook_max(),
            "allocation": textbook_allocation(),
        }),
    );
    assert_eq!(
        out,
        json!({"safe": true, "sequence": ["P2", "P4", "P1", "P3", "P5"]})
    );
}

#[test]
fn granted_request_moves_exactly_the_requested_units() {
    let model = textbook_model();
    let before = model.available();

    let outcome = banker::request_resources(&model, 1, &[1, 0, 2]).unwrap();
    let RequestOutcome::Granted {
        allocation,
        available,
        safety,
    } = outcome
    else {
        panic!("request should be granted");
    };

    assert_eq!(allocation[1], vec![3, 0, 2]);
    assert_eq!(available, vec![2, 3, 0]);
    for (column, (&after, &was)) in available.iter().zip(&before).enumerate() {
        assert_eq!(was - after, [1, 0, 2][column]);
    }
    for (row, original) in model.allocation().iter().enumerate() {
        if row != 1 {
            assert_eq!(&allocation[row], original);
        }
    }
    for (column, &total) in TOTAL.iter().enumerate() {
        let held: u64 = allocation.iter().map(|row| row[column]).sum();
        assert!(held <= total as u64);
    }

    assert!(safety.safe);
    assert_eq!(safety.sequence_names(&model), ["P2", "P4", "P1", "P3", "P5"]);
}

#[test]
fn named_processes_and_resources() {
    let h = start_engine();
    let out = ask(
        &h.engine,
        json!({
            "op": "banker.request",
            "total": TOTAL,
            "max_demand": textbook_max(),
            "allocation": textbook_allocation(),
            "processes": ["init", "sshd", "cron", "nginx", "redis"],
            "resources": ["cpu", "disk", "tape"],
            "process_idx": 1,
            "request": [1, 0, 2],
        }),
    );
    assert_eq!(out["granted"], json!(true));
    assert_eq!(out["new_allocation"][1], json!([3, 0, 2]));
    assert_eq!(out["new_available"], json!([2, 3, 0]));
    assert_eq!(
        out["sequence"],
        json!(["sshd", "nginx", "init", "cron", "redis"])
    );
}
