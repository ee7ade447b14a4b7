mod common;

use common::{ask, expect_deadlock, start_engine};
use resalloc::recovery::{self, MinAllocation};
use resalloc::{Available, ResourceModel, detector};
use serde_json::json;

#[test]
fn recovery_clears_a_multi_instance_deadlock() {
    let allocation = vec![vec![1, 0, 1], vec![0, 1, 0], vec![1, 1, 0]];
    let request = vec![vec![0, 1, 0], vec![1, 0, 0], vec![0, 0, 1]];

    let report =
        detector::detect(&Available::Overridden(vec![0, 0, 0]), &allocation, &request).unwrap();
    assert_eq!(report.deadlocked, vec![0, 1, 2]);

    let model = ResourceModel::from_holdings(vec![], vec![], &allocation, &allocation).unwrap();
    let plan =
        recovery::suggest_recovery(&model, Some(report.deadlocked.as_slice()), &MinAllocation)
            .unwrap();

    // P2 holds one unit, the others two
    assert_eq!(plan.victim.name, "P2");
    assert_eq!(plan.victim.released, vec![0, 1, 0]);
    assert!(plan.new_allocation[1].iter().all(|&units| units == 0));
    for row in [0, 2] {
        assert_eq!(plan.new_allocation[row], model.allocation()[row]);
    }

    // Released units become available and the survivors can finish
    let released: Vec<i64> = plan.victim.released.iter().map(|&u| u as i64).collect();
    let survivors: Vec<Vec<i64>> = plan
        .new_allocation
        .iter()
        .map(|row| row.iter().map(|&u| u as i64).collect())
        .collect();
    let after = detector::detect(&Available::Overridden(released), &survivors, &request).unwrap();
    assert!(!after.deadlock);
}

#[test]
fn engine_detect_then_recover() {
    let h = start_engine();
    let allocation = json!([[1, 0], [0, 1]]);

    let out = ask(
        &h.engine,
        json!({
            "op": "detect.multi",
            "available": [0, 0],
            "allocation": allocation,
            "request": [[0, 1], [1, 0]],
        }),
    );
    let deadlocked = out["deadlocked_processes"].clone();
    assert_eq!(deadlocked, json!([0, 1]));
    expect_deadlock(&h);

    let out = ask(
        &h.engine,
        json!({
            "op": "recovery",
            "processes": ["P1", "P2"],
            "resources": ["R1", "R2"],
            "allocation": allocation,
            "max_demand": [[1, 1], [1, 1]],
            "deadlocked": deadlocked,
        }),
    );
    assert_eq!(out["victim"]["name"], json!("P1"));
    assert_eq!(out["new_allocation"], json!([[0, 0], [0, 1]]));
}

#[test]
fn recovery_without_holders_is_an_error() {
    let h = start_engine();
    let out = ask(
        &h.engine,
        json!({"op": "recovery", "allocation": [[0, 0], [0, 0]]}),
    );
    assert_eq!(out["error"]["kind"], json!("NoVictim"));
}
