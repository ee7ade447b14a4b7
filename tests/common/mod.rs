use resalloc::{DeadlockReport, Engine, ResourceModel};
use serde_json::Value;
use std::sync::mpsc;

/// Engine wired to a channel that receives every deadlock report
pub struct AnalysisHarness {
    pub engine: Engine,
    pub rx: mpsc::Receiver<DeadlockReport>,
}

#[allow(dead_code)]
pub fn start_engine() -> AnalysisHarness {
    let (tx, rx) = mpsc::channel::<DeadlockReport>();
    let tx = parking_lot::Mutex::new(tx);

    let engine = Engine::builder()
        .callback(move |report| {
            let _ = tx.lock().send(report);
        })
        .build()
        .expect("Failed to build engine");

    AnalysisHarness { engine, rx }
}

#[allow(dead_code)]
pub fn expect_deadlock(h: &AnalysisHarness) -> DeadlockReport {
    match h.rx.try_recv() {
        Ok(report) => report,
        Err(_) => panic!("No deadlock reported"),
    }
}

#[allow(dead_code)]
pub fn assert_no_deadlock(h: &AnalysisHarness) {
    assert!(h.rx.try_recv().is_err(), "Unexpected deadlock reported");
}

/// Send a request through the JSON entry point
#[allow(dead_code)]
pub fn ask(engine: &Engine, request: Value) -> Value {
    engine.handle_value(&request.to_string())
}

#[allow(dead_code)]
pub const TOTAL: [i64; 3] = [10, 5, 7];

#[allow(dead_code)]
pub fn textbook_max() -> Vec<Vec<i64>> {
    vec![
        vec![7, 5, 3],
        vec![3, 2, 2],
        vec![9, 0, 2],
        vec![2, 2, 2],
        vec![4, 3, 3],
    ]
}

#[allow(dead_code)]
pub fn textbook_allocation() -> Vec<Vec<i64>> {
    vec![
        vec![0, 1, 0],
        vec![2, 0, 0],
        vec![3, 0, 2],
        vec![2, 1, 1],
        vec![0, 0, 2],
    ]
}

/// Five processes, three resource types, available [3, 3, 2]
#[allow(dead_code)]
pub fn textbook_model() -> ResourceModel {
    ResourceModel::anonymous(&TOTAL, &textbook_max(), &textbook_allocation())
        .expect("textbook state is valid")
}
