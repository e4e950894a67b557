//! Prometheus metrics for the checker

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    /// Trigger messages received from the stream
    pub static ref TRIGGERS_RECEIVED_TOTAL: IntCounter = register_int_counter!(
        "netting_checker_triggers_received_total",
        "Total trigger messages received"
    )
    .unwrap();

    /// Evaluations by result (in_progress, duplicate, completed, failed, errored)
    pub static ref EVALUATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "netting_checker_evaluations_total",
        "Total trigger evaluations by result",
        &["result"]
    )
    .unwrap();

    /// Evaluation duration
    pub static ref EVALUATION_DURATION: Histogram = register_histogram!(
        "netting_checker_evaluation_duration_seconds",
        "Trigger evaluation duration in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .unwrap();

    /// Evaluations currently running
    pub static ref EVALUATIONS_IN_FLIGHT: IntGauge = register_int_gauge!(
        "netting_checker_evaluations_in_flight",
        "Trigger evaluations currently running"
    )
    .unwrap();

    /// Outcomes published by outcome status and publish result
    pub static ref OUTCOME_PUBLISH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "netting_checker_outcome_publish_total",
        "Total outcome publish attempts",
        &["outcome", "status"]
    )
    .unwrap();

    /// Outcome publish duration, retries included
    pub static ref OUTCOME_PUBLISH_DURATION: Histogram = register_histogram!(
        "netting_checker_outcome_publish_duration_seconds",
        "Outcome publish duration in seconds"
    )
    .unwrap();
}
