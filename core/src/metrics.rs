//! Business metrics for exam reservations.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `exam_reservations_total{status}` - Reservation lifecycle events
//!   (`created`, `confirmed`, `denied`, `updated`, `deleted`, `rejected`)
//! - `exam_ledger_delta_total{direction}` - Seats moved on exam ledgers
//! - `exam_members_registered_total` - Members registered
//! - `exam_exams_created_total` - Exams created
//!
//! ## Gauges
//! - `exam_seats_remaining{exam_id}` - Remaining seats after the last ledger change

use crate::ledger::LedgerEffect;
use crate::types::{Exam, ReservationStatus};
use metrics::{describe_counter, describe_gauge};

/// Register all metric descriptions.
///
/// Call once at startup, before any metric is recorded.
pub fn register_metrics() {
    describe_counter!(
        "exam_reservations_total",
        "Reservation lifecycle events by status"
    );
    describe_counter!(
        "exam_ledger_delta_total",
        "Seats debited or credited on exam ledgers"
    );
    describe_counter!(
        "exam_members_registered_total",
        "Total number of members registered"
    );
    describe_counter!("exam_exams_created_total", "Total number of exams created");
    describe_gauge!(
        "exam_seats_remaining",
        "Remaining seats per exam after the last ledger change"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a reservation event.
pub fn record_reservation(status: &'static str) {
    metrics::counter!("exam_reservations_total", "status" => status).increment(1);
}

/// Record a status transition.
pub fn record_transition(to: ReservationStatus) {
    let status = match to {
        ReservationStatus::Pending => "pending",
        ReservationStatus::Confirmed => "confirmed",
        ReservationStatus::Denied => "denied",
    };
    record_reservation(status);
}

/// Record applied ledger effects.
pub fn record_ledger_effects(effects: &[LedgerEffect]) {
    for effect in effects {
        metrics::counter!("exam_ledger_delta_total", "direction" => effect.direction())
            .increment(effect.delta().unsigned_abs());
    }
}

/// Record the remaining seats of an exam.
pub fn record_seats_remaining(exam: &Exam) {
    metrics::gauge!("exam_seats_remaining", "exam_id" => exam.id.to_string())
        .set(f64::from(exam.remaining()));
}

/// Record a member registration.
pub fn record_member_registered() {
    metrics::counter!("exam_members_registered_total").increment(1);
}

/// Record an exam creation.
pub fn record_exam_created() {
    metrics::counter!("exam_exams_created_total").increment(1);
}
