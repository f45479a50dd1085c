//! Applying ledger effects inside a transaction.

use crate::rows::{self, EXAM_COLUMNS};
use crate::storage;
use chrono::{DateTime, Utc};
use exam_reservation_core::error::{ReservationError, Result};
use exam_reservation_core::ledger::LedgerEffect;
use exam_reservation_core::types::{Exam, ExamId};
use sqlx::PgConnection;

/// Lock an exam row for the rest of the transaction.
pub async fn lock_exam(conn: &mut PgConnection, id: ExamId) -> Result<Option<Exam>> {
    let row = sqlx::query(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1 FOR UPDATE"))
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage("lock exam"))?;
    row.as_ref().map(rows::exam).transpose()
}

/// Write back an exam's occupancy.
pub async fn write_occupancy(conn: &mut PgConnection, exam: &Exam) -> Result<()> {
    sqlx::query("UPDATE exams SET current_people = $2, modified_at = $3 WHERE id = $1")
        .bind(exam.id.as_uuid())
        .bind(i64::from(exam.current_people))
        .bind(exam.modified_at)
        .execute(&mut *conn)
        .await
        .map_err(storage("update exam occupancy"))?;
    Ok(())
}

/// Apply each effect to its locked exam row.
///
/// Fails on the first effect the ledger rejects; the caller's transaction
/// is then dropped so nothing is written.
pub async fn apply_effects(
    conn: &mut PgConnection,
    effects: &[LedgerEffect],
    now: DateTime<Utc>,
) -> Result<()> {
    for effect in effects {
        let exam_id = effect.exam_id();
        let exam = lock_exam(conn, exam_id)
            .await?
            .ok_or(ReservationError::ExamNotFound(exam_id))?;
        let next = exam.apply(effect, now)?;
        write_occupancy(conn, &next).await?;
        tracing::debug!(
            exam_id = %exam_id,
            direction = effect.direction(),
            current_people = next.current_people,
            "Ledger effect applied"
        );
    }
    Ok(())
}
