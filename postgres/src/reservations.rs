use crate::ledger::apply_effects;
use crate::rows::{self, HISTORY_COLUMNS, RESERVATION_COLUMNS};
use crate::{PostgresStore, storage, violated_constraint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_reservation_core::environment::ReservationRepository;
use exam_reservation_core::error::{ReservationError, Result};
use exam_reservation_core::ledger::LedgerEffect;
use exam_reservation_core::types::{
    ExamId, MemberId, Reservation, ReservationHistoryEntry, ReservationId, ReservationVersion,
};
use sqlx::PgConnection;

const EXAM_FKEY: &str = "reservations_exam_id_fkey";
const MEMBER_FKEY: &str = "reservations_member_id_fkey";

async fn append_history(conn: &mut PgConnection, reservation: &Reservation) -> Result<()> {
    let entry = ReservationHistoryEntry::snapshot(reservation);
    sqlx::query(
        r"
        INSERT INTO reservation_history (id, member_id, reservation_id, people, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(entry.id.as_uuid())
    .bind(entry.member_id.as_uuid())
    .bind(entry.reservation_id.as_uuid())
    .bind(i64::from(entry.people))
    .bind(entry.status.as_str())
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await
    .map_err(storage("append reservation history"))?;
    Ok(())
}

/// Lock the reservation row and check its stored version.
async fn lock_expecting(
    conn: &mut PgConnection,
    id: ReservationId,
    expected: ReservationVersion,
) -> Result<()> {
    let row = sqlx::query("SELECT status, people FROM reservations WHERE id = $1 FOR UPDATE")
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage("lock reservation"))?
        .ok_or_else(|| ReservationError::reservation_not_found(id))?;

    let stored = ReservationVersion {
        status: rows::status(&row, "status")?,
        people: rows::seats(&row, "people")?,
    };
    if stored != expected {
        tracing::warn!(
            reservation_id = %id,
            expected = %expected,
            stored = %stored,
            "Reservation changed since it was read"
        );
        return Err(ReservationError::ConcurrentModification(id));
    }
    Ok(())
}

#[async_trait]
impl ReservationRepository for PostgresStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("find reservation"))?;
        row.as_ref().map(rows::reservation).transpose()
    }

    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Reservation>> {
        sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE member_id = $1 ORDER BY seq DESC"
        ))
        .bind(member_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list reservations by member"))?
        .iter()
        .map(rows::reservation)
        .collect()
    }

    async fn find_by_exam_and_member(
        &self,
        exam_id: ExamId,
        member_id: MemberId,
    ) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE exam_id = $1 AND member_id = $2
            ORDER BY seq
            LIMIT 1
            "
        ))
        .bind(exam_id.as_uuid())
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("find reservation by exam and member"))?;
        row.as_ref().map(rows::reservation).transpose()
    }

    async fn insert(&self, reservation: &Reservation) -> Result<Reservation> {
        let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
        sqlx::query(
            r"
            INSERT INTO reservations (id, member_id, exam_id, people, status, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.member_id.as_uuid())
        .bind(reservation.exam_id.as_uuid())
        .bind(i64::from(reservation.people))
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .bind(reservation.modified_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(EXAM_FKEY) => ReservationError::ExamNotFound(reservation.exam_id),
            Some(MEMBER_FKEY) => ReservationError::MemberNotFound(reservation.member_id),
            _ => storage("insert reservation")(e),
        })?;
        append_history(&mut *tx, reservation).await?;
        tx.commit().await.map_err(storage("commit"))?;
        Ok(reservation.clone())
    }

    async fn commit(
        &self,
        reservation: &Reservation,
        expected: ReservationVersion,
        effects: &[LedgerEffect],
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
        lock_expecting(&mut *tx, reservation.id, expected).await?;
        apply_effects(&mut *tx, effects, reservation.modified_at).await?;

        sqlx::query(
            "UPDATE reservations SET people = $2, status = $3, modified_at = $4 WHERE id = $1",
        )
        .bind(reservation.id.as_uuid())
        .bind(i64::from(reservation.people))
        .bind(reservation.status.as_str())
        .bind(reservation.modified_at)
        .execute(&mut *tx)
        .await
        .map_err(storage("update reservation"))?;
        append_history(&mut *tx, reservation).await?;

        tx.commit().await.map_err(storage("commit"))?;
        Ok(reservation.clone())
    }

    async fn delete(
        &self,
        reservation: &Reservation,
        effects: &[LedgerEffect],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
        lock_expecting(&mut *tx, reservation.id, reservation.version()).await?;
        apply_effects(&mut *tx, effects, now).await?;

        sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(reservation.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(storage("delete reservation"))?;

        tx.commit().await.map_err(storage("commit"))?;
        Ok(())
    }

    async fn history(&self, reservation_id: ReservationId) -> Result<Vec<ReservationHistoryEntry>> {
        sqlx::query(&format!(
            "SELECT {HISTORY_COLUMNS} FROM reservation_history WHERE reservation_id = $1 ORDER BY seq"
        ))
        .bind(reservation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list reservation history"))?
        .iter()
        .map(rows::history)
        .collect()
    }
}
