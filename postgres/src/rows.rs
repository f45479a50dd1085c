//! Row decoding.
//!
//! Seat counts are stored as `BIGINT` and surfaced as `u32`; roles and
//! statuses are stored as their wire strings.

use exam_reservation_core::error::{ReservationError, Result};
use exam_reservation_core::types::{
    Exam, ExamId, HistoryId, Member, MemberId, Reservation, ReservationHistoryEntry,
    ReservationId, ReservationStatus, Role,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

pub const MEMBER_COLUMNS: &str = "id, username, password_hash, role, created_at, modified_at";

pub const EXAM_COLUMNS: &str =
    "id, owner_id, description, date, current_people, max_people, created_at, modified_at";

pub const RESERVATION_COLUMNS: &str =
    "id, member_id, exam_id, people, status, created_at, modified_at";

pub const HISTORY_COLUMNS: &str = "id, member_id, reservation_id, people, status, created_at";

fn decode(err: sqlx::Error) -> ReservationError {
    ReservationError::Storage(format!("Failed to decode row: {err}"))
}

fn uuid(row: &PgRow, column: &str) -> Result<Uuid> {
    row.try_get(column).map_err(decode)
}

pub fn seats(row: &PgRow, column: &str) -> Result<u32> {
    let value: i64 = row.try_get(column).map_err(decode)?;
    u32::try_from(value)
        .map_err(|_| ReservationError::Storage(format!("{column} out of range: {value}")))
}

pub fn status(row: &PgRow, column: &str) -> Result<ReservationStatus> {
    let value: String = row.try_get(column).map_err(decode)?;
    value
        .parse()
        .map_err(|e| ReservationError::Storage(format!("{column}: {e}")))
}

pub fn member(row: &PgRow) -> Result<Member> {
    let role: String = row.try_get("role").map_err(decode)?;
    Ok(Member {
        id: MemberId::from_uuid(uuid(row, "id")?),
        username: row.try_get("username").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role: role
            .parse::<Role>()
            .map_err(|e| ReservationError::Storage(format!("role: {e}")))?,
        created_at: row.try_get("created_at").map_err(decode)?,
        modified_at: row.try_get("modified_at").map_err(decode)?,
    })
}

pub fn exam(row: &PgRow) -> Result<Exam> {
    Ok(Exam {
        id: ExamId::from_uuid(uuid(row, "id")?),
        owner_id: MemberId::from_uuid(uuid(row, "owner_id")?),
        description: row.try_get("description").map_err(decode)?,
        date: row.try_get("date").map_err(decode)?,
        current_people: seats(row, "current_people")?,
        max_people: seats(row, "max_people")?,
        created_at: row.try_get("created_at").map_err(decode)?,
        modified_at: row.try_get("modified_at").map_err(decode)?,
    })
}

pub fn reservation(row: &PgRow) -> Result<Reservation> {
    Ok(Reservation {
        id: ReservationId::from_uuid(uuid(row, "id")?),
        member_id: MemberId::from_uuid(uuid(row, "member_id")?),
        exam_id: ExamId::from_uuid(uuid(row, "exam_id")?),
        people: seats(row, "people")?,
        status: status(row, "status")?,
        created_at: row.try_get("created_at").map_err(decode)?,
        modified_at: row.try_get("modified_at").map_err(decode)?,
    })
}

pub fn history(row: &PgRow) -> Result<ReservationHistoryEntry> {
    Ok(ReservationHistoryEntry {
        id: HistoryId::from_uuid(uuid(row, "id")?),
        member_id: MemberId::from_uuid(uuid(row, "member_id")?),
        reservation_id: ReservationId::from_uuid(uuid(row, "reservation_id")?),
        people: seats(row, "people")?,
        status: status(row, "status")?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

pub fn exam_id(row: &PgRow, column: &str) -> Result<ExamId> {
    uuid(row, column).map(ExamId::from_uuid)
}
