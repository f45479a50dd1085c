use crate::ledger::{lock_exam, write_occupancy};
use crate::rows::{self, EXAM_COLUMNS};
use crate::{PostgresStore, storage, violated_constraint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_reservation_core::environment::ExamRepository;
use exam_reservation_core::error::{ReservationError, Result};
use exam_reservation_core::types::{Exam, ExamId, MemberId};

const OWNER_FKEY: &str = "exams_owner_id_fkey";

#[async_trait]
impl ExamRepository for PostgresStore {
    async fn find_by_id(&self, id: ExamId) -> Result<Option<Exam>> {
        let row = sqlx::query(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("find exam"))?;
        row.as_ref().map(rows::exam).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Exam>> {
        sqlx::query(&format!("SELECT {EXAM_COLUMNS} FROM exams ORDER BY date, created_at"))
            .fetch_all(&self.pool)
            .await
            .map_err(storage("list exams"))?
            .iter()
            .map(rows::exam)
            .collect()
    }

    async fn find_by_owner(&self, owner_id: MemberId) -> Result<Vec<Exam>> {
        sqlx::query(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE owner_id = $1 ORDER BY date, created_at"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list exams by owner"))?
        .iter()
        .map(rows::exam)
        .collect()
    }

    async fn insert(&self, exam: &Exam) -> Result<Exam> {
        sqlx::query(
            r"
            INSERT INTO exams (
                id, owner_id, description, date, current_people, max_people,
                created_at, modified_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(exam.id.as_uuid())
        .bind(exam.owner_id.as_uuid())
        .bind(&exam.description)
        .bind(exam.date)
        .bind(i64::from(exam.current_people))
        .bind(i64::from(exam.max_people))
        .bind(exam.created_at)
        .bind(exam.modified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e) == Some(OWNER_FKEY) {
                ReservationError::MemberNotFound(exam.owner_id)
            } else {
                storage("insert exam")(e)
            }
        })?;
        Ok(exam.clone())
    }

    async fn delete(&self, id: ExamId) -> Result<bool> {
        // Reservations and their history cascade.
        let result = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage("delete exam"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn apply_delta(&self, id: ExamId, delta: i64, now: DateTime<Utc>) -> Result<Exam> {
        let mut tx = self.pool.begin().await.map_err(storage("begin"))?;
        let exam = lock_exam(&mut *tx, id)
            .await?
            .ok_or(ReservationError::ExamNotFound(id))?
            .with_delta(delta, now)?;
        write_occupancy(&mut *tx, &exam).await?;
        tx.commit().await.map_err(storage("commit"))?;
        Ok(exam)
    }
}
