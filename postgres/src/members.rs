use crate::ledger::apply_effects;
use crate::rows::{self, MEMBER_COLUMNS};
use crate::{PostgresStore, storage, violated_constraint};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_reservation_core::environment::MemberRepository;
use exam_reservation_core::error::{ReservationError, Result};
use exam_reservation_core::ledger::LedgerEffect;
use exam_reservation_core::types::{Member, MemberId};

const USERNAME_KEY: &str = "members_username_key";
const EXAM_OWNER_FKEY: &str = "exams_owner_id_fkey";

fn owns_exams() -> ReservationError {
    ReservationError::MemberValidation {
        reason: "member still owns exams".into(),
    }
}

#[async_trait]
impl MemberRepository for PostgresStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("find member"))?;
        row.as_ref().map(rows::member).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>> {
        let row =
            sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage("find member by username"))?;
        row.as_ref().map(rows::member).transpose()
    }

    async fn insert(&self, member: &Member) -> Result<Member> {
        sqlx::query(
            r"
            INSERT INTO members (id, username, password_hash, role, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(member.id.as_uuid())
        .bind(&member.username)
        .bind(&member.password_hash)
        .bind(member.role.as_str())
        .bind(member.created_at)
        .bind(member.modified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e) == Some(USERNAME_KEY) {
                ReservationError::UsernameTaken(member.username.clone())
            } else {
                storage("insert member")(e)
            }
        })?;
        Ok(member.clone())
    }

    async fn update(&self, member: &Member) -> Result<Member> {
        let result = sqlx::query(
            r"
            UPDATE members
            SET username = $2, password_hash = $3, role = $4, modified_at = $5
            WHERE id = $1
            ",
        )
        .bind(member.id.as_uuid())
        .bind(&member.username)
        .bind(&member.password_hash)
        .bind(member.role.as_str())
        .bind(member.modified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e) == Some(USERNAME_KEY) {
                ReservationError::UsernameTaken(member.username.clone())
            } else {
                storage("update member")(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(ReservationError::MemberNotFound(member.id));
        }
        Ok(member.clone())
    }

    async fn delete(&self, id: MemberId, now: DateTime<Utc>) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(storage("begin"))?;

        let locked: Option<(uuid::Uuid,)> =
            sqlx::query_as("SELECT id FROM members WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage("lock member"))?;
        if locked.is_none() {
            return Ok(false);
        }

        let (owner,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM exams WHERE owner_id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(storage("check exam ownership"))?;
        if owner {
            return Err(owns_exams());
        }

        // Ordered by exam so concurrent deletes lock exam rows in the same order.
        let confirmed = sqlx::query(
            r"
            SELECT exam_id, people FROM reservations
            WHERE member_id = $1 AND status = 'CONFIRMED'
            ORDER BY exam_id
            FOR UPDATE
            ",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(storage("lock confirmed reservations"))?;

        let credits = confirmed
            .iter()
            .map(|row| {
                Ok(LedgerEffect::Credit {
                    exam_id: rows::exam_id(row, "exam_id")?,
                    people: rows::seats(row, "people")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        apply_effects(&mut *tx, &credits, now).await?;

        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if violated_constraint(&e) == Some(EXAM_OWNER_FKEY) {
                    owns_exams()
                } else {
                    storage("delete member")(e)
                }
            })?;

        tx.commit().await.map_err(storage("commit"))?;
        tracing::info!(member_id = %id, released = credits.len(), "Member deleted");
        Ok(true)
    }
}
