//! In-memory implementation of every repository trait.

#![allow(clippy::missing_errors_doc)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_reservation_core::environment::{
    ExamRepository, MemberRepository, ReservationRepository, StorageHealth,
};
use exam_reservation_core::error::{ReservationError, Result};
use exam_reservation_core::ledger::LedgerEffect;
use exam_reservation_core::types::{
    Exam, ExamId, Member, MemberId, Reservation, ReservationHistoryEntry, ReservationId,
    ReservationStatus, ReservationVersion,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    members: HashMap<MemberId, Member>,
    exams: HashMap<ExamId, Exam>,
    // Insertion order stands in for a serial primary key.
    reservations: Vec<Reservation>,
    history: Vec<ReservationHistoryEntry>,
}

impl Inner {
    fn position(&self, id: ReservationId) -> Result<usize> {
        self.reservations
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ReservationError::reservation_not_found(id))
    }

    /// Position of the reservation, provided it still has `expected`.
    fn position_expecting(&self, id: ReservationId, expected: ReservationVersion) -> Result<usize> {
        let idx = self.position(id)?;
        if self.reservations[idx].version() != expected {
            return Err(ReservationError::ConcurrentModification(id));
        }
        Ok(idx)
    }

    /// Applies all effects or none of them.
    fn apply_effects(&mut self, effects: &[LedgerEffect], now: DateTime<Utc>) -> Result<()> {
        let mut staged: HashMap<ExamId, Exam> = HashMap::new();
        for effect in effects {
            let exam_id = effect.exam_id();
            let current = match staged.get(&exam_id) {
                Some(exam) => exam,
                None => self
                    .exams
                    .get(&exam_id)
                    .ok_or(ReservationError::ExamNotFound(exam_id))?,
            };
            let next = current.apply(effect, now)?;
            staged.insert(exam_id, next);
        }
        self.exams.extend(staged);
        Ok(())
    }

    fn remove_reservations<F>(&mut self, mut pred: F) -> Vec<Reservation>
    where
        F: FnMut(&Reservation) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.reservations).into_iter().partition(|r| pred(r));
        self.reservations = kept;
        self.history
            .retain(|h| !removed.iter().any(|r| r.id == h.reservation_id));
        removed
    }
}

/// In-memory store for fast, deterministic tests.
///
/// Every write runs under one mutex, so `commit` and `delete` have the same
/// all-or-nothing behavior as the transactional Postgres store, including
/// the expected-version check and the capacity bound on debits.
///
/// # Example
///
/// ```
/// use exam_reservation_testing::{InMemoryStore, fixtures};
/// use exam_reservation_core::environment::ExamRepository;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = InMemoryStore::new();
/// let exam = fixtures::exam(fixtures::admin("root").id).build();
/// ExamRepository::insert(&store, &exam).await.unwrap();
/// assert_eq!(store.exam(exam.id), Some(exam));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `ping` fail, for readiness tests
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of an exam
    #[must_use]
    pub fn exam(&self, id: ExamId) -> Option<Exam> {
        self.lock().ok()?.exams.get(&id).cloned()
    }

    /// Snapshot of a reservation
    #[must_use]
    pub fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        let inner = self.lock().ok()?;
        inner.reservations.iter().find(|r| r.id == id).cloned()
    }

    /// Number of stored reservations
    #[must_use]
    pub fn reservation_count(&self) -> usize {
        self.lock().map_or(0, |inner| inner.reservations.len())
    }

    /// Overwrite a stored reservation without touching the ledger.
    ///
    /// Simulates a concurrent writer in tests.
    pub fn overwrite_reservation(&self, reservation: Reservation) -> Result<()> {
        let mut inner = self.lock()?;
        let idx = inner.position(reservation.id)?;
        inner.reservations[idx] = reservation;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ReservationError::Storage("in-memory store mutex poisoned".into()))
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.lock()?.members.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Member>> {
        Ok(self
            .lock()?
            .members
            .values()
            .find(|m| m.username == username)
            .cloned())
    }

    async fn insert(&self, member: &Member) -> Result<Member> {
        let mut inner = self.lock()?;
        if inner.members.values().any(|m| m.username == member.username) {
            return Err(ReservationError::UsernameTaken(member.username.clone()));
        }
        inner.members.insert(member.id, member.clone());
        Ok(member.clone())
    }

    async fn update(&self, member: &Member) -> Result<Member> {
        let mut inner = self.lock()?;
        if !inner.members.contains_key(&member.id) {
            return Err(ReservationError::MemberNotFound(member.id));
        }
        if inner
            .members
            .values()
            .any(|m| m.id != member.id && m.username == member.username)
        {
            return Err(ReservationError::UsernameTaken(member.username.clone()));
        }
        inner.members.insert(member.id, member.clone());
        Ok(member.clone())
    }

    async fn delete(&self, id: MemberId, now: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.lock()?;
        if !inner.members.contains_key(&id) {
            return Ok(false);
        }
        if inner.exams.values().any(|e| e.owner_id == id) {
            return Err(ReservationError::MemberValidation {
                reason: "member still owns exams".into(),
            });
        }

        let credits: Vec<LedgerEffect> = inner
            .reservations
            .iter()
            .filter(|r| r.member_id == id && r.status == ReservationStatus::Confirmed)
            .map(|r| LedgerEffect::Credit {
                exam_id: r.exam_id,
                people: r.people,
            })
            .collect();
        inner.apply_effects(&credits, now)?;
        inner.remove_reservations(|r| r.member_id == id);
        inner.members.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ExamRepository for InMemoryStore {
    async fn find_by_id(&self, id: ExamId) -> Result<Option<Exam>> {
        Ok(self.lock()?.exams.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Exam>> {
        let mut exams: Vec<Exam> = self.lock()?.exams.values().cloned().collect();
        exams.sort_by_key(|e| (e.date, e.created_at));
        Ok(exams)
    }

    async fn find_by_owner(&self, owner_id: MemberId) -> Result<Vec<Exam>> {
        let mut exams: Vec<Exam> = self
            .lock()?
            .exams
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        exams.sort_by_key(|e| (e.date, e.created_at));
        Ok(exams)
    }

    async fn insert(&self, exam: &Exam) -> Result<Exam> {
        self.lock()?.exams.insert(exam.id, exam.clone());
        Ok(exam.clone())
    }

    async fn delete(&self, id: ExamId) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.exams.remove(&id).is_none() {
            return Ok(false);
        }
        inner.remove_reservations(|r| r.exam_id == id);
        Ok(true)
    }

    async fn apply_delta(&self, id: ExamId, delta: i64, now: DateTime<Utc>) -> Result<Exam> {
        let mut inner = self.lock()?;
        let exam = inner
            .exams
            .get(&id)
            .ok_or(ReservationError::ExamNotFound(id))?
            .with_delta(delta, now)?;
        inner.exams.insert(id, exam.clone());
        Ok(exam)
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.reservation(id))
    }

    async fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Reservation>> {
        let inner = self.lock()?;
        Ok(inner
            .reservations
            .iter()
            .rev()
            .filter(|r| r.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn find_by_exam_and_member(
        &self,
        exam_id: ExamId,
        member_id: MemberId,
    ) -> Result<Option<Reservation>> {
        let inner = self.lock()?;
        Ok(inner
            .reservations
            .iter()
            .find(|r| r.exam_id == exam_id && r.member_id == member_id)
            .cloned())
    }

    async fn insert(&self, reservation: &Reservation) -> Result<Reservation> {
        let mut inner = self.lock()?;
        if !inner.exams.contains_key(&reservation.exam_id) {
            return Err(ReservationError::ExamNotFound(reservation.exam_id));
        }
        inner.reservations.push(reservation.clone());
        inner.history.push(ReservationHistoryEntry::snapshot(reservation));
        Ok(reservation.clone())
    }

    async fn commit(
        &self,
        reservation: &Reservation,
        expected: ReservationVersion,
        effects: &[LedgerEffect],
    ) -> Result<Reservation> {
        let mut inner = self.lock()?;
        let idx = inner.position_expecting(reservation.id, expected)?;
        inner.apply_effects(effects, reservation.modified_at)?;
        inner.reservations[idx] = reservation.clone();
        inner.history.push(ReservationHistoryEntry::snapshot(reservation));
        Ok(reservation.clone())
    }

    async fn delete(
        &self,
        reservation: &Reservation,
        effects: &[LedgerEffect],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        inner.position_expecting(reservation.id, reservation.version())?;
        inner.apply_effects(effects, now)?;
        let id = reservation.id;
        inner.remove_reservations(|r| r.id == id);
        Ok(())
    }

    async fn history(&self, reservation_id: ReservationId) -> Result<Vec<ReservationHistoryEntry>> {
        let inner = self.lock()?;
        Ok(inner
            .history
            .iter()
            .filter(|h| h.reservation_id == reservation_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StorageHealth for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ReservationError::Storage("store marked unavailable".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_commit_rejects_stale_status() {
        let store = InMemoryStore::new();
        let exam = fixtures::exam(MemberId::new()).max_people(10).build();
        ExamRepository::insert(&store, &exam).await.unwrap();
        let reservation = fixtures::reservation(MemberId::new(), exam.id, 2);
        ReservationRepository::insert(&store, &reservation).await.unwrap();

        let mut confirmed = reservation.clone();
        confirmed.status = ReservationStatus::Confirmed;
        let debit = [LedgerEffect::Debit { exam_id: exam.id, people: 2 }];

        store
            .commit(&confirmed, reservation.version(), &debit)
            .await
            .unwrap();
        let err = store
            .commit(&confirmed, reservation.version(), &debit)
            .await
            .unwrap_err();

        assert_eq!(err, ReservationError::ConcurrentModification(reservation.id));
        assert_eq!(store.exam(exam.id).unwrap().current_people, 2);
    }

    #[tokio::test]
    async fn test_commit_rejects_overshooting_debit_atomically() {
        let store = InMemoryStore::new();
        let exam = fixtures::exam(MemberId::new()).current_people(9).max_people(10).build();
        ExamRepository::insert(&store, &exam).await.unwrap();
        let reservation = fixtures::reservation(MemberId::new(), exam.id, 2);
        ReservationRepository::insert(&store, &reservation).await.unwrap();

        let mut confirmed = reservation.clone();
        confirmed.status = ReservationStatus::Confirmed;
        let err = store
            .commit(
                &confirmed,
                reservation.version(),
                &[LedgerEffect::Debit { exam_id: exam.id, people: 2 }],
            )
            .await
            .unwrap_err();

        assert_eq!(err, ReservationError::ExamCapacityExceeded { exam_id: exam.id });
        assert_eq!(store.reservation(reservation.id).unwrap().status, ReservationStatus::Pending);
        assert_eq!(store.exam(exam.id).unwrap().current_people, 9);
    }

    #[tokio::test]
    async fn test_member_delete_releases_confirmed_seats() {
        let store = InMemoryStore::new();
        let member = fixtures::user("lee");
        MemberRepository::insert(&store, &member).await.unwrap();
        let exam = fixtures::exam(MemberId::new()).current_people(5).build();
        ExamRepository::insert(&store, &exam).await.unwrap();

        let mut reservation = fixtures::reservation(member.id, exam.id, 5);
        reservation.status = ReservationStatus::Confirmed;
        ReservationRepository::insert(&store, &reservation).await.unwrap();

        let later = exam.created_at + chrono::Duration::hours(6);
        assert!(MemberRepository::delete(&store, member.id, later).await.unwrap());
        let stored = store.exam(exam.id).unwrap();
        assert_eq!(stored.current_people, 0);
        assert_eq!(stored.modified_at, later);
        assert_eq!(store.reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_ledger_writes_stamp_the_caller_time() {
        let store = InMemoryStore::new();
        let exam = fixtures::exam(MemberId::new()).max_people(10).build();
        ExamRepository::insert(&store, &exam).await.unwrap();
        let first = exam.created_at + chrono::Duration::minutes(1);
        let second = exam.created_at + chrono::Duration::minutes(2);

        assert_eq!(store.apply_delta(exam.id, 4, first).await.unwrap().modified_at, first);

        let mut reservation = fixtures::reservation(MemberId::new(), exam.id, 3);
        reservation.status = ReservationStatus::Confirmed;
        ReservationRepository::insert(&store, &reservation).await.unwrap();
        let credit = [LedgerEffect::Credit { exam_id: exam.id, people: 3 }];
        ReservationRepository::delete(&store, &reservation, &credit, second)
            .await
            .unwrap();

        let stored = store.exam(exam.id).unwrap();
        assert_eq!(stored.current_people, 1);
        assert_eq!(stored.modified_at, second);
    }

    #[tokio::test]
    async fn test_history_follows_writes_and_deletes() {
        let store = InMemoryStore::new();
        let exam = fixtures::exam(MemberId::new()).build();
        ExamRepository::insert(&store, &exam).await.unwrap();
        let reservation = fixtures::reservation(MemberId::new(), exam.id, 1);
        ReservationRepository::insert(&store, &reservation).await.unwrap();

        let mut denied = reservation.clone();
        denied.status = ReservationStatus::Denied;
        store.commit(&denied, reservation.version(), &[]).await.unwrap();

        let history = store.history(reservation.id).await.unwrap();
        let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
        assert_eq!(statuses, vec![ReservationStatus::Pending, ReservationStatus::Denied]);

        ReservationRepository::delete(&store, &denied, &[], denied.modified_at)
            .await
            .unwrap();
        assert!(store.history(reservation.id).await.unwrap().is_empty());
    }

    async fn confirmed_five_of_ten(store: &InMemoryStore) -> (Exam, Reservation) {
        let exam = fixtures::exam(MemberId::new()).max_people(10).build();
        ExamRepository::insert(store, &exam).await.unwrap();
        let pending = fixtures::reservation(MemberId::new(), exam.id, 5);
        ReservationRepository::insert(store, &pending).await.unwrap();

        let mut confirmed = pending.clone();
        confirmed.status = ReservationStatus::Confirmed;
        store
            .commit(
                &confirmed,
                pending.version(),
                &[LedgerEffect::Debit { exam_id: exam.id, people: 5 }],
            )
            .await
            .unwrap();
        (exam, confirmed)
    }

    fn resized(reservation: &Reservation, people: u32) -> (Reservation, LedgerEffect) {
        let mut next = reservation.clone();
        next.people = people;
        let delta = i64::from(people) - i64::from(reservation.people);
        let effect = LedgerEffect::from_delta(reservation.exam_id, delta).unwrap();
        (next, effect)
    }

    #[tokio::test]
    async fn test_delete_rejects_snapshot_with_stale_people() {
        let store = InMemoryStore::new();
        let (exam, snapshot) = confirmed_five_of_ten(&store).await;

        let (grown, delta) = resized(&snapshot, 8);
        store.commit(&grown, snapshot.version(), &[delta]).await.unwrap();
        assert_eq!(store.exam(exam.id).unwrap().current_people, 8);

        let credit = [LedgerEffect::Credit { exam_id: exam.id, people: 5 }];
        let err = ReservationRepository::delete(&store, &snapshot, &credit, snapshot.modified_at)
            .await
            .unwrap_err();

        assert_eq!(err, ReservationError::ConcurrentModification(snapshot.id));
        assert_eq!(store.exam(exam.id).unwrap().current_people, 8);
        assert_eq!(store.reservation(snapshot.id).unwrap().people, 8);
    }

    #[tokio::test]
    async fn test_second_resize_from_same_snapshot_is_rejected() {
        let store = InMemoryStore::new();
        let (exam, snapshot) = confirmed_five_of_ten(&store).await;

        let (grown, grow) = resized(&snapshot, 8);
        let (shrunk, shrink) = resized(&snapshot, 2);
        store.commit(&grown, snapshot.version(), &[grow]).await.unwrap();
        let err = store
            .commit(&shrunk, snapshot.version(), &[shrink])
            .await
            .unwrap_err();

        assert_eq!(err, ReservationError::ConcurrentModification(snapshot.id));
        let stored = store.reservation(snapshot.id).unwrap();
        assert_eq!(stored.people, 8);
        assert_eq!(store.exam(exam.id).unwrap().current_people, stored.people);
    }
}
