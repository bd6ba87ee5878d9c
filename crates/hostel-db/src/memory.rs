//! In-memory repository implementations
//!
//! Thread-safe map-backed stores with the same soft-delete and ordering
//! semantics as the PostgreSQL repositories. Used by the service tests and
//! handy for demos without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hostel_core::{
    models::{
        AdvanceApplication, BillingMonth, BillingPeriod, LedgerEntry, Room,
        SecurityDepositTransaction, Student, StudentStatus,
    },
    traits::{
        AdvanceApplicationRepository, DepositTransactionRepository, LedgerRepository,
        RoomRepository, StudentRepository,
    },
    AppError, AppResult,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory student store
#[derive(Default)]
pub struct MemoryStudentRepository {
    students: RwLock<HashMap<Uuid, Student>>,
}

impl MemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentRepository for MemoryStudentRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Student>> {
        let students = self.students.read();
        Ok(students.get(&id).filter(|s| !s.is_deleted).cloned())
    }

    async fn create(&self, student: &Student) -> AppResult<Student> {
        let mut students = self.students.write();
        if students.contains_key(&student.id) {
            return Err(AppError::Conflict(format!(
                "Student {} already exists",
                student.id
            )));
        }
        students.insert(student.id, student.clone());
        Ok(student.clone())
    }

    async fn update(&self, student: &Student) -> AppResult<Student> {
        let mut students = self.students.write();
        if !students.contains_key(&student.id) {
            return Err(AppError::StudentNotFound(student.id.to_string()));
        }
        students.insert(student.id, student.clone());
        Ok(student.clone())
    }

    async fn list_active(&self) -> AppResult<Vec<Student>> {
        let students = self.students.read();
        let mut active: Vec<Student> = students
            .values()
            .filter(|s| s.status == StudentStatus::Active && !s.is_deleted)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.created_at);
        Ok(active)
    }

    async fn count_active(&self) -> AppResult<i64> {
        let students = self.students.read();
        Ok(students
            .values()
            .filter(|s| s.status == StudentStatus::Active && !s.is_deleted)
            .count() as i64)
    }

    async fn last_code_with_prefix(&self, prefix: &str) -> AppResult<Option<String>> {
        let students = self.students.read();
        Ok(students
            .values()
            .filter(|s| s.student_code.starts_with(prefix))
            .map(|s| s.student_code.clone())
            .max())
    }

    async fn find_active_by_bed(
        &self,
        room_id: Uuid,
        bed_number: u32,
    ) -> AppResult<Option<Student>> {
        let students = self.students.read();
        Ok(students
            .values()
            .find(|s| {
                s.room_id == room_id
                    && s.bed_number == bed_number
                    && s.status == StudentStatus::Active
                    && !s.is_deleted
            })
            .cloned())
    }
}

/// In-memory room store
#[derive(Default)]
pub struct MemoryRoomRepository {
    rooms: RwLock<HashMap<Uuid, Room>>,
}

impl MemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a room directly, for test setup
    pub fn insert(&self, room: Room) {
        self.rooms.write().insert(room.id, room);
    }
}

#[async_trait]
impl RoomRepository for MemoryRoomRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Room>> {
        let rooms = self.rooms.read();
        Ok(rooms.get(&id).filter(|r| !r.is_deleted).cloned())
    }

    async fn update(&self, room: &Room) -> AppResult<Room> {
        let mut rooms = self.rooms.write();
        if !rooms.contains_key(&room.id) {
            return Err(AppError::RoomNotFound(room.id.to_string()));
        }
        rooms.insert(room.id, room.clone());
        Ok(room.clone())
    }

    async fn count(&self) -> AppResult<i64> {
        let rooms = self.rooms.read();
        Ok(rooms.values().filter(|r| !r.is_deleted).count() as i64)
    }
}

/// In-memory ledger store
#[derive(Default)]
pub struct MemoryLedgerRepository {
    entries: RwLock<HashMap<Uuid, LedgerEntry>>,
}

impl MemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_ledger(entries: &mut [LedgerEntry]) {
    // Matches the SQL ORDER BY billing_month, created_at on the text column
    entries.sort_by(|a, b| {
        (a.billing_month.to_string(), a.created_at)
            .cmp(&(b.billing_month.to_string(), b.created_at))
    });
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LedgerEntry>> {
        let entries = self.entries.read();
        Ok(entries.get(&id).cloned())
    }

    async fn create(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        let mut entries = self.entries.write();
        if entries.contains_key(&entry.id) {
            return Err(AppError::Conflict(format!(
                "Ledger entry {} already exists",
                entry.id
            )));
        }
        entries.insert(entry.id, entry.clone());
        Ok(entry.clone())
    }

    async fn update(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        let mut entries = self.entries.write();
        if !entries.contains_key(&entry.id) {
            return Err(AppError::PaymentNotFound(entry.id.to_string()));
        }
        entries.insert(entry.id, entry.clone());
        Ok(entry.clone())
    }

    async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<LedgerEntry>> {
        let entries = self.entries.read();
        let mut result: Vec<LedgerEntry> = entries
            .values()
            .filter(|e| e.student_id == student_id && !e.is_deleted)
            .cloned()
            .collect();
        sort_ledger(&mut result);
        Ok(result)
    }

    async fn list_for_month(
        &self,
        student_id: Uuid,
        month: BillingMonth,
    ) -> AppResult<Vec<LedgerEntry>> {
        let entries = self.entries.read();
        let mut result: Vec<LedgerEntry> = entries
            .values()
            .filter(|e| e.student_id == student_id && e.billing_month == month && !e.is_deleted)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.created_at);
        Ok(result)
    }

    async fn find_advance_entry(&self, student_id: Uuid) -> AppResult<Option<LedgerEntry>> {
        let entries = self.entries.read();
        let mut candidates: Vec<LedgerEntry> = entries
            .values()
            .filter(|e| {
                e.student_id == student_id
                    && e.billing_month.is_advance()
                    && e.generates_advance()
                    && !e.is_deleted
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|e| e.created_at);
        Ok(candidates.into_iter().next())
    }

    async fn list_all_for_period(&self, period: BillingPeriod) -> AppResult<Vec<LedgerEntry>> {
        let entries = self.entries.read();
        let mut result: Vec<LedgerEntry> = entries
            .values()
            .filter(|e| e.billing_month == BillingMonth::Month(period) && !e.is_deleted)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.created_at);
        Ok(result)
    }
}

/// In-memory advance application store
#[derive(Default)]
pub struct MemoryAdvanceApplicationRepository {
    applications: RwLock<HashMap<Uuid, AdvanceApplication>>,
}

impl MemoryAdvanceApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdvanceApplicationRepository for MemoryAdvanceApplicationRepository {
    async fn create(&self, application: &AdvanceApplication) -> AppResult<AdvanceApplication> {
        let mut applications = self.applications.write();
        let duplicate = applications.values().any(|a| {
            a.student_id == application.student_id
                && a.billing_month == application.billing_month
                && !a.is_deleted
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "Advance already applied to {} for student {}",
                application.billing_month, application.student_id
            )));
        }
        applications.insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn find_active(
        &self,
        student_id: Uuid,
        period: BillingPeriod,
    ) -> AppResult<Option<AdvanceApplication>> {
        let applications = self.applications.read();
        Ok(applications
            .values()
            .find(|a| a.student_id == student_id && a.billing_month == period && !a.is_deleted)
            .cloned())
    }

    async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<AdvanceApplication>> {
        let applications = self.applications.read();
        let mut result: Vec<AdvanceApplication> = applications
            .values()
            .filter(|a| a.student_id == student_id && !a.is_deleted)
            .cloned()
            .collect();
        result.sort_by_key(|a| (a.billing_month, a.created_at));
        Ok(result)
    }

    async fn count_active_by_payment(&self, advance_payment_id: Uuid) -> AppResult<i64> {
        let applications = self.applications.read();
        Ok(applications
            .values()
            .filter(|a| a.advance_payment_id == Some(advance_payment_id) && !a.is_deleted)
            .count() as i64)
    }

    async fn soft_delete_for_student(
        &self,
        student_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut applications = self.applications.write();
        let mut invalidated = 0u64;
        for application in applications.values_mut() {
            if application.student_id == student_id && !application.is_deleted {
                application.is_deleted = true;
                application.deleted_at = Some(deleted_at);
                invalidated += 1;
            }
        }
        Ok(invalidated)
    }
}

/// In-memory deposit transaction store
#[derive(Default)]
pub struct MemoryDepositTransactionRepository {
    transactions: RwLock<HashMap<Uuid, SecurityDepositTransaction>>,
}

impl MemoryDepositTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DepositTransactionRepository for MemoryDepositTransactionRepository {
    async fn create(
        &self,
        transaction: &SecurityDepositTransaction,
    ) -> AppResult<SecurityDepositTransaction> {
        let mut transactions = self.transactions.write();
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction.clone())
    }

    async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> AppResult<Vec<SecurityDepositTransaction>> {
        let transactions = self.transactions.read();
        let mut result: Vec<SecurityDepositTransaction> = transactions
            .values()
            .filter(|t| t.student_id == student_id && !t.is_deleted)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hostel_core::models::{EntryDetail, PaymentMethod};
    use rust_decimal_macros::dec;

    fn sample_student() -> Student {
        Student {
            id: Uuid::new_v4(),
            student_code: "STU25001".to_string(),
            name: "Rahim Uddin".to_string(),
            phone: "01700000000".to_string(),
            guardian_name: None,
            guardian_phone: None,
            room_id: Uuid::new_v4(),
            bed_number: 1,
            joining_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            monthly_rent: dec!(3500),
            security_deposit: dec!(2000),
            union_fee: dec!(100),
            status: StudentStatus::Active,
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn find_by_id_hides_deleted_students() {
        let repo = MemoryStudentRepository::new();
        let mut student = sample_student();
        repo.create(&student).await.unwrap();

        student.is_deleted = true;
        student.deleted_at = Some(Utc::now());
        repo.update(&student).await.unwrap();

        assert!(repo.find_by_id(student.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn advance_entry_lookup_skips_deleted() {
        let repo = MemoryLedgerRepository::new();
        let student_id = Uuid::new_v4();

        let mut entry = LedgerEntry::new(
            student_id,
            BillingMonth::Advance,
            EntryDetail::Advance { amount: dec!(5000) },
            PaymentMethod::Cash,
            None,
            Utc::now(),
        );
        repo.create(&entry).await.unwrap();
        assert!(repo.find_advance_entry(student_id).await.unwrap().is_some());

        entry.is_deleted = true;
        entry.deleted_at = Some(Utc::now());
        repo.update(&entry).await.unwrap();
        assert!(repo.find_advance_entry(student_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_advance_application_rejected() {
        let repo = MemoryAdvanceApplicationRepository::new();
        let student_id = Uuid::new_v4();
        let period = BillingPeriod::new(2025, 3).unwrap();

        let first = AdvanceApplication::new(
            student_id,
            period,
            dec!(1000),
            dec!(3500),
            dec!(500),
            None,
            Utc::now(),
        );
        repo.create(&first).await.unwrap();

        let second = AdvanceApplication::new(
            student_id,
            period,
            dec!(500),
            dec!(2500),
            dec!(0),
            None,
            Utc::now(),
        );
        assert!(repo.create(&second).await.is_err());
        assert!(repo.find_active(student_id, period).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn soft_delete_cascade_counts_rows() {
        let repo = MemoryAdvanceApplicationRepository::new();
        let student_id = Uuid::new_v4();

        for month in 1..=3u32 {
            let application = AdvanceApplication::new(
                student_id,
                BillingPeriod::new(2025, month).unwrap(),
                dec!(1000),
                dec!(3500),
                dec!(0),
                None,
                Utc::now(),
            );
            repo.create(&application).await.unwrap();
        }

        let invalidated = repo
            .soft_delete_for_student(student_id, Utc::now())
            .await
            .unwrap();
        assert_eq!(invalidated, 3);
        assert!(repo.list_for_student(student_id).await.unwrap().is_empty());
    }
}
