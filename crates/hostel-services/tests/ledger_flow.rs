//! End-to-end billing flows over the in-memory stores with a pinned clock.

use async_trait::async_trait;
use chrono::NaiveDate;
use hostel_core::{
    config::BillingConfig,
    models::{
        Bed, BillingMonth, BillingPeriod, DepositTransactionKind, EntryType, LedgerEntry,
        PaymentMethod, Room, RoomStatus, StudentStatus,
    },
    traits::{LedgerRepository, RoomRepository},
    AppError, Clock, FixedClock,
};
use hostel_db::memory::{
    MemoryAdvanceApplicationRepository, MemoryDepositTransactionRepository,
    MemoryLedgerRepository, MemoryRoomRepository, MemoryStudentRepository,
};
use hostel_services::{
    AdmitRequest, BulkPaymentRequest, CheckoutRequest, DueClassification, NullCoachingLedger,
    PaymentRequest, PeriodStatus, ResidentialLedger, Stores, TracingAuditSink, TracingNotifier,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

struct TestEnv {
    engine: ResidentialLedger,
    rooms: Arc<MemoryRoomRepository>,
    ledger: Arc<MemoryLedgerRepository>,
    clock: Arc<FixedClock>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn period(y: i32, m: u32) -> BillingPeriod {
    BillingPeriod::new(y, m).unwrap()
}

fn env_at(today: NaiveDate) -> TestEnv {
    let students = Arc::new(MemoryStudentRepository::new());
    let rooms = Arc::new(MemoryRoomRepository::new());
    let ledger = Arc::new(MemoryLedgerRepository::new());
    let advances = Arc::new(MemoryAdvanceApplicationRepository::new());
    let deposits = Arc::new(MemoryDepositTransactionRepository::new());
    let clock = Arc::new(FixedClock::at(today));

    let stores = Stores {
        students,
        rooms: rooms.clone(),
        ledger: ledger.clone(),
        advances,
        deposits,
        audit: Arc::new(TracingAuditSink),
        notifier: Arc::new(TracingNotifier),
        coaching: Arc::new(NullCoachingLedger),
    };

    let engine = ResidentialLedger::new(stores, clock.clone(), BillingConfig::default());
    TestEnv {
        engine,
        rooms,
        ledger,
        clock,
    }
}

/// Ledger store that yields to the scheduler before every access, so two
/// in-flight operations polled by `join!` actually interleave instead of
/// running to completion back to back.
struct YieldingLedger(Arc<MemoryLedgerRepository>);

#[async_trait]
impl LedgerRepository for YieldingLedger {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<LedgerEntry>, AppError> {
        tokio::task::yield_now().await;
        self.0.find_by_id(id).await
    }

    async fn create(&self, entry: &LedgerEntry) -> Result<LedgerEntry, AppError> {
        tokio::task::yield_now().await;
        self.0.create(entry).await
    }

    async fn update(&self, entry: &LedgerEntry) -> Result<LedgerEntry, AppError> {
        tokio::task::yield_now().await;
        self.0.update(entry).await
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<LedgerEntry>, AppError> {
        tokio::task::yield_now().await;
        self.0.list_for_student(student_id).await
    }

    async fn list_for_month(
        &self,
        student_id: Uuid,
        month: BillingMonth,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        tokio::task::yield_now().await;
        self.0.list_for_month(student_id, month).await
    }

    async fn find_advance_entry(&self, student_id: Uuid) -> Result<Option<LedgerEntry>, AppError> {
        tokio::task::yield_now().await;
        self.0.find_advance_entry(student_id).await
    }

    async fn list_all_for_period(
        &self,
        period: BillingPeriod,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        tokio::task::yield_now().await;
        self.0.list_all_for_period(period).await
    }
}

fn yielding_env_at(today: NaiveDate) -> TestEnv {
    let students = Arc::new(MemoryStudentRepository::new());
    let rooms = Arc::new(MemoryRoomRepository::new());
    let ledger = Arc::new(MemoryLedgerRepository::new());
    let advances = Arc::new(MemoryAdvanceApplicationRepository::new());
    let deposits = Arc::new(MemoryDepositTransactionRepository::new());
    let clock = Arc::new(FixedClock::at(today));

    let stores = Stores {
        students,
        rooms: rooms.clone(),
        ledger: Arc::new(YieldingLedger(ledger.clone())),
        advances,
        deposits,
        audit: Arc::new(TracingAuditSink),
        notifier: Arc::new(TracingNotifier),
        coaching: Arc::new(NullCoachingLedger),
    };

    let engine = ResidentialLedger::new(stores, clock.clone(), BillingConfig::default());
    TestEnv {
        engine,
        rooms,
        ledger,
        clock,
    }
}

fn seed_room(env: &TestEnv, beds: u32, price: Decimal) -> Uuid {
    let now = env.clock.now();
    let room = Room {
        id: Uuid::new_v4(),
        name: "101".to_string(),
        floor: "1".to_string(),
        beds: (1..=beds)
            .map(|i| Bed {
                name: format!("Bed {}", i),
                price,
                is_occupied: false,
            })
            .collect(),
        total_beds: beds,
        monthly_rent_per_bed: price,
        occupied_beds: 0,
        status: RoomStatus::Available,
        is_deleted: false,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    let id = room.id;
    env.rooms.insert(room);
    id
}

async fn admit(
    env: &TestEnv,
    room_id: Uuid,
    bed_number: u32,
    joining: NaiveDate,
    deposit: Option<Decimal>,
) -> Uuid {
    let student = env
        .engine
        .admit_student(AdmitRequest {
            name: "Rahim Uddin".to_string(),
            phone: "01700000000".to_string(),
            guardian_name: None,
            guardian_phone: None,
            room_id,
            bed_number: Some(bed_number),
            bed_name: None,
            joining_date: joining,
            monthly_rent: None,
            security_deposit: deposit,
            union_fee: None,
            payment_method: PaymentMethod::Cash,
            recorded_by: None,
        })
        .await
        .unwrap();
    student.id
}

#[tokio::test]
async fn partial_then_full_rent_leaves_two_rows() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 2, dec!(3500));
    let student = admit(&env, room, 1, date(2025, 3, 1), None).await;

    env.engine
        .record_payment(PaymentRequest::rent(student, dec!(2000), None))
        .await
        .unwrap();
    env.engine
        .record_payment(PaymentRequest::rent(student, dec!(1500), None))
        .await
        .unwrap();

    let rows = env.ledger.list_for_student(student).await.unwrap();
    let rent_rows: Vec<_> = rows
        .iter()
        .filter(|e| e.entry_type() == EntryType::Rent)
        .collect();
    assert_eq!(rent_rows.len(), 2, "append style: one row per transaction");

    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.periods.len(), 1);
    assert_eq!(report.periods[0].paid_amount, dec!(3500));
    assert_eq!(report.periods[0].due_amount, dec!(0));
    assert_eq!(report.periods[0].status, PeriodStatus::Paid);
    assert_eq!(report.total_due, dec!(0));
    assert_eq!(report.classification, DueClassification::NoDue);
}

#[tokio::test]
async fn repeated_same_period_payments_never_double_count() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 1, dec!(4000));
    let student = admit(&env, room, 1, date(2025, 3, 1), None).await;

    for _ in 0..4 {
        env.engine
            .record_payment(PaymentRequest::rent(student, dec!(1000), None))
            .await
            .unwrap();
    }

    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.periods[0].paid_amount, dec!(4000));
    assert_eq!(report.periods[0].due_amount, dec!(0));

    // A fifth payment overpays; the surplus becomes credit, not lost money.
    env.engine
        .record_payment(PaymentRequest::rent(student, dec!(500), None))
        .await
        .unwrap();
    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.periods[0].paid_amount, dec!(4500));
    assert_eq!(report.periods[0].advance_amount, dec!(500));
    assert_eq!(report.total_advance, dec!(500));
}

#[tokio::test]
async fn advance_credit_rolls_across_months() {
    let env = env_at(date(2025, 2, 15));
    let room = seed_room(&env, 1, dec!(4000));
    let student = admit(&env, room, 1, date(2025, 1, 5), None).await;

    env.engine
        .record_payment(PaymentRequest::advance(student, dec!(10000)))
        .await
        .unwrap();

    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.periods.len(), 2);
    assert_eq!(report.periods[0].advance_applied, dec!(4000));
    assert_eq!(report.periods[1].advance_applied, dec!(4000));
    assert_eq!(report.total_due, dec!(0));
    assert_eq!(report.total_advance, dec!(2000));
    assert_eq!(report.classification, DueClassification::NoDue);
}

#[tokio::test]
async fn due_status_is_idempotent() {
    let env = env_at(date(2025, 4, 1));
    let room = seed_room(&env, 1, dec!(3000));
    let student = admit(&env, room, 1, date(2025, 1, 10), None).await;

    env.engine
        .record_payment(PaymentRequest::advance(student, dec!(5000)))
        .await
        .unwrap();

    let first = env.engine.due_status(student).await.unwrap();
    let rows_after_first = env.ledger.list_for_student(student).await.unwrap().len();

    let second = env.engine.due_status(student).await.unwrap();
    let rows_after_second = env.ledger.list_for_student(student).await.unwrap().len();

    assert_eq!(first.total_due, second.total_due);
    assert_eq!(first.total_advance, second.total_advance);
    assert_eq!(first.periods.len(), second.periods.len());
    for (a, b) in first.periods.iter().zip(second.periods.iter()) {
        assert_eq!(a.paid_amount, b.paid_amount);
        assert_eq!(a.due_amount, b.due_amount);
        assert_eq!(a.advance_applied, b.advance_applied);
    }
    assert_eq!(rows_after_first, rows_after_second, "no new rows on rerun");
}

#[tokio::test]
async fn report_totals_match_a_direct_ledger_replay() {
    let env = env_at(date(2025, 4, 20));
    let room = seed_room(&env, 1, dec!(3500));
    let student = admit(&env, room, 1, date(2025, 2, 1), None).await;

    env.engine
        .record_payment(PaymentRequest::rent(
            student,
            dec!(3500),
            Some(period(2025, 2)),
        ))
        .await
        .unwrap();
    env.engine
        .record_payment(PaymentRequest::rent(
            student,
            dec!(1200),
            Some(period(2025, 3)),
        ))
        .await
        .unwrap();

    let report = env.engine.due_status(student).await.unwrap();

    // Replay: paid per period straight off the surviving rows.
    let rows = env.ledger.list_for_student(student).await.unwrap();
    for p in &report.periods {
        let replayed: Decimal = rows
            .iter()
            .filter(|e| {
                e.billing_month.period() == Some(p.month) && e.detail.counts_toward_period()
            })
            .map(|e| e.paid_amount())
            .sum();
        assert_eq!(p.paid_amount, replayed, "period {}", p.month);
    }

    let replayed_due: Decimal = report
        .periods
        .iter()
        .map(|p| (p.rent_amount - p.paid_amount - p.advance_applied).max(Decimal::ZERO))
        .sum();
    assert_eq!(report.total_due, replayed_due);
    // 2025-02 paid, 2025-03 partial (2300 due), 2025-04 unpaid (3500 due)
    assert_eq!(report.total_due, dec!(5800));
    assert_eq!(report.consecutive_due_months, 2);
    assert_eq!(report.classification, DueClassification::TwoPlusMonths);
}

#[tokio::test]
async fn deposit_balance_never_goes_negative() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 1, dec!(3500));
    let student = admit(&env, room, 1, date(2025, 3, 1), Some(dec!(2000))).await;

    let result = env
        .engine
        .use_security_deposit_for_dues(student, period(2025, 3), dec!(2500), None)
        .await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientDeposit { .. })
    ));

    env.engine
        .use_security_deposit_for_dues(student, period(2025, 3), dec!(2000), None)
        .await
        .unwrap();
    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.security_deposit, dec!(0));
    assert_eq!(report.periods[0].paid_amount, dec!(2000));

    let transactions = env.engine.deposit_transactions(student).await.unwrap();
    // Admission adjustment plus the use-for-dues movement.
    assert_eq!(transactions.len(), 2);
}

#[tokio::test]
async fn checkout_burns_deposit_and_refunds_the_rest() {
    let env = env_at(date(2025, 3, 25));
    let room = seed_room(&env, 1, dec!(3000));
    let student = admit(&env, room, 1, date(2025, 3, 1), Some(dec!(8000))).await;

    // Current month unpaid: 3000 due.
    let statement = env
        .engine
        .checkout_student(
            student,
            CheckoutRequest {
                use_security_deposit: true,
                refund_amount: None,
                notes: None,
                processed_by: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(statement.deposit_used, dec!(3000));
    assert_eq!(statement.refundable, dec!(5000));
    assert_eq!(statement.refund_amount, dec!(5000));
    assert_eq!(statement.deposit_returned, dec!(5000));
    assert_eq!(statement.advance_returned, dec!(0));
    assert_eq!(
        statement.deposit_used + statement.refund_amount,
        dec!(8000),
        "deposit fully accounted for"
    );

    // Bed freed and room reopened.
    let updated = env.rooms.find_by_id(room).await.unwrap().unwrap();
    assert_eq!(updated.occupied_beds, 0);
    assert!(!updated.beds[0].is_occupied);
}

#[tokio::test]
async fn checkout_rejects_outstanding_dues_and_double_checkout() {
    let env = env_at(date(2025, 3, 25));
    let room = seed_room(&env, 1, dec!(3000));
    let student = admit(&env, room, 1, date(2025, 3, 1), None).await;

    let result = env
        .engine
        .checkout_student(student, CheckoutRequest::default())
        .await;
    assert!(matches!(result, Err(AppError::OutstandingDues { .. })));

    env.engine
        .record_payment(PaymentRequest::rent(student, dec!(3000), None))
        .await
        .unwrap();
    env.engine
        .checkout_student(student, CheckoutRequest::default())
        .await
        .unwrap();

    let again = env
        .engine
        .checkout_student(student, CheckoutRequest::default())
        .await;
    assert!(matches!(again, Err(AppError::AlreadyLeft)));
}

#[tokio::test]
async fn partial_refund_writes_off_the_forfeited_deposit() {
    let env = env_at(date(2025, 3, 25));
    let room = seed_room(&env, 1, dec!(3000));
    let student = admit(&env, room, 1, date(2025, 3, 1), Some(dec!(5000))).await;

    env.engine
        .record_payment(PaymentRequest::rent(student, dec!(3000), None))
        .await
        .unwrap();

    let statement = env
        .engine
        .checkout_student(
            student,
            CheckoutRequest {
                refund_amount: Some(dec!(0)),
                ..CheckoutRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(statement.refundable, dec!(5000));
    assert_eq!(statement.refund_amount, dec!(0));
    assert_eq!(statement.deposit_returned, dec!(0));
    assert_eq!(statement.deposit_forfeited, dec!(5000));

    // The balance went to zero, so the sub-ledger must say where it went.
    let transactions = env.engine.deposit_transactions(student).await.unwrap();
    let write_off = transactions
        .iter()
        .find(|t| t.notes.as_deref() == Some("Deposit forfeited at checkout"))
        .expect("forfeiture transaction recorded");
    assert_eq!(write_off.kind, DepositTransactionKind::Adjustment);
    assert_eq!(write_off.amount, dec!(5000));

    let received: Decimal = transactions
        .iter()
        .filter(|t| t.payment_id.is_some())
        .map(|t| t.amount)
        .sum();
    assert_eq!(received, write_off.amount, "everything received was written off");
}

#[tokio::test]
async fn concurrent_deletes_reverse_a_fee_once() {
    let env = yielding_env_at(date(2025, 3, 10));
    let room = seed_room(&env, 1, dec!(3500));
    let student = admit(&env, room, 1, date(2025, 3, 1), None).await;

    let fee = env
        .engine
        .record_payment(PaymentRequest::fee(
            student,
            dec!(500),
            EntryType::UnionFee,
        ))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        env.engine.delete_payment(fee.id, None),
        env.engine.delete_payment(fee.id, None),
    );

    let outcomes = [first, second];
    assert_eq!(
        outcomes.iter().filter(|r| r.is_ok()).count(),
        1,
        "exactly one deletion wins"
    );
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_)))),
        "the loser sees the entry already deleted"
    );

    let stored = env.ledger.find_by_id(fee.id).await.unwrap().unwrap();
    assert!(stored.is_deleted);
}

#[tokio::test]
async fn deleting_advance_credit_reverses_its_applications() {
    let env = env_at(date(2025, 2, 10));
    let room = seed_room(&env, 1, dec!(4000));
    let student = admit(&env, room, 1, date(2025, 1, 1), None).await;

    let advance = env
        .engine
        .record_payment(PaymentRequest::advance(student, dec!(8000)))
        .await
        .unwrap();

    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.total_due, dec!(0));

    // Targeted sentinel deletion refuses while applications reference it.
    let strict = env.engine.delete_advance_payment(student, None).await;
    assert!(matches!(strict, Err(AppError::AdvanceInUse(2))));

    // delete_payment cascades instead.
    env.engine.delete_payment(advance.id, None).await.unwrap();

    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.total_due, dec!(8000), "dues resurface once credit is gone");
    assert_eq!(report.total_advance, dec!(0));
}

#[tokio::test]
async fn restore_payment_rebuilds_the_credit() {
    let env = env_at(date(2025, 2, 10));
    let room = seed_room(&env, 1, dec!(4000));
    let student = admit(&env, room, 1, date(2025, 1, 1), None).await;

    let advance = env
        .engine
        .record_payment(PaymentRequest::advance(student, dec!(8000)))
        .await
        .unwrap();
    env.engine.due_status(student).await.unwrap();
    env.engine.delete_payment(advance.id, None).await.unwrap();

    env.engine.restore_payment(advance.id, None).await.unwrap();
    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.total_due, dec!(0));
    assert_eq!(report.total_advance, dec!(0));
}

#[tokio::test]
async fn rent_before_joining_month_is_rejected() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 1, dec!(3500));
    let student = admit(&env, room, 1, date(2025, 3, 1), None).await;

    let result = env
        .engine
        .record_payment(PaymentRequest::rent(
            student,
            dec!(1000),
            Some(period(2025, 2)),
        ))
        .await;
    assert!(matches!(result, Err(AppError::MonthBeforeJoining { .. })));
}

#[tokio::test]
async fn bulk_payment_records_each_component() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 1, dec!(3500));
    let student = admit(&env, room, 1, date(2025, 3, 1), None).await;

    let result = env
        .engine
        .record_bulk_payment(BulkPaymentRequest {
            student_id: student,
            rent_amount: Some(dec!(3500)),
            security_amount: Some(dec!(2000)),
            union_fee_amount: Some(dec!(100)),
            other_amount: None,
            billing_month: None,
            payment_method: PaymentMethod::Bkash,
            transaction_id: Some("TX123".to_string()),
            notes: None,
            recorded_by: None,
        })
        .await
        .unwrap();

    assert_eq!(result.count, 3);
    let types: Vec<_> = result.entries.iter().map(|e| e.entry_type()).collect();
    assert_eq!(
        types,
        vec![EntryType::Rent, EntryType::Security, EntryType::UnionFee]
    );

    let report = env.engine.due_status(student).await.unwrap();
    assert_eq!(report.total_due, dec!(0));
    assert_eq!(report.security_deposit, dec!(2000));
}

#[tokio::test]
async fn admission_allocates_beds_and_sequences_codes() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 2, dec!(3500));

    let first = admit(&env, room, 1, date(2025, 3, 1), None).await;
    let second = env
        .engine
        .admit_student(AdmitRequest {
            name: "Karim".to_string(),
            phone: "01800000000".to_string(),
            guardian_name: None,
            guardian_phone: None,
            room_id: room,
            bed_number: None,
            bed_name: Some("Bed 2".to_string()),
            joining_date: date(2025, 3, 5),
            monthly_rent: None,
            security_deposit: None,
            union_fee: None,
            payment_method: PaymentMethod::Cash,
            recorded_by: None,
        })
        .await
        .unwrap();

    let first_report = env.engine.due_status(first).await.unwrap();
    assert_eq!(first_report.student_code, "STU2025001");
    assert_eq!(second.student_code, "STU2025002");
    assert_eq!(second.monthly_rent, dec!(3500));

    // Both beds taken now.
    let occupied = env
        .engine
        .admit_student(AdmitRequest {
            name: "Late Comer".to_string(),
            phone: "01900000000".to_string(),
            guardian_name: None,
            guardian_phone: None,
            room_id: room,
            bed_number: Some(2),
            bed_name: None,
            joining_date: date(2025, 3, 6),
            monthly_rent: None,
            security_deposit: None,
            union_fee: None,
            payment_method: PaymentMethod::Cash,
            recorded_by: None,
        })
        .await;
    assert!(matches!(occupied, Err(AppError::BedOccupied { .. })));
}

#[tokio::test]
async fn reactivation_requires_left_status() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 2, dec!(3500));
    let student = admit(&env, room, 1, date(2025, 3, 1), None).await;

    let result = env
        .engine
        .reactivate_student(
            student,
            hostel_services::ReactivateRequest {
                room_id: room,
                bed_number: Some(2),
                bed_name: None,
                joining_date: date(2025, 4, 1),
                monthly_rent: None,
                recorded_by: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotLeft)));

    env.engine
        .record_payment(PaymentRequest::rent(student, dec!(3500), None))
        .await
        .unwrap();
    env.engine
        .checkout_student(student, CheckoutRequest::default())
        .await
        .unwrap();

    env.clock.set(date(2025, 4, 2));
    let reactivated = env
        .engine
        .reactivate_student(
            student,
            hostel_services::ReactivateRequest {
                room_id: room,
                bed_number: Some(2),
                bed_name: None,
                joining_date: date(2025, 4, 1),
                monthly_rent: None,
                recorded_by: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(reactivated.status, StudentStatus::Active);
    assert_eq!(reactivated.bed_number, 2);
    assert_eq!(reactivated.joining_date, date(2025, 4, 1));
}

#[tokio::test]
async fn monthly_job_materializes_missing_dues_once() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 2, dec!(3500));
    let a = admit(&env, room, 1, date(2025, 3, 1), None).await;
    let b = admit(&env, room, 2, date(2025, 3, 1), None).await;

    env.engine
        .record_payment(PaymentRequest::rent(a, dec!(3500), None))
        .await
        .unwrap();

    let created = env.engine.materialize_monthly_dues().await.unwrap();
    assert_eq!(created, 1, "only the unpaid student gets a due row");

    let again = env.engine.materialize_monthly_dues().await.unwrap();
    assert_eq!(again, 0);

    let report = env.engine.due_status(b).await.unwrap();
    assert_eq!(report.total_due, dec!(3500));
}

#[tokio::test]
async fn dashboard_aggregates_rooms_students_and_dues() {
    let env = env_at(date(2025, 3, 10));
    let room = seed_room(&env, 2, dec!(3000));
    let a = admit(&env, room, 1, date(2025, 2, 1), None).await;
    let _b = admit(&env, room, 2, date(2025, 3, 1), None).await;

    env.engine
        .record_payment(PaymentRequest::rent(a, dec!(3000), Some(period(2025, 2))))
        .await
        .unwrap();

    let stats = env.engine.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_rooms, 1);
    assert_eq!(stats.active_students, 2);
    // a owes 2025-03, b owes 2025-03.
    assert_eq!(stats.residential_due, dec!(6000));
    assert_eq!(stats.coaching_due, dec!(0));
    assert_eq!(stats.total_due, dec!(6000));

    let chart = env.engine.monthly_chart(3).await.unwrap();
    assert_eq!(chart.len(), 3);
    assert_eq!(chart[2].month, period(2025, 3));
    assert_eq!(chart[1].collection, dec!(3000), "February payment");
}
