//! Admission and reactivation
//!
//! Bed allocation and the student-code sequence. Rent is snapshotted from
//! the bed price at assignment; later room price changes never touch
//! existing students.

use crate::constants::STUDENT_CODE_SEQ_WIDTH;
use crate::engine::ResidentialLedger;
use crate::requests::{AdmitRequest, PaymentRequest, ReactivateRequest};
use chrono::Datelike;
use hostel_core::{
    models::{AuditEvent, EntryType, Room, Student, StudentStatus},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

impl ResidentialLedger {
    /// Admit a new resident: allocate a bed, create the student, record the
    /// admission-day fees
    #[instrument(skip(self, request), fields(room_id = %request.room_id))]
    pub async fn admit_student(&self, request: AdmitRequest) -> AppResult<Student> {
        request.validate()?;
        let now = self.clock.now();

        let (student, bed_name) = {
            let _room_guard = self.locks.acquire(request.room_id).await;
            let mut room = self
                .rooms
                .find_by_id(request.room_id)
                .await?
                .ok_or_else(|| AppError::RoomNotFound(request.room_id.to_string()))?;

            let bed_number = self.resolve_bed(&room, request.bed_name.as_deref(), request.bed_number)?;
            let bed = room
                .bed(bed_number)
                .ok_or_else(|| AppError::InvalidInput(format!("No bed {}", bed_number)))?;
            if bed.is_occupied
                || self
                    .students
                    .find_active_by_bed(room.id, bed_number)
                    .await?
                    .is_some()
            {
                return Err(AppError::BedOccupied {
                    room: room.name.clone(),
                    bed: bed.name.clone(),
                });
            }

            let bed_name = bed.name.clone();
            let monthly_rent = self.snapshot_rent(&room, bed_number, request.monthly_rent);
            let student_code = self.generate_student_code().await?;

            let student = Student {
                id: Uuid::new_v4(),
                student_code,
                name: request.name.clone(),
                phone: request.phone.clone(),
                guardian_name: request.guardian_name.clone(),
                guardian_phone: request.guardian_phone.clone(),
                room_id: room.id,
                bed_number,
                joining_date: request.joining_date,
                monthly_rent,
                security_deposit: Decimal::ZERO,
                union_fee: Decimal::ZERO,
                status: StudentStatus::Active,
                is_deleted: false,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };
            let student = self.students.create(&student).await?;

            if let Some(bed) = room.bed_mut(bed_number) {
                bed.is_occupied = true;
            }
            room.occupied_beds += 1;
            room.refresh_status();
            room.updated_at = now;
            self.rooms.update(&room).await?;

            (student, bed_name)
        };

        info!(
            "Admitted student {} to room {} bed {}",
            student.student_code, request.room_id, bed_name
        );

        // Admission-day fees go through the normal payment path so the
        // balances and the deposit sub-ledger stay consistent.
        if let Some(amount) = request.security_deposit {
            let mut sub = PaymentRequest::fee(student.id, amount, EntryType::Security);
            sub.payment_method = request.payment_method;
            sub.recorded_by = request.recorded_by;
            self.record_payment(sub).await?;
        }
        if let Some(amount) = request.union_fee {
            let mut sub = PaymentRequest::fee(student.id, amount, EntryType::UnionFee);
            sub.payment_method = request.payment_method;
            sub.recorded_by = request.recorded_by;
            self.record_payment(sub).await?;
        }

        self.emit_audit(
            AuditEvent::new(
                "admit_student",
                "Student",
                student.id.to_string(),
                request.recorded_by,
                now,
            )
            .with_after(serde_json::to_value(&student)?),
        )
        .await;
        self.emit_notification(
            "student",
            "Student admitted",
            format!("{} admitted to bed {}", student.name, bed_name),
            None,
        )
        .await;

        self.load_student(student.id).await
    }

    /// Re-admit a student who previously left, allocating a new bed
    #[instrument(skip(self, request))]
    pub async fn reactivate_student(
        &self,
        student_id: Uuid,
        request: ReactivateRequest,
    ) -> AppResult<Student> {
        request.validate()?;
        let _guard = self.locks.acquire(student_id).await;

        let mut student = self.load_student(student_id).await?;
        if student.status != StudentStatus::Left {
            return Err(AppError::NotLeft);
        }

        let now = self.clock.now();
        let monthly_rent = {
            let _room_guard = self.locks.acquire(request.room_id).await;
            let mut room = self
                .rooms
                .find_by_id(request.room_id)
                .await?
                .ok_or_else(|| AppError::RoomNotFound(request.room_id.to_string()))?;

            let bed_number = self.resolve_bed(&room, request.bed_name.as_deref(), request.bed_number)?;
            let bed = room
                .bed(bed_number)
                .ok_or_else(|| AppError::InvalidInput(format!("No bed {}", bed_number)))?;
            if bed.is_occupied
                || self
                    .students
                    .find_active_by_bed(room.id, bed_number)
                    .await?
                    .is_some()
            {
                return Err(AppError::BedOccupied {
                    room: room.name.clone(),
                    bed: bed.name.clone(),
                });
            }

            let monthly_rent = self.snapshot_rent(&room, bed_number, request.monthly_rent);

            if let Some(bed) = room.bed_mut(bed_number) {
                bed.is_occupied = true;
            }
            room.occupied_beds += 1;
            room.refresh_status();
            room.updated_at = now;
            self.rooms.update(&room).await?;

            student.room_id = room.id;
            student.bed_number = bed_number;
            monthly_rent
        };

        student.joining_date = request.joining_date;
        student.monthly_rent = monthly_rent;
        student.status = StudentStatus::Active;
        student.updated_at = now;
        let student = self.students.update(&student).await?;

        info!("Reactivated student {}", student.student_code);

        self.emit_audit(
            AuditEvent::new(
                "reactivate_student",
                "Student",
                student_id.to_string(),
                request.recorded_by,
                now,
            )
            .with_after(serde_json::to_value(&student)?),
        )
        .await;

        Ok(student)
    }

    /// Pick a bed by display name (preferred) or 1-based number
    fn resolve_bed(
        &self,
        room: &Room,
        bed_name: Option<&str>,
        bed_number: Option<u32>,
    ) -> AppResult<u32> {
        if let Some(name) = bed_name {
            return room
                .bed_index_by_name(name)
                .ok_or_else(|| AppError::InvalidInput(format!("No bed named {}", name)));
        }
        if let Some(number) = bed_number {
            if room.bed(number).is_none() {
                return Err(AppError::InvalidInput(format!(
                    "Room {} has no bed {}",
                    room.name, number
                )));
            }
            return Ok(number);
        }
        Err(AppError::MissingField("bed_name or bed_number".to_string()))
    }

    /// Rent snapshot: explicit override, then bed price, then room default
    fn snapshot_rent(&self, room: &Room, bed_number: u32, over: Option<Decimal>) -> Decimal {
        if let Some(rent) = over {
            return rent;
        }
        match room.bed(bed_number) {
            Some(bed) if bed.price > Decimal::ZERO => bed.price,
            _ => room.monthly_rent_per_bed,
        }
    }

    /// Next code in the `<prefix><year><seq>` sequence, e.g. `STU2025007`
    pub(crate) async fn generate_student_code(&self) -> AppResult<String> {
        let prefix = format!(
            "{}{}",
            self.config.student_code_prefix,
            self.clock.today().year()
        );
        let next = self
            .students
            .last_code_with_prefix(&prefix)
            .await?
            .and_then(|code| code[prefix.len()..].parse::<u32>().ok())
            .unwrap_or(0)
            + 1;
        Ok(format!(
            "{}{:0width$}",
            prefix,
            next,
            width = STUDENT_CODE_SEQ_WIDTH
        ))
    }
}
