//! Domain models for the HostelLedger billing engine

pub mod advance;
pub mod audit;
pub mod deposit;
pub mod ledger;
pub mod period;
pub mod room;
pub mod student;

pub use advance::AdvanceApplication;
pub use audit::AuditEvent;
pub use deposit::{DepositTransactionKind, SecurityDepositTransaction};
pub use ledger::{EntryDetail, EntryType, LedgerEntry, PaymentMethod};
pub use period::{BillingMonth, BillingPeriod, ADVANCE_SENTINEL};
pub use room::{Bed, Room, RoomStatus};
pub use student::{Student, StudentStatus};
