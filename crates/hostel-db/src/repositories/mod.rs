//! Repository implementations backed by PostgreSQL

pub mod advance_repo;
pub mod deposit_repo;
pub mod ledger_repo;
pub mod room_repo;
pub mod student_repo;

pub use advance_repo::PgAdvanceApplicationRepository;
pub use deposit_repo::PgDepositTransactionRepository;
pub use ledger_repo::PgLedgerRepository;
pub use room_repo::PgRoomRepository;
pub use student_repo::PgStudentRepository;
