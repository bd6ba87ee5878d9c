//! HostelLedger database layer
//!
//! PostgreSQL-backed repositories implementing the storage traits from
//! `hostel-core`, plus in-memory implementations of the same traits for
//! tests and embedded use.

pub mod memory;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_pool_with_options};
pub use repositories::{
    PgAdvanceApplicationRepository, PgDepositTransactionRepository, PgLedgerRepository,
    PgRoomRepository, PgStudentRepository,
};
