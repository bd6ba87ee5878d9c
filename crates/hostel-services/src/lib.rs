//! Business logic services for HostelLedger
//!
//! This crate contains the billing ledger engine that orchestrates all
//! residential billing operations: payment recording, due-status
//! calculation with automatic advance application, the security-deposit
//! sub-ledger, checkout settlement, admission, and dashboard aggregates.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - The engine owns its dependencies as `Arc<dyn Trait>` repositories
//! - Every mutating operation serializes per student through a lock registry
//! - Time is read only through the `Clock` trait
//! - All operations are instrumented with tracing
//! - Comprehensive error handling with AppError
//!
//! # Services
//!
//! - `ResidentialLedger` - The billing engine facade
//! - `LockRegistry` - Per-entity async lock handout
//! - `TracingAuditSink` / `TracingNotifier` - Log-only collaborator defaults

pub mod checkout;
pub mod dashboard;
pub mod deposits;
pub mod due_status;
pub mod engine;
pub mod locks;
pub mod notify;
pub mod payments;
pub mod requests;
pub mod students;

pub use checkout::SettlementStatement;
pub use dashboard::{ChartPoint, DashboardStats};
pub use due_status::{DueClassification, DueStatusReport, PeriodDueStatus, PeriodStatus};
pub use engine::{ResidentialLedger, Stores};
pub use locks::LockRegistry;
pub use notify::{NullCoachingLedger, TracingAuditSink, TracingNotifier};
pub use payments::BulkPaymentResult;
pub use requests::{
    AdmitRequest, BulkPaymentRequest, CheckoutRequest, PaymentRequest, ReactivateRequest,
};

/// Business logic constants
pub mod constants {
    /// Digits in the generated student-code sequence suffix
    pub const STUDENT_CODE_SEQ_WIDTH: usize = 3;

    /// Note attached to system-generated zero-paid due rows
    pub const AUTO_DUE_NOTE: &str = "Auto-generated monthly due";

    /// Note attached to ledger rows created by applying the security deposit
    pub const DEPOSIT_APPLIED_NOTE: &str = "Security deposit applied to dues";

    /// Note attached to the refund row written at checkout
    pub const CHECKOUT_REFUND_NOTE: &str = "Checkout settlement refund";
}
