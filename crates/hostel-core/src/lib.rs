//! HostelLedger Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the HostelLedger billing engine. It includes:
//!
//! - Domain models (Student, Room, LedgerEntry, etc.)
//! - Billing-period arithmetic and the clock abstraction
//! - Common traits for repositories and external collaborators
//! - Unified error handling
//! - Application configuration

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
