//! Unified error handling for HostelLedger
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the billing engine, with a stable error-code and
//! HTTP-status mapping for the outer API layer to consume.

use thiserror::Error;

/// Main application error type
///
/// All errors in the billing engine should be converted to this type.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Business Logic Errors ====================
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Bed {bed} in room {room} is already occupied")]
    BedOccupied { room: String, bed: String },

    #[error("Billing month {month} precedes joining month {joined}")]
    MonthBeforeJoining { month: String, joined: String },

    #[error("Insufficient security deposit: available {available}, requested {requested}")]
    InsufficientDeposit {
        available: String,
        requested: String,
    },

    #[error("Refund {requested} exceeds refundable balance {refundable}")]
    RefundExceedsBalance {
        refundable: String,
        requested: String,
    },

    #[error("Cannot checkout with outstanding dues: {remaining}")]
    OutstandingDues { remaining: String },

    #[error("Student has already left")]
    AlreadyLeft,

    #[error("Only left students can be reactivated")]
    NotLeft,

    #[error("Advance credit has been applied to {0} month(s); reverse the applications first")]
    AdvanceInUse(usize),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code the outer API layer should map this error to
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::MissingField(_)
            | AppError::MonthBeforeJoining { .. }
            | AppError::InsufficientDeposit { .. }
            | AppError::RefundExceedsBalance { .. }
            | AppError::OutstandingDues { .. }
            | AppError::AlreadyLeft
            | AppError::NotLeft
            | AppError::AdvanceInUse(_) => 400,

            // 404 Not Found
            AppError::StudentNotFound(_)
            | AppError::RoomNotFound(_)
            | AppError::PaymentNotFound(_)
            | AppError::NotFound(_) => 404,

            // 409 Conflict
            AppError::BedOccupied { .. } | AppError::Conflict(_) => 409,

            // 500 Internal Server Error
            _ => 500,
        }
    }

    /// Returns the stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::StudentNotFound(_) => "student_not_found",
            AppError::RoomNotFound(_) => "room_not_found",
            AppError::PaymentNotFound(_) => "payment_not_found",
            AppError::BedOccupied { .. } => "bed_occupied",
            AppError::MonthBeforeJoining { .. } => "month_before_joining",
            AppError::InsufficientDeposit { .. } => "insufficient_deposit",
            AppError::RefundExceedsBalance { .. } => "refund_exceeds_balance",
            AppError::OutstandingDues { .. } => "outstanding_dues",
            AppError::AlreadyLeft => "already_left",
            AppError::NotLeft => "not_left",
            AppError::AdvanceInUse(_) => "advance_in_use",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MissingField(_) => "missing_field",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::StudentNotFound("abc".to_string()).status_code(),
            404
        );
        assert_eq!(
            AppError::InsufficientDeposit {
                available: "5000".to_string(),
                requested: "8000".to_string(),
            }
            .status_code(),
            400
        );
        assert_eq!(
            AppError::BedOccupied {
                room: "101".to_string(),
                bed: "Bed 2".to_string(),
            }
            .status_code(),
            409
        );
        assert_eq!(AppError::Database("boom".to_string()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::OutstandingDues {
                remaining: "3000".to_string()
            }
            .error_code(),
            "outstanding_dues"
        );
        assert_eq!(AppError::NotLeft.error_code(), "not_left");
    }
}
