//! The module contains the error the engine can throw.
//!
//! The errors fall in four families:
//!
//! - input errors: [`Validation`] and [`InvalidCursor`], detected before any
//!   write happens.
//! - lookups: [`NotFound`] and [`ExistingKey`].
//! - business rules: [`InsufficientStock`], [`Overpayment`],
//!   [`ReturnExceeded`] and [`BusinessRule`], detected mid-transaction. They
//!   still roll the whole unit of work back.
//! - storage: [`Sequence`] and [`Database`].
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidCursor`]: EngineError::InvalidCursor
//!  [`NotFound`]: EngineError::NotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`Overpayment`]: EngineError::Overpayment
//!  [`ReturnExceeded`]: EngineError::ReturnExceeded
//!  [`BusinessRule`]: EngineError::BusinessRule
//!  [`Sequence`]: EngineError::Sequence
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Insufficient stock for {product}. Available: {available}")]
    InsufficientStock { product: String, available: i64 },
    #[error("{0}")]
    Overpayment(String),
    #[error("{0}")]
    ReturnExceeded(String),
    #[error("{0}")]
    BusinessRule(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Failed to generate {0} number")]
    Sequence(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (
                Self::InsufficientStock {
                    product: a,
                    available: x,
                },
                Self::InsufficientStock {
                    product: b,
                    available: y,
                },
            ) => a == b && x == y,
            (Self::Overpayment(a), Self::Overpayment(b)) => a == b,
            (Self::ReturnExceeded(a), Self::ReturnExceeded(b)) => a == b,
            (Self::BusinessRule(a), Self::BusinessRule(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
