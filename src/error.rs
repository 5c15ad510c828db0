use thiserror::Error;
use uuid::Uuid;

use crate::domain::settlement::SettlementStatus;

/// Crate-wide error type for settlement and collections operations.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("invalid settlement transition {from} -> {to} for {id}")]
    InvalidTransition {
        id: Uuid,
        from: SettlementStatus,
        to: SettlementStatus,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SettlementError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

pub type Result<T> = std::result::Result<T, SettlementError>;
