use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DistError {
    #[error("Invalid template: {reason}")]
    InvalidTemplate { reason: String },

    #[error("Invalid target amount: {amount} (must be > 0)")]
    InvalidTarget { amount: Decimal },

    #[error("Invalid algorithm settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Template '{id}' not found")]
    TemplateNotFound { id: String },

    #[error("Report '{id}' not found")]
    ReportNotFound { id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DistError {
    pub fn invalid_template(reason: impl Into<String>) -> Self {
        Self::InvalidTemplate { reason: reason.into() }
    }

    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidSettings { reason: reason.into() }
    }
}

pub type DistResult<T> = Result<T, DistError>;
