use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("enter a debt balance greater than zero")]
    EmptyDebtSet,

    #[error(
        "invalid debt list: {0}; expected a JSON array of {{id, name, balance, rate, minPay}} objects as produced by the debt-list export"
    )]
    ImportFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile store error: {0}")]
    Store(String),

    #[error("profile store is not connected")]
    StoreDisconnected,
}

pub type Result<T> = std::result::Result<T, PlannerError>;
