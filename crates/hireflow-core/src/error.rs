use thiserror::Error;

#[derive(Debug, Error)]
pub enum HireflowError {
    // Graph errors
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Cannot connect {from} -> {to}: {reason}")]
    InvalidConnection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Node is not a criteria node: {0}")]
    NotCriteria(String),

    // Save gate
    #[error("Workflow failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    // Persistence errors
    #[error("Workflow store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(String),

    // Presence errors
    #[error("Presence error: {0}")]
    Presence(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HireflowError {
    pub fn invalid_connection(
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConnection {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HireflowError>;
