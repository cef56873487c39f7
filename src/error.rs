use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Invalid {entity}: {message}")]
    Validation { entity: &'static str, message: String },
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),
    #[error("No snapshot was created for dialect {0}")]
    MissingSnapshot(String),
    #[error("Rule set names are not unique: {}", .0.join(", "))]
    DuplicateRuleSet(Vec<String>),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LexError {
    pub(crate) fn validation(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            entity,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LexError>;

// Helper conversions
impl From<rusqlite::Error> for LexError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<::config::ConfigError> for LexError {
    fn from(e: ::config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
