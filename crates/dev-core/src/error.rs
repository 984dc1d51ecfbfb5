use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevError {
    #[error("context module not found: {0}")]
    ModuleNotFound(String),

    #[error("context module already exists: {0}")]
    ModuleExists(String),

    #[error("invalid module identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("group already exists: {0}")]
    GroupExists(String),

    #[error("invalid group name '{0}': must be non-empty without '/', whitespace or '..'")]
    InvalidGroupName(String),

    #[error("invalid priority '{0}': expected critical, high, medium or low")]
    InvalidPriority(String),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl DevError {
    /// True for the "not found" family (missing module or group).
    pub fn is_not_found(&self) -> bool {
        matches!(self, DevError::ModuleNotFound(_) | DevError::GroupNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, DevError>;
