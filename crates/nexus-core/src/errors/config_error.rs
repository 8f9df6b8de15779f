/// Configuration loading and validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    ReadFile { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("invalid configuration: {field}: {reason}")]
    Invalid { field: String, reason: String },
}
