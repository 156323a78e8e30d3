use thiserror::Error;

/// Failure of the document store itself (file access or YAML syntax).
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors surfaced by the loader, the saver and the store wrappers around them.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] DocumentError),

    #[error("unexpected config structure at `{path}`: expected {expected}")]
    Malformed { path: String, expected: &'static str },

    #[error("route {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("failed to write config: {0}")]
    Write(#[source] DocumentError),
}

/// Coarse classification so callers can tell client mistakes from storage faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    Validation,
    Write,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Read(_) | ConfigError::Malformed { .. } => ErrorKind::Load,
            ConfigError::MissingField { .. } => ErrorKind::Validation,
            ConfigError::Write(_) => ErrorKind::Write,
        }
    }
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_separate_client_and_storage_errors() {
        let missing = ConfigError::MissingField {
            index: 2,
            field: "backend",
        };
        assert_eq!(missing.kind(), ErrorKind::Validation);
        assert_eq!(
            missing.to_string(),
            "route 2 is missing required field `backend`"
        );

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(ConfigError::Write(io.into()).kind(), ErrorKind::Write);

        let malformed = ConfigError::Malformed {
            path: "config.lite.routes".into(),
            expected: "a sequence",
        };
        assert_eq!(malformed.kind(), ErrorKind::Load);
    }
}
