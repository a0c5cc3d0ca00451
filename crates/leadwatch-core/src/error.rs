//! Leadwatch error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeadwatchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LeadwatchError {
    /// Whether the server rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

pub type Result<T> = std::result::Result<T, LeadwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_detection() {
        let err = LeadwatchError::Api {
            status: 401,
            body: "expired".into(),
        };
        assert!(err.is_unauthorized());
        assert!(!LeadwatchError::Http("reset".into()).is_unauthorized());
        assert_eq!(err.to_string(), "API returned 401: expired");
    }
}
