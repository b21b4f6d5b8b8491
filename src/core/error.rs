//! Pipeline Error Types
//!
//! One variant per failure a caller may want to tell apart. The
//! credential-missing case in particular is matched structurally by the CLI
//! to point the user at settings instead of printing a generic failure.

use thiserror::Error;

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Gemini API credential is missing. Add an API key in settings or set GEMINI_API_KEY.")]
    CredentialMissing,

    #[error("{source_type} source is missing required field '{field}'")]
    MissingField {
        source_type: &'static str,
        field: &'static str,
    },

    #[error("Unsupported data source type: {0}")]
    UnsupportedSource(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No response from AI")]
    EmptyResponse,

    #[error("AI response was not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Report generation was cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn is_credential_missing(&self) -> bool {
        matches!(self, ReportError::CredentialMissing)
    }

    /// Configuration and input errors are detected before any external call
    /// and are actionable by the user.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ReportError::CredentialMissing
                | ReportError::MissingField { .. }
                | ReportError::UnsupportedSource(_)
                | ReportError::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_missing_message_keeps_legacy_substring() {
        let err = ReportError::CredentialMissing;
        assert!(err.is_credential_missing());
        assert!(err.to_string().contains("credential is missing"));
    }

    #[test]
    fn test_unsupported_source_names_offending_type() {
        let err = ReportError::UnsupportedSource("graphql".to_string());
        assert!(err.to_string().contains("graphql"));
        assert!(err.is_user_actionable());
    }

    #[test]
    fn test_external_errors_are_not_user_actionable() {
        assert!(!ReportError::EmptyResponse.is_user_actionable());
        assert!(!ReportError::Cancelled.is_user_actionable());
    }
}
