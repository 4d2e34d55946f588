//! Error types for the edgequake-playbook library.
//!
//! Only generation and export can fail. The Markdown converter in
//! [`crate::pipeline::markdown`] has no error type at all: malformed input
//! degrades to plain paragraphs instead of aborting the pass.
//!
//! Every variant carries a message that can be shown to an end user as-is,
//! which is exactly what the HTTP API and the CLI do.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-playbook library.
#[derive(Debug, Error)]
pub enum PlaybookError {
    // ── Form errors ───────────────────────────────────────────────────────
    /// One of the required form fields is empty.
    #[error("Missing required fields: company, role, and coreFunction are required")]
    MissingFields,

    /// The form could not be read or decoded.
    #[error("Invalid form: {detail}")]
    InvalidForm { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error (after any configured retries).
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The provider answered but the answer carried no text.
    #[error("No text content in response")]
    EmptyResponse,

    // ── Export errors ─────────────────────────────────────────────────────
    /// The OOXML package could not be assembled.
    #[error("Failed to build DOCX package: {detail}")]
    DocxPackagingFailed { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybookError {
    /// True when the caller sent bad input rather than the system failing.
    ///
    /// The HTTP layer answers these with `400 Bad Request`.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlaybookError::MissingFields | PlaybookError::InvalidForm { .. }
        )
    }
}

impl From<xml::writer::Error> for PlaybookError {
    fn from(e: xml::writer::Error) -> Self {
        PlaybookError::DocxPackagingFailed {
            detail: format!("XML: {e}"),
        }
    }
}

impl From<zip::result::ZipError> for PlaybookError {
    fn from(e: zip::result::ZipError) -> Self {
        PlaybookError::DocxPackagingFailed {
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_display() {
        let msg = PlaybookError::MissingFields.to_string();
        assert!(msg.contains("company, role, and coreFunction"), "got: {msg}");
    }

    #[test]
    fn provider_not_configured_display() {
        let e = PlaybookError::ProviderNotConfigured {
            provider: "anthropic".into(),
            hint: "Set ANTHROPIC_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("anthropic"));
        assert!(msg.contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        let e = PlaybookError::OutputWriteFailed {
            path: PathBuf::from("/nope/Acme-Setter-Playbook.docx"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("Acme-Setter-Playbook.docx"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn client_errors_are_form_errors_only() {
        assert!(PlaybookError::MissingFields.is_client_error());
        assert!(PlaybookError::InvalidForm {
            detail: "bad json".into()
        }
        .is_client_error());
        assert!(!PlaybookError::EmptyResponse.is_client_error());
        assert!(!PlaybookError::LlmApiError {
            message: "overloaded".into()
        }
        .is_client_error());
    }
}
