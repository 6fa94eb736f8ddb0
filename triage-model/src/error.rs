//! Error types for the `triage-model` crate.

use thiserror::Error;

/// Errors that can occur while talking to a chat-completion endpoint.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The HTTP request could not be sent or timed out.
    #[error("Request failed ({provider}): {message}")]
    Request {
        /// The provider that was being called.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        /// The provider that produced the error.
        provider: String,
        /// HTTP status code returned by the provider.
        status: u16,
        /// Error body (or the extracted error message) returned by the provider.
        body: String,
    },

    /// The provider answered with a body that is not a chat completion.
    #[error("Response parsing error ({provider}): {message}")]
    Parse {
        /// The provider that produced the response.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The client is misconfigured.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
