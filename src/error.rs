//! Error taxonomy for the fetch → decode → score pipeline.
//!
//! None of these escape a scoring call: the pipeline maps every variant to a
//! zero score. They exist so each stage can say precisely what went wrong and
//! so tests can assert on the failure reason.

use thiserror::Error;

/// Errors produced while locating, fetching, decoding, or scoring a document.
#[derive(Debug, Error)]
pub enum RampUpError {
    /// No matching document at any candidate location.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Network, timeout, or HTTP status failure on an individual call.
    #[error("transport error: {0}")]
    Transport(String),

    /// The payload could not be decoded into UTF-8 text.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// The generative backend answered with something other than the expected JSON.
    #[error("backend response error: {0}")]
    BackendResponse(String),

    /// Invalid configuration detected while building a component.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RampUpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RampUpError::Transport(format!("request timed out: {}", err))
        } else {
            RampUpError::Transport(err.to_string())
        }
    }
}

impl From<base64::DecodeError> for RampUpError {
    fn from(err: base64::DecodeError) -> Self {
        RampUpError::Decoding(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for RampUpError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RampUpError::Decoding(format!("invalid UTF-8: {}", err))
    }
}
