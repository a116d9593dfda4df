use thiserror::Error;

/// Errors from the HTTP layer.
///
/// These cover transport and decoding failures only. HTTP status outcomes
/// (rate limiting, permanent errors) are data, not errors - see
/// [`super::pagination::PageFetch`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, or timeout failure from reqwest.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON array.
    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
