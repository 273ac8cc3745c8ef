use creativestalk_core::error::CoreError;

/// Failures talking to the Record Store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Record Store returned a non-2xx status code.
    #[error("Record Store error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A response body did not match the expected row shape.
    #[error("Malformed Record Store response: {0}")]
    Decode(String),

    /// The store has no such entry point (e.g. no deletion procedure).
    #[error("Not supported by this Record Store: {0}")]
    Unsupported(&'static str),

    /// The store could not be reached.
    #[error("Record Store unavailable: {0}")]
    Unavailable(String),
}

/// Failures talking to the Media Host.
#[derive(Debug, thiserror::Error)]
pub enum MediaHostError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Media Host error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed Media Host response: {0}")]
    Decode(String),

    /// Signed operations need API credentials that are not configured.
    #[error("Media Host credentials missing for {0}")]
    MissingCredentials(&'static str),

    #[error("Media Host unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the fallible Access Layer operations (`add`, uploads).
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The Record Store is not configured; nothing was attempted.
    #[error("Record Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The Media Host is not configured; nothing was attempted.
    #[error("Media Host unavailable: {0}")]
    MediaUnavailable(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Record Store request failed: {0}")]
    Store(#[from] StoreError),

    #[error("Media Host request failed: {0}")]
    Media(#[from] MediaHostError),
}
