//! Error types for prerender-store.

use thiserror::Error;

/// All errors that can arise from content store calls.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configured store URL could not be turned into an endpoint.
    #[error("invalid store URL: {0}")]
    Url(#[from] url::ParseError),

    /// Connection, TLS or timeout failure before a status was received.
    #[error("store transport error: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    /// The store answered with a status this client does not accept.
    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON shape.
    #[error("failed to decode store response: {0}")]
    Decode(#[source] std::io::Error),
}

impl From<ureq::Error> for StoreError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => StoreError::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => StoreError::Transport(Box::new(transport)),
        }
    }
}
