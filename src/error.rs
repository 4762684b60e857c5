use thiserror::Error;
use url::Url;

/// Errors surfaced by API calls. Each call fails at most once; nothing is
/// retried at this layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("404: not found ({url})")]
    NotFound { url: Url },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid server address: {0}")]
    Address(#[from] url::ParseError),
}

/// A response body that could not be decoded with the selected decoder.
/// When one of these is returned, no partial data accompanies it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed delimited text: {0}")]
    Delimited(#[from] csv::Error),

    #[error("malformed markup: {0}")]
    Markup(String),

    #[error("response body is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
