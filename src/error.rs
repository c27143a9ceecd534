use std::error::Error as StdError;

use thiserror::Error;

/// Lyrify's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Lyrify's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
///
/// Note that malformed caption blocks are *not* represented here: the parser in
/// [`crate::captions`] absorbs them and degrades to a partial result instead of erroring.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration, caught at construction time.
    #[error("{0}")]
    Config(String),

    /// The caller supplied no audio at all.
    #[error("no audio supplied")]
    MissingAudio,

    /// The supplied audio exceeds the configured upper bound.
    ///
    /// Raised before the generation client is ever invoked.
    #[error("audio is {size} bytes, which exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The generation client could not produce subtitles.
    ///
    /// Transport failures and service-side rejections both land here; the message is
    /// whatever the upstream reported. Never retried.
    #[error("lyric generation failed: {0}")]
    Generation(String),

    /// A cache lookup missed (expired, never created, or a wrong key).
    #[error("subtitles not found")]
    NotFound,

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
