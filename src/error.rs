use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The request file could not be opened or read. Fatal for the whole run.
    #[error("failed to read request file: {0}")]
    FileReadFailed(#[from] std::io::Error),

    /// A spec could not be turned into a request (bad method, URL or header).
    #[error("failed to build request `{title}`: {reason}")]
    RequestConstructionFailed { title: String, reason: String },

    #[error("request failed: {0}")]
    TransportFailed(#[source] BoxError),

    #[error("failed to read response body: {0}")]
    BodyReadFailed(#[source] BoxError),

    #[error("failed to parse JSON response body: {0}")]
    JsonDecodeFailed(#[from] serde_json::Error),

    /// JSON body was neither an object nor an array.
    #[error("unsupported JSON structure: top-level {0}")]
    UnsupportedJsonShape(&'static str),

    #[error("no requests found in provided file")]
    EmptyBatch,
}
