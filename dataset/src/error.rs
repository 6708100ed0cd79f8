#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dataset not found")]
    NotFound,
    /// Message extracted from the API's JSON error body, or the per-call
    /// fallback string when the body carried none.
    #[error("{0}")]
    Api(String),
    #[error("Failed to reach the dataset API")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
