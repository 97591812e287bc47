use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("still rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("error during serde deserialisation: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidArgument(String),

    #[error("could not start the async runtime: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Deserialization(e.to_string())
    }
}
