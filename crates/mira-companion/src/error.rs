use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}
