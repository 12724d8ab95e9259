use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("credential error: {0}")]
    Credential(String),
    #[error("backend api error: {0}")]
    Api(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
