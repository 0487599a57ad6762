use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadingError {
    #[error("language model API key not set (expected in ${0})")]
    MissingApiKey(String),
    #[error("request to language model failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("language model returned no text")]
    EmptyResponse,
    #[error("history file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("history file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
