use thiserror::Error;

#[derive(Debug, Error)]
pub enum GopError {
    #[error("HTTP request failed for {operation}: {source}")]
    Http {
        #[source]
        source: reqwest::Error,
        operation: String,
    },
    #[error("API error {code} for {operation}: {message}")]
    Api {
        operation: String,
        code: String,
        message: String,
    },
    #[error("missing credential {0}; set ICBU_{0} or provide a config file")]
    MissingCredential(&'static str),
    #[error(transparent)]
    Config(#[from] ::config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}
