use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for failures that only cost one source its contribution to a run.
    pub fn is_source_level(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::Status { .. }
                | Error::Parse(_)
                | Error::InvalidSelector(_)
                | Error::InvalidUrl(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
