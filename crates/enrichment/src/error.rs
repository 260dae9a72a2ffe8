use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnrichmentError>;

#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// The oracle could not be reached or gave nothing usable
    #[error("Enrichment unavailable: {0}")]
    Unavailable(String),

    /// The oracle answered, but not with a well-formed payload
    #[error("Malformed enrichment payload: {0}")]
    ParseError(String),

    #[error("Unsupported enrichment provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid enrichment configuration: {0}")]
    InvalidConfig(String),
}

impl EnrichmentError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unavailable(format!("request timed out: {err}"))
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}
