use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Error, Debug)]
pub enum SchemaError {
    /// A query operation ran before any schema was loaded
    #[error("No schema loaded")]
    NotLoaded,

    /// SDL text is not a valid schema
    #[error("Schema parse error: {0}")]
    ParseError(String),

    #[error("Cannot read schema file {path}: {source}")]
    FileAccessError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
