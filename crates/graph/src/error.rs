use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("{id} is a {actual}, expected a {expected}")]
    WrongNodeKind {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl GraphError {
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound(id.into())
    }
}
