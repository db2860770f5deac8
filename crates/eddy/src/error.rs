#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("link {link} references a missing node: {node}")]
    MissingNode { link: usize, node: String },
    #[error("duplicate node id: {id}")]
    DuplicateNode { id: String },
    #[error("link {link} has an invalid value: {value}")]
    InvalidLinkValue { link: usize, value: f64 },
    #[error("invalid flow csv at line {line}: {message}")]
    Csv { line: usize, message: String },
    #[error("flow graph JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
