use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read HAR file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse HAR document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid HAR structure: {0}")]
    InvalidStructure(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unknown statistic: {0} (expected sizes, times or totals)")]
    UnknownStatKind(String),
}

pub type Result<T> = std::result::Result<T, Error>;
