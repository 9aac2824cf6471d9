use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt snapshot at line {line} of {key}: {source}")]
    Corrupt {
        key: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported store URL: {0}")]
    InvalidUrl(String),

    #[error("url is required")]
    MissingPageUrl,

    #[error("url must be an absolute URL: {0}")]
    InvalidPageUrl(String),

    #[error("Store is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, StoreError>;
