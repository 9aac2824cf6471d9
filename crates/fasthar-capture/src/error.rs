use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Capture binary not found: {0}")]
    NotFound(String),

    #[error("Failed to run capture process: {0}")]
    Io(#[from] std::io::Error),

    /// The process ran but did not exit cleanly. The message is the captured
    /// stderr (prefixed `stderr: `) or a generic exit description.
    #[error("{message}")]
    Exited { code: Option<i32>, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
