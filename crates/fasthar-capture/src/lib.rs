mod error;
mod finder;
mod process;

pub use error::{Error, Result};
pub use finder::CaptureBinaryFinder;
pub use process::{DEFAULT_BINARY, DEFAULT_SCRIPT, ProcessCapture};
