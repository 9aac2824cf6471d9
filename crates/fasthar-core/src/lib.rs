pub mod analysis;
pub mod error;
pub mod har;
pub mod resource;
pub mod snapshot;

pub use error::{Error, Result};
pub use resource::{ResourceType, StatKey};
pub use snapshot::{Snapshot, SnapshotTag};
