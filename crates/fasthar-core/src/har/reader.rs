use super::types::Har;
use crate::{Error, Result};
use std::path::Path;

pub struct HarReader;

impl HarReader {
    pub fn from_file(path: &Path) -> Result<Har> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("Read {} bytes from {}", content.len(), path.display());
        Self::from_str(&content)
    }

    /// Parse a HAR document from text, such as the capture process output.
    /// Surrounding whitespace is ignored.
    pub fn from_str(content: &str) -> Result<Har> {
        let har: Har = serde_json::from_str(content.trim())?;
        tracing::debug!("Parsed HAR document with {} entries", har.log.entries.len());
        Ok(har)
    }

    /// Check that every entry carries enough of its request to be re-fetched
    pub fn validate(har: &Har) -> Result<()> {
        if har.log.entries.is_empty() {
            tracing::warn!("HAR document contains no entries");
        }

        let incomplete = har
            .log
            .entries
            .iter()
            .position(|entry| entry.request.method.is_empty() || entry.request.url.is_empty());

        match incomplete {
            Some(idx) => Err(Error::InvalidStructure(format!(
                "entry {} has no request method or URL",
                idx
            ))),
            None => Ok(()),
        }
    }
}
