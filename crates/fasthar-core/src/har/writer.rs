use super::types::Har;
use crate::Result;
use std::path::Path;

pub struct HarWriter;

impl HarWriter {
    /// Write `har` as indented JSON, ending with a newline
    pub fn to_file(har: &Har, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(har)?;
        json.push('\n');
        std::fs::write(path, json)?;

        tracing::debug!(
            "Wrote {} entries to {}",
            har.log.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Single-line JSON form of `har`
    pub fn to_json(har: &Har) -> Result<String> {
        Ok(serde_json::to_string(har)?)
    }
}
