use crate::{Error, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Headless browser used to record the trace
pub const DEFAULT_BINARY: &str = "phantomjs";

/// Script handed to the browser; prints the HAR document on stdout
pub const DEFAULT_SCRIPT: &str = "phantomhar.js";

/// Runs the external capture process for one URL.
///
/// The process is invoked as `<binary> <script> <url> [delay_ms]` and both
/// output streams are buffered in full. There is no timeout: a hung process
/// holds the capture until the returned future is dropped, which kills it.
#[derive(Debug, Clone)]
pub struct ProcessCapture {
    binary: PathBuf,
    script: PathBuf,
}

impl ProcessCapture {
    pub fn new(binary: PathBuf, script: PathBuf) -> Self {
        Self { binary, script }
    }

    /// Capture the network trace of `url`, returning the raw HAR text
    pub async fn capture(&self, url: &str, delay_ms: Option<u64>) -> Result<String> {
        let args = self.build_args(url, delay_ms);

        tracing::info!("Capturing {} with {}", url, self.binary.display());

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        tracing::debug!("capture output: {} bytes", stdout.len());
        if !stderr.is_empty() {
            tracing::warn!("capture error output: {}", stderr.trim_end());
        }

        if output.status.success() {
            return Ok(stdout);
        }

        let code = output.status.code();
        let message = if !stderr.is_empty() {
            format!("stderr: {}", stderr.trim_end())
        } else {
            match code {
                Some(code) => format!(
                    "{} {} exited with code {}",
                    self.binary.display(),
                    self.script.display(),
                    code
                ),
                None => format!(
                    "{} {} was terminated by a signal",
                    self.binary.display(),
                    self.script.display()
                ),
            }
        };

        tracing::error!("Capture of {} failed: {}", url, message);
        Err(Error::Exited { code, message })
    }

    /// Build the capture process arguments
    fn build_args(&self, url: &str, delay_ms: Option<u64>) -> Vec<String> {
        let mut args = vec![self.script.display().to_string(), url.to_string()];
        if let Some(delay) = delay_ms {
            args.push(delay.to_string());
        }
        args
    }
}
