use crate::OutputFormat;
use anyhow::Result;
use async_trait::async_trait;
use fasthar_core::SnapshotTag;
use fasthar_core::har::HarWriter;
use fasthar_server::{CaptureRequest, ServerConfig, Stage, StageListener};
use std::path::Path;

/// Prints each pipeline stage as it starts
struct ProgressPrinter;

#[async_trait]
impl StageListener for ProgressPrinter {
    async fn stage(&self, stage: Stage) {
        match stage {
            Stage::Capturing => println!("📡 Capturing..."),
            Stage::Enriching => println!("🔁 Re-fetching entries..."),
            Stage::Storing => println!("💾 Storing snapshot..."),
        }
    }
}

pub struct CaptureOptions<'a> {
    pub url: &'a str,
    pub delay_ms: Option<u64>,
    pub snapshot_ref: Option<String>,
    pub payload: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub store: bool,
}

pub fn execute(config: &ServerConfig, options: CaptureOptions<'_>, format: OutputFormat) -> Result<()> {
    let url = fasthar_store::page_url(options.url)?;
    tracing::info!("Capturing {}", url);

    let request = CaptureRequest {
        url: url.to_string(),
        delay_ms: options.delay_ms,
        tag: SnapshotTag::new(options.snapshot_ref).with_payload(options.payload),
    };

    // Keep stdout clean for JSON output
    let listener: &dyn StageListener = match format {
        OutputFormat::Pretty => &ProgressPrinter,
        OutputFormat::Json => &(),
    };

    let runtime = super::runtime()?;
    let (snapshot, outcome) = runtime.block_on(async {
        let pipeline = config.build_pipeline().await?;
        let captured = if options.store {
            pipeline.run(&request, listener).await
        } else {
            pipeline.capture_only(&request, listener).await
        };
        pipeline.store().close().await?;
        anyhow::Ok(captured?)
    })?;

    if let Some(output) = options.output {
        HarWriter::to_file(&snapshot.har, output)?;
        tracing::info!("HAR written to {}", output.display());
    }

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "ref": request.tag.snapshot_ref,
                    "entries": outcome.entries,
                    "failedEntries": outcome.failed_entries,
                    "stored": options.store,
                }))?
            );
        }
        OutputFormat::Pretty => {
            println!(
                "✅ Captured {} entries of {} (ref {})",
                outcome.entries, url, request.tag.snapshot_ref
            );
            if outcome.failed_entries > 0 {
                println!(
                    "⚠️  {} entries could not be re-fetched and keep their captured data",
                    outcome.failed_entries
                );
            }
        }
    }

    Ok(())
}
