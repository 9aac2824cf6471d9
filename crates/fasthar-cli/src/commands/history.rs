use crate::OutputFormat;
use anyhow::Result;
use fasthar_core::Snapshot;

pub fn execute(
    store_url: &str,
    url: &str,
    snapshot_ref: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!("Reading history of {}", url);

    let runtime = super::runtime()?;
    let history = runtime.block_on(super::load_history(store_url, url))?;

    // A single document is always printed as HAR JSON
    if let Some(snapshot_ref) = snapshot_ref {
        match Snapshot::find(&history, snapshot_ref) {
            Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot.har)?),
            None => match format {
                OutputFormat::Json => println!("{{}}"),
                OutputFormat::Pretty => {
                    anyhow::bail!("No snapshot of {} is tagged {}", url, snapshot_ref)
                }
            },
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let documents: Vec<_> = history.iter().map(|snapshot| &snapshot.har).collect();
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        OutputFormat::Pretty => output_pretty(url, &history),
    }

    Ok(())
}

fn output_pretty(url: &str, history: &[Snapshot]) {
    use console::style;

    println!(
        "\n{}",
        style(format!("History of {} ({} snapshots)", url, history.len()))
            .bold()
            .cyan()
    );

    if history.is_empty() {
        println!("  {}", style("Nothing captured yet").dim());
        return;
    }

    for snapshot in history {
        let log = &snapshot.har.log;
        let mut line = format!(
            "  {:<28} {:>4} entries",
            snapshot.snapshot_ref().unwrap_or("-"),
            log.entries.len()
        );
        if let Some(sha) = &log.sha {
            line.push_str(&format!("  {}", style(sha).yellow()));
        }
        println!("{}", line);
        if log.partial {
            let failed = log
                .entries
                .iter()
                .filter(|entry| entry.enrich_error.is_some())
                .count();
            println!(
                "    {}",
                style(format!("{} entries kept their captured data", failed)).dim()
            );
        }
    }
}
