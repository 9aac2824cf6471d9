use super::stats::collect_stats;
use crate::{OutputFormat, format_number};
use anyhow::Result;
use fasthar_core::StatKey;
use fasthar_core::analysis::{ChartProjector, ChartSeries, StatKind};

pub struct ChartOptions<'a> {
    pub kind: StatKind,
    pub url: &'a str,
    pub snapshot_ref: Option<&'a str>,
    pub resource: Option<StatKey>,
    pub exclude: Option<StatKey>,
}

pub fn execute(store_url: &str, options: ChartOptions<'_>, format: OutputFormat) -> Result<()> {
    tracing::info!("Charting {} for {}", options.kind, options.url);

    let runtime = super::runtime()?;
    let history = runtime.block_on(super::load_history(store_url, options.url))?;
    let stats = collect_stats(&history, options.snapshot_ref);
    let series = ChartProjector::project(&stats, options.kind, options.resource, options.exclude);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
        OutputFormat::Pretty => output_pretty(&options, &series),
    }

    Ok(())
}

fn output_pretty(options: &ChartOptions<'_>, series: &ChartSeries) {
    use console::style;

    println!(
        "\n{}",
        style(format!("{} of {}", options.kind, options.url)).bold().cyan()
    );

    if series.labels.is_empty() {
        println!("  {}", style("Nothing captured yet").dim());
        return;
    }

    let mut header = format!("  {:<16}", "");
    for label in &series.labels {
        header.push_str(&format!(" {:>12}", truncate(label, 12)));
    }
    println!("{}", style(header).dim());

    for row in &series.datasets {
        let mut line = format!("  {:<16}", row.key.as_str());
        for value in &row.values {
            line.push_str(&format!(" {:>12}", format_number(*value)));
        }
        println!("{}", line);
    }
}

/// Last `width` characters of `label`
fn truncate(label: &str, width: usize) -> &str {
    let count = label.chars().count();
    if count <= width {
        return label;
    }
    let skip = label
        .char_indices()
        .nth(count - width)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &label[skip..]
}
