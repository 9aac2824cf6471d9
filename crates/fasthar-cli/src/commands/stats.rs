use crate::{OutputFormat, format_number};
use anyhow::Result;
use fasthar_core::StatKey;
use fasthar_core::Snapshot;
use fasthar_core::analysis::{Stats, StatsAggregator};

/// Stats of every snapshot in `history`, or only of those tagged `snapshot_ref`
pub fn collect_stats(history: &[Snapshot], snapshot_ref: Option<&str>) -> Vec<Stats> {
    history
        .iter()
        .filter(|snapshot| snapshot_ref.is_none() || snapshot.snapshot_ref() == snapshot_ref)
        .map(|snapshot| StatsAggregator::compute(&snapshot.har))
        .collect()
}

pub fn execute(
    store_url: &str,
    url: &str,
    snapshot_ref: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!("Computing stats for {}", url);

    let runtime = super::runtime()?;
    let history = runtime.block_on(super::load_history(store_url, url))?;
    let stats = collect_stats(&history, snapshot_ref);

    match (format, snapshot_ref) {
        (OutputFormat::Json, Some(_)) => match stats.first() {
            Some(single) => println!("{}", serde_json::to_string_pretty(single)?),
            None => println!("{{}}"),
        },
        (OutputFormat::Json, None) => println!("{}", serde_json::to_string_pretty(&stats)?),
        (OutputFormat::Pretty, _) => {
            if let (Some(snapshot_ref), true) = (snapshot_ref, stats.is_empty()) {
                anyhow::bail!("No snapshot of {} is tagged {}", url, snapshot_ref);
            }
            // First match only, as with a ref lookup
            let shown = if snapshot_ref.is_some() { &stats[..1] } else { &stats[..] };
            output_pretty(url, shown);
        }
    }

    Ok(())
}

fn output_pretty(url: &str, stats: &[Stats]) {
    use console::style;

    println!("\n{}", style(format!("Stats for {}", url)).bold().cyan());

    if stats.is_empty() {
        println!("  {}", style("Nothing captured yet").dim());
        return;
    }

    for snapshot in stats {
        println!(
            "\n{}",
            style(snapshot.snapshot_ref.as_deref().unwrap_or("-")).bold()
        );
        println!(
            "  {:<16} {:>10} {:>10} {:>9}",
            style("type").dim(),
            style("bytes").dim(),
            style("ms").dim(),
            style("requests").dim()
        );

        for key in StatKey::all() {
            let count = snapshot.totals.get(key);
            if count == 0.0 && key != StatKey::Total {
                continue;
            }
            let row = format!(
                "  {:<16} {:>10} {:>10} {:>9}",
                key.as_str(),
                format_number(snapshot.sizes.get(key)),
                format_number(snapshot.times.get(key)),
                format_number(count)
            );
            if key == StatKey::Total {
                println!("{}", style(row).bold());
            } else {
                println!("{}", row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasthar_core::har::HarReader;

    fn snapshot(snapshot_ref: &str) -> Snapshot {
        Snapshot::new(
            HarReader::from_str(&format!(
                r#"{{"log":{{"_ref":"{snapshot_ref}","entries":[
                    {{"request":{{"method":"GET","url":"http://example.com/a.css"}},
                      "response":{{"status":200,"bodySize":100,"content":{{"_type":"css"}}}},
                      "timings":{{"wait":5,"receive":1}}}}
                ]}}}}"#
            ))
            .unwrap(),
        )
    }

    #[test]
    fn test_collect_stats_all() {
        let history = vec![snapshot("r1"), snapshot("r2")];

        let stats = collect_stats(&history, None);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[1].snapshot_ref.as_deref(), Some("r2"));
        assert_eq!(stats[0].sizes.get(StatKey::Total), 100.0);
    }

    #[test]
    fn test_collect_stats_by_ref() {
        let history = vec![snapshot("r1"), snapshot("r2")];

        assert_eq!(collect_stats(&history, Some("r2")).len(), 1);
        assert!(collect_stats(&history, Some("r9")).is_empty());
    }
}
