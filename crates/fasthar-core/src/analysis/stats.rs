use super::{Breakdown, Stats};
use crate::ResourceType;
use crate::har::Har;

/// Reduces one HAR document to per-resource-type size, time and count totals
pub struct StatsAggregator;

impl StatsAggregator {
    pub fn compute(har: &Har) -> Stats {
        let mut sizes = Breakdown::new();
        let mut times = Breakdown::new();
        let mut totals = Breakdown::new();

        for entry in &har.log.entries {
            let Some(response) = &entry.response else {
                continue;
            };
            let Some(content) = &response.content else {
                continue;
            };

            let resource_type = ResourceType::classify(content.resource_type.as_deref());

            // null (unparsable content-length) and -1 (unknown) count as nothing
            let size = response.body_size.unwrap_or(0).max(0) as f64;
            let time = entry.timing("wait").max(0.0) + entry.timing("receive").max(0.0);

            sizes.record(resource_type, size);
            times.record(resource_type, time);
            totals.record(resource_type, 1.0);
        }

        tracing::debug!(
            "Computed stats for {:?}: {} counted entries",
            har.log.snapshot_ref,
            totals.get(crate::StatKey::Total)
        );

        Stats {
            sizes,
            times,
            totals,
            snapshot_ref: har.log.snapshot_ref.clone(),
        }
    }
}
