use super::{Number, StatKind, Stats};
use crate::StatKey;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Chart-ready series: one label per snapshot, one row per resource type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartRow>,
}

/// One dataset, serialized as `[key, v1, v2, ...]` with values aligned to
/// the series labels
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub key: StatKey,
    pub values: Vec<f64>,
}

impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len() + 1))?;
        seq.serialize_element(self.key.as_str())?;
        for value in &self.values {
            seq.serialize_element(&Number(*value))?;
        }
        seq.end()
    }
}

/// Pivots a history of per-snapshot stats into chart series
pub struct ChartProjector;

impl ChartProjector {
    /// Project `kind` across `history`.
    ///
    /// Rows whose values sum to zero over the whole history are dropped, so
    /// resource types a site never served stay out of the chart. A type
    /// requested through `filter` is always kept; `exclude` wins over both.
    pub fn project(
        history: &[Stats],
        kind: StatKind,
        filter: Option<StatKey>,
        exclude: Option<StatKey>,
    ) -> ChartSeries {
        let labels = history
            .iter()
            .map(|stats| stats.snapshot_ref.clone().unwrap_or_default())
            .collect();

        let keys: Vec<StatKey> = match filter {
            Some(key) => vec![key],
            None => StatKey::all().collect(),
        };

        let datasets = keys
            .into_iter()
            .filter(|key| Some(*key) != exclude)
            .map(|key| ChartRow {
                key,
                values: history
                    .iter()
                    .map(|stats| stats.breakdown(kind).get(key))
                    .collect(),
            })
            .filter(|row| Some(row.key) == filter || row.values.iter().sum::<f64>() != 0.0)
            .collect::<Vec<_>>();

        tracing::debug!(
            "Projected {} over {} snapshots into {} datasets",
            kind,
            history.len(),
            datasets.len()
        );

        ChartSeries { labels, datasets }
    }
}
