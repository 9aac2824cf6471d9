mod chart;
mod stats;

pub use chart::{ChartProjector, ChartRow, ChartSeries};
pub use stats::StatsAggregator;

use crate::resource::StatKey;
use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-snapshot statistics, one breakdown per measured quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Response body bytes
    pub sizes: Breakdown,
    /// Milliseconds spent waiting for and receiving responses
    pub times: Breakdown,
    /// Request counts
    pub totals: Breakdown,
    #[serde(rename = "ref")]
    pub snapshot_ref: Option<String>,
}

impl Stats {
    pub fn breakdown(&self, kind: StatKind) -> &Breakdown {
        match kind {
            StatKind::Sizes => &self.sizes,
            StatKind::Times => &self.times,
            StatKind::Totals => &self.totals,
        }
    }
}

/// A number per resource type plus `total`, serialized as a flat JSON object
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct Breakdown {
    values: [f64; StatKey::COUNT],
}

impl Breakdown {
    pub fn new() -> Self {
        Self {
            values: [0.0; StatKey::COUNT],
        }
    }

    pub fn get(&self, key: impl Into<StatKey>) -> f64 {
        self.values[key.into().index()]
    }

    /// Sum over the resource type buckets, excluding `total`
    pub fn sum_of_types(&self) -> f64 {
        self.values[..StatKey::COUNT - 1].iter().sum()
    }

    /// Add to one resource type bucket and to the total
    pub(crate) fn record(&mut self, key: crate::ResourceType, amount: f64) {
        self.values[StatKey::Type(key).index()] += amount;
        self.values[StatKey::Total.index()] += amount;
    }
}

impl Default for Breakdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(StatKey::COUNT))?;
        for key in StatKey::all() {
            map.serialize_entry(key.as_str(), &Number(self.get(key)))?;
        }
        map.end()
    }
}

impl TryFrom<BTreeMap<String, f64>> for Breakdown {
    type Error = Error;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self> {
        let mut breakdown = Breakdown::new();
        for (name, value) in map {
            let key: StatKey = name.parse()?;
            breakdown.values[key.index()] = value;
        }
        Ok(breakdown)
    }
}

/// Serializes whole values as JSON integers so counts read `3`, not `3.0`
pub(crate) struct Number(pub f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        if self.0.is_finite() && self.0.fract() == 0.0 && self.0.abs() < MAX_EXACT {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

/// Which breakdown of [`Stats`] a chart plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Sizes,
    Times,
    Totals,
}

impl StatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Sizes => "sizes",
            StatKind::Times => "times",
            StatKind::Totals => "totals",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sizes" => Ok(StatKind::Sizes),
            "times" => Ok(StatKind::Times),
            "totals" => Ok(StatKind::Totals),
            other => Err(Error::UnknownStatKind(other.to_string())),
        }
    }
}
