use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every field the pipeline does not read or write. Kept verbatim (HAR 1.2
/// fields such as `creator`, `pages` or `cache` included) so a document
/// survives a parse/serialize cycle unchanged.
pub type Extensions = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Har {
    pub log: Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Snapshot identifier assigned when the capture was stored
    #[serde(rename = "_ref", default, skip_serializing_if = "Option::is_none")]
    pub snapshot_ref: Option<String>,
    /// Commit sha from the webhook that triggered the capture
    #[serde(rename = "_sha", default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Repository URL from the webhook that triggered the capture
    #[serde(rename = "_repo", default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Set when at least one entry could not be re-fetched
    #[serde(rename = "_partial", default, skip_serializing_if = "is_false")]
    pub partial: bool,
    #[serde(flatten)]
    pub extensions: Extensions,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One request/response pair. Its position in [`Log::entries`] is its
/// identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub request: Request,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timings: Option<Timings>,
    /// Why the live re-fetch of this entry failed, if it did
    #[serde(rename = "_enrichError", default, skip_serializing_if = "Option::is_none")]
    pub enrich_error: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Entry {
    /// Duration of a timing phase, 0 when the entry has no timings
    pub fn timing(&self, phase: &str) -> f64 {
        self.timings.as_ref().map_or(0.0, |timings| timings.phase(phase))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// `None` when the status is absent or `null`, serialized back as `null`
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// `None` serializes as `null`: the live content-length was missing or
    /// not a number.
    #[serde(rename = "bodySize", default)]
    pub body_size: Option<i64>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Response {
    /// Response with nothing known about it yet
    pub fn blank() -> Self {
        Self {
            status: None,
            content: None,
            body_size: None,
            extensions: Extensions::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Resource classification written by the capture tool (`js`, `css`, ...)
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Phase durations in milliseconds, kept exactly as captured. HAR uses -1
/// for a phase that does not apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timings(pub Extensions);

impl Timings {
    /// Duration of `phase` (`wait`, `receive`, ...), 0 when absent
    pub fn phase(&self, phase: &str) -> f64 {
        self.0.get(phase).and_then(Value::as_f64).unwrap_or(0.0)
    }
}
