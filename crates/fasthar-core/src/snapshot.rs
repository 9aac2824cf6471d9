use crate::har::Har;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One captured-and-enriched HAR document as it is kept in history.
///
/// The stored form wraps the document as `{"har": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub har: Har,
}

impl Snapshot {
    pub fn new(har: Har) -> Self {
        Self { har }
    }

    pub fn snapshot_ref(&self) -> Option<&str> {
        self.har.log.snapshot_ref.as_deref()
    }

    /// First snapshot in `history` tagged with `snapshot_ref`.
    ///
    /// Refs are not unique; later duplicates are shadowed by the first.
    pub fn find<'a>(history: &'a [Snapshot], snapshot_ref: &str) -> Option<&'a Snapshot> {
        history
            .iter()
            .find(|snapshot| snapshot.snapshot_ref() == Some(snapshot_ref))
    }
}

/// Metadata stamped onto a captured document before it is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTag {
    #[serde(rename = "ref")]
    pub snapshot_ref: String,
    pub sha: Option<String>,
    #[serde(rename = "repoUrl")]
    pub repo_url: Option<String>,
}

impl SnapshotTag {
    /// Tag with the given ref, or the current UTC time when none is given
    pub fn new(snapshot_ref: Option<String>) -> Self {
        Self {
            snapshot_ref: snapshot_ref
                .filter(|r| !r.is_empty())
                .unwrap_or_else(timestamp_ref),
            sha: None,
            repo_url: None,
        }
    }

    /// Pick up the commit sha and repository URL from a push webhook body.
    ///
    /// Both must be present; anything unparsable leaves the tag unchanged.
    pub fn with_payload(mut self, payload: Option<&str>) -> Self {
        let Some(raw) = payload else {
            return self;
        };

        match serde_json::from_str::<WebhookPayload>(raw) {
            Ok(WebhookPayload {
                after: Some(sha),
                repository: Some(Repository { url: Some(url) }),
            }) if !sha.is_empty() && !url.is_empty() => {
                self.sha = Some(sha);
                self.repo_url = Some(url);
            }
            Ok(_) => tracing::debug!("Webhook payload has no commit sha or repository url"),
            Err(e) => tracing::debug!("Ignoring unparsable webhook payload: {}", e),
        }

        self
    }

    pub fn apply(&self, har: &mut Har) {
        har.log.snapshot_ref = Some(self.snapshot_ref.clone());
        har.log.sha = self.sha.clone();
        har.log.repo = self.repo_url.clone();
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`
pub fn timestamp_ref() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    after: Option<String>,
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::har::HarReader;

    fn har() -> Har {
        HarReader::from_str(r#"{"log":{"version":"1.2","entries":[]}}"#).unwrap()
    }

    #[test]
    fn test_default_ref_is_timestamp() {
        let tag = SnapshotTag::new(None);

        assert!(chrono::DateTime::parse_from_rfc3339(&tag.snapshot_ref).is_ok());
        assert!(tag.snapshot_ref.ends_with('Z'));
        assert_eq!(SnapshotTag::new(Some(String::new())).snapshot_ref.len(), 24);
    }

    #[test]
    fn test_payload_sets_sha_and_repo() {
        let payload = r#"{"after":"badc0ffee","repository":{"url":"https://github.com/a/b"}}"#;

        let tag = SnapshotTag::new(Some("r1".into())).with_payload(Some(payload));

        assert_eq!(tag.snapshot_ref, "r1");
        assert_eq!(tag.sha.as_deref(), Some("badc0ffee"));
        assert_eq!(tag.repo_url.as_deref(), Some("https://github.com/a/b"));
    }

    #[test]
    fn test_incomplete_or_invalid_payload_is_ignored() {
        for payload in [
            r#"{"after":"badc0ffee"}"#,
            r#"{"repository":{"url":"https://github.com/a/b"}}"#,
            "not json",
        ] {
            let tag = SnapshotTag::new(Some("r1".into())).with_payload(Some(payload));
            assert_eq!(tag.sha, None, "{payload}");
            assert_eq!(tag.repo_url, None, "{payload}");
        }
    }

    #[test]
    fn test_apply_writes_log_extensions() {
        let mut har = har();
        let tag = SnapshotTag {
            snapshot_ref: "r1".into(),
            sha: Some("abc".into()),
            repo_url: Some("https://example.com/repo".into()),
        };

        tag.apply(&mut har);

        let json = serde_json::to_value(&har).unwrap();
        assert_eq!(json["log"]["_ref"], "r1");
        assert_eq!(json["log"]["_sha"], "abc");
        assert_eq!(json["log"]["_repo"], "https://example.com/repo");
    }

    #[test]
    fn test_find_returns_first_match() {
        let mut first = har();
        first.log.snapshot_ref = Some("dup".into());
        first.log.version = Some("first".into());
        let mut second = har();
        second.log.snapshot_ref = Some("dup".into());
        second.log.version = Some("second".into());

        let history = vec![Snapshot::new(first), Snapshot::new(second)];

        let found = Snapshot::find(&history, "dup").unwrap();
        assert_eq!(found.har.log.version.as_deref(), Some("first"));
        assert!(Snapshot::find(&history, "missing").is_none());
    }
}
