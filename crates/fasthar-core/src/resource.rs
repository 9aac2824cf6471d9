use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification bucket for a response, taken from the capture tool's
/// `content._type`. Anything unrecognised is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Audio,
    Css,
    CssImage,
    Doc,
    Flash,
    Font,
    InlineCssImage,
    InlineImage,
    Js,
    Json,
    Other,
    Video,
}

impl ResourceType {
    pub const ALL: [ResourceType; 12] = [
        ResourceType::Audio,
        ResourceType::Css,
        ResourceType::CssImage,
        ResourceType::Doc,
        ResourceType::Flash,
        ResourceType::Font,
        ResourceType::InlineCssImage,
        ResourceType::InlineImage,
        ResourceType::Js,
        ResourceType::Json,
        ResourceType::Other,
        ResourceType::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Audio => "audio",
            ResourceType::Css => "css",
            ResourceType::CssImage => "cssimage",
            ResourceType::Doc => "doc",
            ResourceType::Flash => "flash",
            ResourceType::Font => "font",
            ResourceType::InlineCssImage => "inlinecssimage",
            ResourceType::InlineImage => "inlineimage",
            ResourceType::Js => "js",
            ResourceType::Json => "json",
            ResourceType::Other => "other",
            ResourceType::Video => "video",
        }
    }

    /// Bucket for a raw `content._type` value
    pub fn classify(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok())
            .unwrap_or(ResourceType::Other)
    }

    /// Whether response bodies of this type are kept in stored snapshots.
    /// Binary and unlisted types are stripped.
    pub fn keeps_body(raw: Option<&str>) -> bool {
        matches!(
            raw,
            Some("css") | Some("js") | Some("json") | Some("doc")
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownResourceType(s.to_string()))
    }
}

/// Key of a statistics breakdown: one bucket per resource type plus the
/// aggregate across all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    Type(ResourceType),
    Total,
}

impl StatKey {
    pub const COUNT: usize = ResourceType::ALL.len() + 1;

    /// Every key, resource types first and `total` last
    pub fn all() -> impl Iterator<Item = StatKey> {
        ResourceType::ALL
            .into_iter()
            .map(StatKey::Type)
            .chain(std::iter::once(StatKey::Total))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Type(t) => t.as_str(),
            StatKey::Total => "total",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            StatKey::Type(t) => *t as usize,
            StatKey::Total => ResourceType::ALL.len(),
        }
    }
}

impl From<ResourceType> for StatKey {
    fn from(value: ResourceType) -> Self {
        StatKey::Type(value)
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "total" {
            return Ok(StatKey::Total);
        }
        s.parse().map(StatKey::Type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_and_unknown() {
        assert_eq!(ResourceType::classify(Some("js")), ResourceType::Js);
        assert_eq!(
            ResourceType::classify(Some("inlinecssimage")),
            ResourceType::InlineCssImage
        );
        assert_eq!(ResourceType::classify(Some("png")), ResourceType::Other);
        assert_eq!(ResourceType::classify(Some("total")), ResourceType::Other);
        assert_eq!(ResourceType::classify(None), ResourceType::Other);
    }

    #[test]
    fn test_keeps_body_only_for_text_types() {
        for kept in ["css", "js", "json", "doc"] {
            assert!(ResourceType::keeps_body(Some(kept)), "{kept}");
        }
        for dropped in ["font", "inlineimage", "video", "png", "other"] {
            assert!(!ResourceType::keeps_body(Some(dropped)), "{dropped}");
        }
        assert!(!ResourceType::keeps_body(None));
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for t in ResourceType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_stat_key_indices_are_dense() {
        let indices: Vec<usize> = StatKey::all().map(|k| k.index()).collect();
        assert_eq!(indices, (0..StatKey::COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_stat_key_parse() {
        assert_eq!("total".parse::<StatKey>().unwrap(), StatKey::Total);
        assert_eq!(
            "css".parse::<StatKey>().unwrap(),
            StatKey::Type(ResourceType::Css)
        );
        assert!("png".parse::<StatKey>().is_err());
    }
}
