//! Reflector verdicts.
//!
//! A verdict is the Reflector's diagnosis of one trajectory plus a tag per
//! playbook entry it judged. Parsing is lenient: the JSON object is pulled out
//! of whatever prose surrounds it, and tags that are malformed are dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors raised while parsing a verdict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerdictError {
    /// The text contains no JSON object.
    #[error("no JSON object found in reflector output")]
    NoJson,

    /// The JSON object could not be parsed.
    #[error("invalid reflector JSON: {0}")]
    InvalidJson(String),

    /// A tag string is not one of helpful, harmful or neutral.
    #[error("unknown entry tag: {0}")]
    UnknownTag(String),
}

/// Result type for verdict parsing.
pub type Result<T> = std::result::Result<T, VerdictError>;

/// Judgement of a single playbook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    /// The entry helped.
    Helpful,
    /// The entry misled.
    Harmful,
    /// No effect; never changes counters.
    Neutral,
}

impl FromStr for EntryTag {
    type Err = VerdictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "helpful" => Ok(Self::Helpful),
            "harmful" => Ok(Self::Harmful),
            "neutral" => Ok(Self::Neutral),
            other => Err(VerdictError::UnknownTag(other.to_string())),
        }
    }
}

impl fmt::Display for EntryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Helpful => write!(f, "helpful"),
            Self::Harmful => write!(f, "harmful"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// An `(entry id, tag)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletTag {
    /// Entry id as rendered in the playbook.
    pub id: String,
    /// The judgement.
    pub tag: EntryTag,
}

impl BulletTag {
    /// Creates a tag pair.
    pub fn new(id: impl Into<String>, tag: EntryTag) -> Self {
        Self { id: id.into(), tag }
    }
}

/// The Reflector's output for one episode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Chain of reasoning.
    #[serde(default)]
    pub reasoning: String,
    /// What went wrong.
    #[serde(default)]
    pub error_identification: String,
    /// Why it went wrong.
    #[serde(default)]
    pub root_cause_analysis: String,
    /// What should have been done.
    #[serde(default)]
    pub correct_approach: String,
    /// What to remember next time.
    #[serde(default)]
    pub key_insight: String,
    /// Per-entry judgements.
    #[serde(default)]
    pub bullet_tags: Vec<BulletTag>,
    /// The unparsed reflector output.
    #[serde(default, skip_serializing)]
    pub raw: String,
}

impl Verdict {
    /// Parses reflector output.
    ///
    /// The JSON object spanning the first `{` to the last `}` is read. Text
    /// fields that are missing or not strings become empty. Tags with no id or
    /// an unknown tag string are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let json_str = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => return Err(VerdictError::NoJson),
        };

        let json: Value =
            serde_json::from_str(json_str).map_err(|e| VerdictError::InvalidJson(e.to_string()))?;
        if !json.is_object() {
            return Err(VerdictError::InvalidJson("top-level value is not an object".to_string()));
        }

        let field = |name: &str| json.get(name).and_then(Value::as_str).unwrap_or_default().to_string();

        let bullet_tags = json
            .get("bullet_tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Self::parse_tag).collect())
            .unwrap_or_default();

        Ok(Self {
            reasoning: field("reasoning"),
            error_identification: field("error_identification"),
            root_cause_analysis: field("root_cause_analysis"),
            correct_approach: field("correct_approach"),
            key_insight: field("key_insight"),
            bullet_tags,
            raw: text.to_string(),
        })
    }

    fn parse_tag(value: &Value) -> Option<BulletTag> {
        let id = value.get("id").and_then(Value::as_str)?;
        let tag_str = value.get("tag").and_then(Value::as_str)?;
        match tag_str.parse::<EntryTag>() {
            Ok(tag) => Some(BulletTag::new(id, tag)),
            Err(e) => {
                debug!(entry_id = %id, error = %e, "Skipping bullet tag");
                None
            }
        }
    }

    /// A verdict that keeps `text` as its reasoning and carries no tags.
    pub fn unstructured(text: &str) -> Self {
        Self { reasoning: text.to_string(), raw: text.to_string(), ..Self::default() }
    }

    /// Whether any diagnostic field or tag was recovered.
    pub fn is_structured(&self) -> bool {
        !(self.error_identification.is_empty()
            && self.root_cause_analysis.is_empty()
            && self.correct_approach.is_empty()
            && self.key_insight.is_empty()
            && self.bullet_tags.is_empty())
    }

    /// Text handed to the next Generator as its reflection.
    pub fn as_context(&self) -> String {
        if !self.is_structured() {
            return self.reasoning.clone();
        }

        let mut lines = Vec::new();
        for (label, value) in [
            ("Error", &self.error_identification),
            ("Root cause", &self.root_cause_analysis),
            ("Correct approach", &self.correct_approach),
            ("Key insight", &self.key_insight),
        ] {
            if !value.is_empty() {
                lines.push(format!("{label}: {value}"));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_verdict_inside_prose() {
        let text = r#"Here is my analysis:
{
  "reasoning": "moved into a hole",
  "error_identification": "ignored H",
  "root_cause_analysis": "did not read state",
  "correct_approach": "check the cell first",
  "key_insight": "look before moving",
  "bullet_tags": [{"id": "a", "tag": "helpful"}, {"id": "b", "tag": "Harmful"}, {"id": "c", "tag": "neutral"}]
}
Thanks."#;
        let verdict = Verdict::parse(text).unwrap();
        assert_eq!(verdict.reasoning, "moved into a hole");
        assert_eq!(verdict.key_insight, "look before moving");
        assert_eq!(
            verdict.bullet_tags,
            vec![
                BulletTag::new("a", EntryTag::Helpful),
                BulletTag::new("b", EntryTag::Harmful),
                BulletTag::new("c", EntryTag::Neutral),
            ]
        );
        assert_eq!(verdict.raw, text);
    }

    #[test]
    fn test_parse_skips_malformed_tags() {
        let verdict = Verdict::parse(
            r#"{"bullet_tags": [{"id": "a", "tag": "great"}, {"tag": "helpful"}, {"id": "b"}, {"id": "c", "tag": "harmful"}]}"#,
        )
        .unwrap();
        assert_eq!(verdict.bullet_tags, vec![BulletTag::new("c", EntryTag::Harmful)]);
        assert!(verdict.reasoning.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert_eq!(Verdict::parse("no braces here"), Err(VerdictError::NoJson));
        assert!(matches!(Verdict::parse("{ not json }"), Err(VerdictError::InvalidJson(_))));
    }

    #[test]
    fn test_unstructured_keeps_text() {
        let verdict = Verdict::unstructured("free-form thoughts");
        assert_eq!(verdict.reasoning, "free-form thoughts");
        assert!(verdict.bullet_tags.is_empty());
        assert!(!verdict.is_structured());
        assert_eq!(verdict.as_context(), "free-form thoughts");
    }

    #[test]
    fn test_as_context_lists_diagnostics() {
        let verdict = Verdict {
            error_identification: "fell in".to_string(),
            key_insight: "avoid H".to_string(),
            ..Verdict::default()
        };
        assert_eq!(verdict.as_context(), "Error: fell in\nKey insight: avoid H");
    }

    #[test]
    fn test_entry_tag_from_str() {
        assert_eq!(" HELPFUL ".parse::<EntryTag>().unwrap(), EntryTag::Helpful);
        assert!("meh".parse::<EntryTag>().is_err());
        assert_eq!(EntryTag::Harmful.to_string(), "harmful");
    }
}
