//! Curation protocol.
//!
//! The Curator mutates the playbook only through [`CurationOp`]. Tool calls
//! are decoded into operations in a single fallible step, and the tool
//! definitions offered to the model are built here so every Curator sees the
//! same contract.

use ace_abstraction::{ToolCall, ToolDefinition, ToolParameters};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while decoding a curator tool call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurationError {
    /// The tool name is not ADD, REMOVE or MODIFY.
    #[error("unknown curation operation: {0}")]
    UnknownOperation(String),

    /// The arguments are not valid JSON or lack a required field.
    #[error("invalid arguments for {operation}: {reason}")]
    InvalidArguments {
        /// Operation name.
        operation: String,
        /// What was wrong.
        reason: String,
    },
}

/// Result type for curation decoding.
pub type Result<T> = std::result::Result<T, CurationError>;

/// A single playbook mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "UPPERCASE")]
pub enum CurationOp {
    /// Append a new entry; `None` or a blank title targets the default section.
    Add {
        /// Section title.
        section: Option<String>,
        /// Entry text.
        content: String,
    },
    /// Delete every entry with this id.
    Remove {
        /// Entry id.
        bullet_id: String,
    },
    /// Overwrite the content of every entry with this id.
    Modify {
        /// Entry id.
        bullet_id: String,
        /// Replacement text.
        content: String,
    },
}

impl CurationOp {
    /// Tool name for this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "ADD",
            Self::Remove { .. } => "REMOVE",
            Self::Modify { .. } => "MODIFY",
        }
    }

    /// Decodes a curator tool call.
    ///
    /// Names are matched exactly. Extra argument fields are ignored.
    pub fn from_tool_call(call: &ToolCall) -> Result<Self> {
        let operation = call.name.as_str();
        if !matches!(operation, "ADD" | "REMOVE" | "MODIFY") {
            return Err(CurationError::UnknownOperation(call.name.clone()));
        }

        let invalid = |reason: String| CurationError::InvalidArguments { operation: operation.to_string(), reason };
        let value = call.parse_arguments().map_err(|e| invalid(e.to_string()))?;
        let Value::Object(args) = value else {
            return Err(invalid("arguments must be a JSON object".to_string()));
        };

        match operation {
            "ADD" => Ok(Self::Add {
                section: optional_str(&args, "section").map_err(invalid)?,
                content: required_str(&args, "content").map_err(invalid)?,
            }),
            "REMOVE" => Ok(Self::Remove { bullet_id: required_str(&args, "bullet_id").map_err(invalid)? }),
            _ => Ok(Self::Modify {
                bullet_id: required_str(&args, "bullet_id").map_err(invalid)?,
                content: required_str(&args, "content").map_err(invalid)?,
            }),
        }
    }

    /// Tool definitions for ADD, REMOVE and MODIFY.
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "ADD",
                "Adds a new entry into the playbook to help future tasks.",
            )
            .with_parameters(
                ToolParameters::new()
                    .add_property(
                        "section",
                        "string",
                        "Section the entry belongs to. Reuse an existing section when one fits; \
                         an unseen title creates a new section.",
                        true,
                    )
                    .add_property(
                        "content",
                        "string",
                        "The entry text: a strategy, tip, or common mistake to avoid.",
                        true,
                    ),
            ),
            ToolDefinition::new(
                "REMOVE",
                "Removes an existing entry that is unhelpful or redundant.",
            )
            .with_parameters(ToolParameters::new().add_property(
                "bullet_id",
                "string",
                "Identifier of the entry to remove.",
                true,
            )),
            ToolDefinition::new(
                "MODIFY",
                "Rewrites an existing entry to improve its clarity, accuracy, or relevance.",
            )
            .with_parameters(
                ToolParameters::new()
                    .add_property("bullet_id", "string", "Identifier of the entry to modify.", true)
                    .add_property("content", "string", "Replacement text for the entry.", true),
            ),
        ]
    }
}

fn required_str(args: &Map<String, Value>, key: &str) -> std::result::Result<String, String> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("'{key}' must be a string, got {other}")),
        None => Err(format!("missing '{key}'")),
    }
}

fn optional_str(args: &Map<String, Value>, key: &str) -> std::result::Result<Option<String>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!("'{key}' must be a string, got {other}")),
    }
}

/// What an applied operation changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum CurationEffect {
    /// A new entry was appended.
    Added {
        /// Minted id.
        id: String,
        /// Section the entry landed in.
        section: String,
    },
    /// Entries were deleted; zero when the id was unknown.
    Removed {
        /// Entry id.
        id: String,
        /// Entries deleted.
        count: usize,
    },
    /// Entries were rewritten; zero when the id was unknown.
    Modified {
        /// Entry id.
        id: String,
        /// Entries rewritten.
        count: usize,
    },
}

/// A tool call the Curator issued that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedCall {
    /// Tool name as issued.
    pub name: String,
    /// Raw arguments as issued.
    pub arguments: String,
    /// Decode error.
    pub reason: String,
}

/// Outcome of one curation turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurationReport {
    /// Operations applied, in order, with their effects.
    pub applied: Vec<(CurationOp, CurationEffect)>,
    /// Calls skipped because they could not be decoded.
    pub rejected: Vec<RejectedCall>,
    /// Any text the Curator returned alongside its calls.
    pub response_text: Option<String>,
}

impl CurationReport {
    /// Entries added during this turn.
    pub fn added_ids(&self) -> Vec<&str> {
        self.applied
            .iter()
            .filter_map(|(_, effect)| match effect {
                CurationEffect::Added { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}
