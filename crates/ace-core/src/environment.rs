//! Environment boundary.
//!
//! An environment exposes its actions as tools, decodes tool calls into its
//! own closed action type, and reports the outcome of each executed action.

use std::fmt::Debug;

use ace_abstraction::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while decoding an action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The tool name is not part of the action vocabulary.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The arguments could not be decoded.
    #[error("invalid arguments for {action}: {reason}")]
    InvalidArguments {
        /// Action name.
        action: String,
        /// What was wrong.
        reason: String,
    },
}

/// Result of executing one action.
///
/// Serialized as the tool response the Generator sees next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// State description after the action.
    pub state: String,
    /// Reward for this step.
    pub reward: f64,
    /// Whether the episode is over.
    #[serde(rename = "isTerminated")]
    pub is_terminated: bool,
}

impl StepOutcome {
    /// Creates a step outcome.
    pub fn new(state: impl Into<String>, reward: f64, is_terminated: bool) -> Self {
        Self { state: state.into(), reward, is_terminated }
    }

    /// JSON text for the tool response message.
    pub fn to_tool_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.state.clone())
    }
}

/// Something the Generator can act in.
pub trait Environment {
    /// Closed set of actions.
    type Action: Debug;

    /// Tools offered to the Generator.
    fn action_tools(&self) -> Vec<ToolDefinition>;

    /// Maps a tool name and its arguments to an action.
    fn decode_action(&self, name: &str, arguments: &Value) -> Result<Self::Action, ActionError>;

    /// Human-readable description of the current state.
    fn state_description(&self) -> String;

    /// Executes an action.
    fn execute(&mut self, action: Self::Action) -> StepOutcome;

    /// Resets to a starting state. Called before every episode.
    fn reset(&mut self, _seed: Option<u64>) {}

    /// Decodes a tool call, parsing its raw arguments first.
    fn decode_call(&self, call: &ToolCall) -> Result<Self::Action, ActionError> {
        let arguments = call.parse_arguments().map_err(|e| ActionError::InvalidArguments {
            action: call.name.clone(),
            reason: e.to_string(),
        })?;
        self.decode_action(&call.name, &arguments)
    }
}
