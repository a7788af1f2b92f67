//! Record of one acting phase.

use std::fmt::{self, Write};

use ace_abstraction::ChatMessage;
use serde::Serialize;

use crate::environment::StepOutcome;

/// A tool call the Generator issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInvocation {
    /// Provider call id.
    pub call_id: String,
    /// Tool name.
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
}

/// One Generator turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryStep {
    /// 1-based turn number.
    pub turn: usize,
    /// Text the Generator wrote, if any.
    pub message: Option<String>,
    /// The action it requested, if any.
    pub invocation: Option<ActionInvocation>,
    /// What the environment returned, if the action was executed.
    pub response: Option<StepOutcome>,
}

/// How acting ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpisodeOutcome {
    /// The environment reported termination.
    Terminated {
        /// Reward of the final step.
        reward: f64,
    },
    /// The step cap was hit first.
    StepLimitReached {
        /// Turns taken.
        steps: usize,
    },
    /// The Generator broke the tool protocol and acting stopped.
    ProtocolViolation {
        /// What it did wrong.
        reason: String,
    },
}

impl fmt::Display for EpisodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminated { reward } => write!(f, "terminated with reward {reward}"),
            Self::StepLimitReached { steps } => write!(f, "step limit reached after {steps} turns"),
            Self::ProtocolViolation { reason } => write!(f, "protocol violation: {reason}"),
        }
    }
}

/// Everything the Generator did in one episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    /// State before the first action.
    pub initial_state: String,
    /// Turns in order.
    pub steps: Vec<TrajectoryStep>,
    /// How acting ended.
    pub outcome: EpisodeOutcome,
    /// Full message history, including prompts and tool responses.
    #[serde(skip)]
    pub conversation: Vec<ChatMessage>,
}

impl Trajectory {
    /// Turns taken.
    pub fn turns(&self) -> usize {
        self.steps.len()
    }

    /// Actions actually executed against the environment.
    pub fn tool_call_count(&self) -> usize {
        self.steps.iter().filter(|s| s.response.is_some()).count()
    }

    /// Sum of step rewards.
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().filter_map(|s| s.response.as_ref()).map(|r| r.reward).sum()
    }

    /// Whether acting ended on a protocol violation.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self.outcome, EpisodeOutcome::ProtocolViolation { .. })
    }

    /// Text form handed to the Reflector and the Curator.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Initial state:\n{}", self.initial_state);
        for step in &self.steps {
            let _ = writeln!(out, "\nTurn {}:", step.turn);
            if let Some(message) = &step.message {
                let _ = writeln!(out, "Agent: {message}");
            }
            if let Some(invocation) = &step.invocation {
                let arguments = if invocation.arguments.trim().is_empty() { "{}" } else { &invocation.arguments };
                let _ = writeln!(out, "Action: {} {}", invocation.name, arguments);
            }
            match &step.response {
                Some(response) => {
                    let _ = writeln!(
                        out,
                        "Result: reward {}, terminated {}\nState:\n{}",
                        response.reward, response.is_terminated, response.state
                    );
                }
                None if step.invocation.is_none() => {
                    let _ = writeln!(out, "(no action)");
                }
                None => {}
            }
        }
        let _ = write!(out, "\nOutcome: {}", self.outcome);
        out
    }
}
