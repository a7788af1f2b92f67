//! Generator: acts in the environment one tool call per turn.

use std::sync::Arc;

use ace_abstraction::{ChatMessage, Model, ModelError, ModelParameters};
use tracing::{debug, info, warn};

use super::ModelCallPolicy;
use crate::environment::Environment;
use crate::episode::trajectory::{ActionInvocation, EpisodeOutcome, Trajectory, TrajectoryStep};

/// Drives the acting loop.
#[derive(Clone)]
pub struct Generator {
    model: Arc<dyn Model>,
    policy: ModelCallPolicy,
    parameters: Option<ModelParameters>,
    max_steps: usize,
}

impl Generator {
    /// Creates a generator capped at `max_steps` turns.
    pub fn new(model: Arc<dyn Model>, policy: ModelCallPolicy, max_steps: usize) -> Self {
        Self { model, policy, parameters: None, max_steps }
    }

    /// Sets sampling parameters for every turn.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ModelParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Turn cap.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Runs the acting loop starting from `messages`.
    ///
    /// Each turn asks the model once with the environment's tools. A single
    /// decodable call is executed and answered with a tool message. A turn
    /// without calls is recorded and the loop continues. An unknown action,
    /// malformed arguments, or more than one call ends acting with a
    /// protocol violation.
    pub async fn run<E: Environment>(
        &self,
        env: &mut E,
        messages: Vec<ChatMessage>,
    ) -> Result<Trajectory, ModelError> {
        let tools = env.action_tools();
        let initial_state = env.state_description();
        let mut conversation = messages;
        let mut steps = Vec::new();

        for turn in 1..=self.max_steps {
            let response =
                self.policy.call(self.model.as_ref(), &conversation, &tools, self.parameters.clone()).await?;
            let message = response.content.clone().filter(|c| !c.trim().is_empty());
            conversation.push(ChatMessage::assistant(response.content_str(), response.tool_calls.clone()));

            let call = match response.tool_calls.as_slice() {
                [] => {
                    debug!(turn, "Generator turn without tool call");
                    steps.push(TrajectoryStep { turn, message, invocation: None, response: None });
                    continue;
                }
                [call] => call,
                calls => {
                    let reason = format!("{} tool calls in one turn, expected exactly one", calls.len());
                    warn!(turn, tool_calls = calls.len(), "Generator broke the one-call protocol");
                    steps.push(TrajectoryStep { turn, message, invocation: None, response: None });
                    return Ok(Self::finish(initial_state, steps, conversation, EpisodeOutcome::ProtocolViolation {
                        reason,
                    }));
                }
            };

            let invocation = ActionInvocation {
                call_id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            };

            let action = match env.decode_call(call) {
                Ok(action) => action,
                Err(e) => {
                    warn!(turn, action = %call.name, error = %e, "Generator issued an invalid action");
                    steps.push(TrajectoryStep { turn, message, invocation: Some(invocation), response: None });
                    return Ok(Self::finish(initial_state, steps, conversation, EpisodeOutcome::ProtocolViolation {
                        reason: e.to_string(),
                    }));
                }
            };

            debug!(turn, action = ?action, "Executing action");
            let outcome = env.execute(action);
            conversation.push(ChatMessage::tool(call.id.clone(), outcome.to_tool_content()));
            let terminated = outcome.is_terminated;
            let reward = outcome.reward;
            steps.push(TrajectoryStep { turn, message, invocation: Some(invocation), response: Some(outcome) });

            if terminated {
                info!(turn, reward, "Environment terminated");
                return Ok(Self::finish(initial_state, steps, conversation, EpisodeOutcome::Terminated { reward }));
            }
        }

        info!(steps = self.max_steps, "Step limit reached");
        let outcome = EpisodeOutcome::StepLimitReached { steps: self.max_steps };
        Ok(Self::finish(initial_state, steps, conversation, outcome))
    }

    fn finish(
        initial_state: String,
        steps: Vec<TrajectoryStep>,
        conversation: Vec<ChatMessage>,
        outcome: EpisodeOutcome,
    ) -> Trajectory {
        Trajectory { initial_state, steps, outcome, conversation }
    }
}
