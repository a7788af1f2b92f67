//! Reflector: turns a trajectory into a verdict.

use std::sync::Arc;

use ace_abstraction::{Model, ModelError, ModelParameters};
use tracing::{debug, warn};

use super::ModelCallPolicy;
use super::prompts::{PromptSet, ReflectorContext};
use crate::episode::trajectory::Trajectory;
use crate::verdict::Verdict;

/// Asks the model to diagnose a trajectory.
#[derive(Clone)]
pub struct Reflector {
    model: Arc<dyn Model>,
    prompts: Arc<dyn PromptSet>,
    policy: ModelCallPolicy,
    parameters: Option<ModelParameters>,
}

impl Reflector {
    /// Creates a reflector.
    pub fn new(model: Arc<dyn Model>, prompts: Arc<dyn PromptSet>, policy: ModelCallPolicy) -> Self {
        Self { model, prompts, policy, parameters: None }
    }

    /// Sets sampling parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ModelParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Produces a verdict. Output that does not parse is kept as the
    /// verdict's reasoning with no tags.
    pub async fn reflect(&self, playbook: &str, trajectory: &Trajectory) -> Result<Verdict, ModelError> {
        let rendered = trajectory.render();
        let messages = self.prompts.reflector_messages(&ReflectorContext { playbook, trajectory: &rendered });
        let response = self.policy.call(self.model.as_ref(), &messages, &[], self.parameters.clone()).await?;
        let text = response.content_str();

        match Verdict::parse(text) {
            Ok(verdict) => {
                debug!(tags = verdict.bullet_tags.len(), "Parsed reflector verdict");
                Ok(verdict)
            }
            Err(e) => {
                warn!(error = %e, "Reflector output is not a structured verdict");
                Ok(Verdict::unstructured(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::prompts::DefaultPrompts;
    use crate::episode::trajectory::EpisodeOutcome;
    use crate::verdict::{BulletTag, EntryTag};
    use ace_abstraction::ModelResponse;
    use ace_models::ScriptedModel;
    use std::time::Duration;

    fn trajectory() -> Trajectory {
        Trajectory {
            initial_state: "start".to_string(),
            steps: Vec::new(),
            outcome: EpisodeOutcome::StepLimitReached { steps: 0 },
            conversation: Vec::new(),
        }
    }

    fn reflector(model: Arc<ScriptedModel>) -> Reflector {
        Reflector::new(
            model,
            Arc::new(DefaultPrompts::default()),
            ModelCallPolicy::new(Duration::from_secs(5), 0, Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_structured_verdict() {
        let model = Arc::new(ScriptedModel::new(
            "r",
            vec![ModelResponse::text(r#"{"key_insight": "k", "bullet_tags": [{"id": "a", "tag": "harmful"}]}"#)],
        ));
        let verdict = reflector(model.clone()).reflect("PB", &trajectory()).await.unwrap();

        assert_eq!(verdict.key_insight, "k");
        assert_eq!(verdict.bullet_tags, vec![BulletTag::new("a", EntryTag::Harmful)]);

        let request = &model.requests()[0];
        assert!(request.tool_names.is_empty());
        assert!(request.messages.iter().any(|m| m.content.contains("Outcome: step limit reached")));
    }

    #[tokio::test]
    async fn test_unparseable_output_is_kept() {
        let model = Arc::new(ScriptedModel::new("r", vec![ModelResponse::text("I think it went fine")]));
        let verdict = reflector(model).reflect("", &trajectory()).await.unwrap();
        assert_eq!(verdict.reasoning, "I think it went fine");
        assert!(verdict.bullet_tags.is_empty());
    }
}
