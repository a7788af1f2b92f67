//! Curator: updates the playbook through ADD, REMOVE and MODIFY calls.

use std::sync::Arc;

use ace_abstraction::{Model, ModelParameters};
use tracing::{info, warn};

use super::prompts::{CuratorContext, PromptSet};
use super::{ModelCallPolicy, Result};
use crate::curation::{CurationOp, CurationReport, RejectedCall};
use crate::episode::trajectory::Trajectory;
use crate::playbook::PlaybookStore;
use crate::verdict::Verdict;

/// Asks the model for playbook changes and applies them in order.
#[derive(Clone)]
pub struct Curator {
    model: Arc<dyn Model>,
    prompts: Arc<dyn PromptSet>,
    policy: ModelCallPolicy,
    parameters: Option<ModelParameters>,
}

impl Curator {
    /// Creates a curator.
    pub fn new(model: Arc<dyn Model>, prompts: Arc<dyn PromptSet>, policy: ModelCallPolicy) -> Self {
        Self { model, prompts, policy, parameters: None }
    }

    /// Sets sampling parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ModelParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Runs one curation turn against `store`.
    ///
    /// Calls that do not decode are skipped and reported. Each applied
    /// operation is persisted before the next one, and the first persistence
    /// failure is returned.
    pub async fn curate(
        &self,
        store: &mut PlaybookStore,
        trajectory: &Trajectory,
        verdict: &Verdict,
    ) -> Result<CurationReport> {
        let playbook = store.render();
        let rendered = trajectory.render();
        let reflection = if verdict.raw.is_empty() { verdict.as_context() } else { verdict.raw.clone() };
        let messages = self.prompts.curator_messages(&CuratorContext {
            playbook: &playbook,
            trajectory: &rendered,
            reflection: &reflection,
        });

        let tools = CurationOp::tool_definitions();
        let response = self.policy.call(self.model.as_ref(), &messages, &tools, self.parameters.clone()).await?;

        let mut report = CurationReport {
            response_text: response.content.clone().filter(|c| !c.trim().is_empty()),
            ..CurationReport::default()
        };

        for call in &response.tool_calls {
            let op = match CurationOp::from_tool_call(call) {
                Ok(op) => op,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Skipping curator call");
                    report.rejected.push(RejectedCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let effect = store.apply(&op)?;
            report.applied.push((op, effect));
        }

        info!(applied = report.applied.len(), rejected = report.rejected.len(), "Curation finished");
        Ok(report)
    }
}
