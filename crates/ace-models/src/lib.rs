//! Model implementations for ACE.
//!
//! This crate provides concrete implementations of the `Model` trait.
//!
//! # Supported Providers
//!
//! - **Mock**: echoes the conversation back, never calls tools
//! - **Scripted**: replays canned responses in order (tests, dry runs)
//! - **OpenAI**: OpenAI or any OpenAI-compatible endpoint (API key required)

pub mod factory;
pub mod openai;

use std::collections::VecDeque;
use std::sync::Mutex;

use ace_abstraction::{ChatMessage, Model, ModelError, ModelParameters, ModelResponse, ToolDefinition};
use async_trait::async_trait;
use tracing::debug;

pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use openai::OpenAIModel;

/// A mock implementation of the `Model` trait for testing and demonstration.
#[derive(Debug, Default)]
pub struct MockModel {
    id: String,
}

impl MockModel {
    /// Creates a new `MockModel` with the given ID.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        use std::fmt::Write;

        debug!(
            model_id = %self.id,
            message_count = messages.len(),
            tool_count = tools.len(),
            parameters = ?parameters,
            "MockModel generating chat completion"
        );

        let mut conversation_summary = String::from("Conversation Summary:\n");
        for message in messages {
            let _ = writeln!(conversation_summary, "  {}: {}", message.role, message.content);
        }

        Ok(ModelResponse {
            content: Some(format!("Mock chat response from {}\n{conversation_summary}", self.id)),
            tool_calls: Vec::new(),
            model_id: Some(self.id.clone()),
            usage: None,
        })
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

/// One request observed by a [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Messages sent with the request.
    pub messages: Vec<ChatMessage>,
    /// Names of the tools offered.
    pub tool_names: Vec<String>,
}

/// A model that replays queued responses in order.
///
/// Every request is recorded so tests can assert on what each role sent.
/// Once the queue is drained further calls fail with `ModelError::Other`.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    id: String,
    responses: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedModel {
    /// Creates a scripted model with the given responses.
    pub fn new(id: impl Into<String>, responses: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self {
            id: id.into(),
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Appends a response to the end of the script.
    pub fn push(&self, response: ModelResponse) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// Number of responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|queue| queue.len()).unwrap_or_default()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        _parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        self.requests
            .lock()
            .map_err(|e| ModelError::Other(format!("request log poisoned: {}", e)))?
            .push(RecordedRequest {
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });

        let next = self
            .responses
            .lock()
            .map_err(|e| ModelError::Other(format!("response queue poisoned: {}", e)))?
            .pop_front();

        debug!(model_id = %self.id, exhausted = next.is_none(), "ScriptedModel replaying response");

        next.map(|mut response| {
            response.model_id.get_or_insert_with(|| self.id.clone());
            response
        })
        .ok_or_else(|| ModelError::Other(format!("script for '{}' exhausted", self.id)))
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}
