//! OpenAI model implementation.
//!
//! This module provides an implementation of the `Model` trait for OpenAI's
//! chat-completions API, including function calling. Any OpenAI-compatible
//! endpoint can be targeted through [`OpenAIModel::with_base_url`].

use ace_abstraction::{
    ChatMessage, Model, ModelError, ModelParameters, ModelResponse, ModelUsage, ToolCall,
    ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI model implementation.
#[derive(Debug, Clone)]
pub struct OpenAIModel {
    /// The model ID (e.g., "gpt-4o", "gpt-4o-mini").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the OpenAI API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAIModel {
    /// Creates a new `OpenAIModel` with the given model ID.
    ///
    /// # Errors
    /// Returns a `ModelError` if the API key is not found in environment variables.
    pub fn new(model_id: String) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            ModelError::UnsupportedModelProvider(
                "OPENAI_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self::with_api_key(model_id, api_key))
    }

    /// Creates a new `OpenAIModel` with a custom API key.
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self { model_id, api_key, base_url: DEFAULT_BASE_URL.to_string(), client: Client::new() }
    }

    /// Points the client at another OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn message_to_openai(msg: &ChatMessage) -> OpenAIMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|call| OpenAIToolCall {
                        id: call.id.clone(),
                        call_type: "function".to_string(),
                        function: OpenAIFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };

        // An assistant turn that only calls tools is sent with null content.
        let content = if msg.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(msg.content.clone())
        };

        OpenAIMessage { role: msg.role.clone(), content, tool_calls, tool_call_id: msg.tool_call_id.clone() }
    }

    fn tools_to_openai(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
        tools
            .iter()
            .map(|tool| OpenAITool {
                tool_type: "function".to_string(),
                function: OpenAIFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool
                        .parameters
                        .as_ref()
                        .and_then(|params| serde_json::to_value(params).ok()),
                },
            })
            .collect()
    }

    fn map_error_status(status: reqwest::StatusCode, error_text: String) -> ModelError {
        let lower = error_text.to_lowercase();
        if status == 402 || status == 429 || lower.contains("insufficient_quota") {
            return ModelError::QuotaExceeded { provider: "openai".to_string(), message: Some(error_text) };
        }
        ModelError::ModelResponseError(format!("API error ({}): {}", status, error_text))
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            tool_count = tools.len(),
            parameters = ?parameters,
            "OpenAIModel generating chat completion"
        );

        let url = format!("{}/chat/completions", self.base_url);

        let openai_tools = Self::tools_to_openai(tools);
        let mut request_body = OpenAIRequest {
            model: self.model_id.clone(),
            messages: messages.iter().map(Self::message_to_openai).collect(),
            tools: if openai_tools.is_empty() { None } else { Some(openai_tools) },
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
        };

        if let Some(params) = parameters {
            request_body.temperature = params.temperature;
            request_body.top_p = params.top_p;
            request_body.max_tokens = params.max_tokens;
            request_body.stop = params.stop_sequences;
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI API returned error status");
            return Err(Self::map_error_status(status, error_text));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let message = openai_response.choices.into_iter().next().map(|c| c.message).ok_or_else(|| {
            error!("No choices in OpenAI API response");
            ModelError::ModelResponseError("No choices in API response".to_string())
        })?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall { id: tc.id, name: tc.function.name, arguments: tc.function.arguments })
            .collect();

        let usage = openai_response.usage.map(|u| ModelUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ModelResponse {
            content: message.content,
            tool_calls,
            model_id: Some(self.model_id.clone()),
            usage,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI API request/response structures

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "default_call_type")]
    call_type: String,
    function: OpenAIFunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ace_abstraction::ToolParameters;

    #[test]
    fn test_openai_model_creation_with_api_key() {
        let model = OpenAIModel::with_api_key("gpt-4o".to_string(), "test-key".to_string());
        assert_eq!(model.model_id(), "gpt-4o");
        assert_eq!(model.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let model = OpenAIModel::with_api_key("local".to_string(), "k".to_string())
            .with_base_url("http://localhost:8000/v1/");
        assert_eq!(model.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_tool_only_assistant_message_has_null_content() {
        let msg = ChatMessage::assistant("", vec![ToolCall::new("call_1", "move_left", "{}")]);
        let wire = OpenAIModel::message_to_openai(&msg);
        assert!(wire.content.is_none());
        assert_eq!(wire.tool_calls.as_ref().map(Vec::len), Some(1));

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "move_left");
    }

    #[test]
    fn test_tools_without_parameters_omit_schema() {
        let tools = vec![
            ToolDefinition::new("move_up", "Move up"),
            ToolDefinition::new("ADD", "Add an entry").with_parameters(
                ToolParameters::new().add_property("content", "string", "Entry text", true),
            ),
        ];
        let json = serde_json::to_value(OpenAIModel::tools_to_openai(&tools)).unwrap();
        assert!(json[0]["function"].get("parameters").is_none());
        assert_eq!(json[1]["function"]["parameters"]["required"][0], "content");
    }

    #[test]
    fn test_error_status_mapping() {
        let err = OpenAIModel::map_error_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert!(matches!(err, ModelError::QuotaExceeded { .. }));

        let err = OpenAIModel::map_error_status(reqwest::StatusCode::BAD_REQUEST, "bad".into());
        assert!(matches!(err, ModelError::ModelResponseError(_)));
    }
}
