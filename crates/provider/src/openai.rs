//! OpenAI-compatible completion gateway.
//!
//! Serializes the conversation history and tool schema to the provider's
//! wire shape, sends one `/chat/completions` request, and deserializes the
//! reply into either free text, a list of requested tool calls, or both.
//!
//! Argument parsing is deliberately permissive: a tool call whose argument
//! string is not valid JSON degrades to empty arguments instead of aborting
//! the whole response. The tool implementation rejects missing required
//! fields itself.

use async_trait::async_trait;
use pagecraft_config::AppConfig;
use pagecraft_core::error::ProviderError;
use pagecraft_core::gateway::{CompletionGateway, CompletionRequest, CompletionResponse};
use pagecraft_core::message::{Message, Role};
use pagecraft_core::tool::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// A gateway for any OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiGateway {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiGateway {
    /// Create a gateway against an explicit endpoint.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Build a gateway from config. Fails when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("no API key set".into()))?;
        Ok(Self::new(config.base_url.clone(), key))
    }

    /// Convert domain messages to the OpenAI wire format.
    ///
    /// Assistant tool-call echoes must carry the same call ids the provider
    /// issued, or the follow-up turn is rejected.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::Tool => "tool".into(),
                },
                content: if m.content.is_empty() && !m.tool_calls.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                },
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to the OpenAI wire format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Parse one call's argument string, degrading to `{}` on failure.
    fn parse_arguments(name: &str, raw: &str) -> Value {
        match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %name, error = %e, "Unparseable tool arguments, using empty object");
                Value::Object(serde_json::Map::new())
            }
        }
    }

    /// Pull a useful message out of an error body, falling back to the
    /// status text.
    fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            })
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
            body["tool_choice"] = serde_json::json!("auto");
        }

        debug!(model = %request.model, messages = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Provider returned error");
            return Err(ProviderError::Api {
                status_code: status.as_u16(),
                message: Self::extract_error_message(status, &error_body),
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments = Self::parse_arguments(&tc.function.name, &tc.function.arguments);
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect();

        Ok(CompletionResponse {
            content: choice.message.content.filter(|c| !c.is_empty()),
            tool_calls,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
