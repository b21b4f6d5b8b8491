use crate::config::LLMConfig;
use crate::core::error::{ReportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Speaker of a conversation turn, in the endpoint's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Web citation attached to a grounded response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub contents: Vec<ChatTurn>,
    pub response_mime_type: Option<String>,
    pub response_schema: Option<Value>,
    pub thinking_budget: Option<u32>,
    pub web_search: bool,
}

impl GenerationRequest {
    /// Single-prompt structured request constrained to `schema`
    pub fn json(system: impl Into<String>, prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            system_instruction: Some(system.into()),
            contents: vec![ChatTurn::user(prompt)],
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
            thinking_budget: None,
            web_search: false,
        }
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationResponse {
    pub text: Option<String>,
    pub sources: Vec<Source>,
}

/// Hosted text/JSON completion endpoint
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

// Wire format of the generateContent endpoint

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: LLMConfig,
}

impl GeminiClient {
    pub fn new(api_key: String, config: LLMConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, request: GenerationRequest) -> GenerateContentRequest {
        let contents = request
            .contents
            .into_iter()
            .map(|turn| Content {
                role: Some(
                    match turn.role {
                        TurnRole::User => "user",
                        TurnRole::Model => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: Some(turn.text),
                    thought: None,
                }],
            })
            .collect();

        let system_instruction = request.system_instruction.map(|text| Content {
            role: None,
            parts: vec![Part {
                text: Some(text),
                thought: None,
            }],
        });

        let tools = if request.web_search {
            vec![serde_json::json!({ "googleSearch": {} })]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: request.response_mime_type,
                response_schema: request.response_schema,
                thinking_config: request
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
            tools,
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let body = self.build_request(request);

        tracing::debug!(
            "[GeminiClient] POST {} (schema: {}, thinking: {:?})",
            self.endpoint(),
            body.generation_config.response_schema.is_some(),
            body.generation_config
                .thinking_config
                .as_ref()
                .map(|t| t.thinking_budget)
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                "[GeminiClient] API returned error status {}: {}",
                status,
                error_text
            );
            return Err(ReportError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let decoded = response.json::<GenerateContentResponse>().await?;
        Ok(into_generation_response(decoded))
    }
}

fn into_generation_response(decoded: GenerateContentResponse) -> GenerationResponse {
    let Some(candidate) = decoded.candidates.into_iter().next() else {
        return GenerationResponse::default();
    };

    // Thought summaries are not part of the answer
    let text: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought.unwrap_or(false))
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    let sources = candidate
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| match (web.title, web.uri) {
                    (Some(title), Some(uri)) => Some(Source { title, uri }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    GenerationResponse {
        text: if text.is_empty() { None } else { Some(text) },
        sources,
    }
}
