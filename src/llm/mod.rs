//! LLM integration for turning workout text and PDF plans into structured data.
//!
//! Two wire formats are spoken: Gemini's `generateContent` and the
//! OpenAI-compatible `chat/completions` (used for both OpenAI and AIML API).

pub mod json_extract;
pub mod prompts;

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::LlmConfig;

pub use json_extract::{extract_json, ParseMethod};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const TEMPERATURE: f32 = 0.1;

pub const TEXT_MAX_TOKENS: u32 = 2000;
pub const PDF_MAX_TOKENS: u32 = 4000;
const CONNECTION_TEST_MAX_TOKENS: u32 = 100;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const AIML_API_BASE: &str = "https://api.aimlapi.com/v1";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{0} API key not configured")]
    MissingApiKey(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("AI parsing failed: {0}")]
    Parse(String),

    #[error("Invalid workout data structure received from AI: {0}")]
    InvalidStructure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    Aiml,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(ProviderKind::Gemini),
            "openai" => Some(ProviderKind::OpenAi),
            "aiml" => Some(ProviderKind::Aiml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Aiml => "aiml",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Aiml => "AIML",
        }
    }

    fn text_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash-latest",
            ProviderKind::OpenAi | ProviderKind::Aiml => "gpt-4o-mini",
        }
    }

    fn pdf_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash-latest",
            ProviderKind::OpenAi | ProviderKind::Aiml => "gpt-4o",
        }
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiReplyContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiReplyPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiReplyPart {
    text: Option<String>,
}

// OpenAI-compatible API types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

/// Both APIs report failures as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Outcome of a provider self-test. Failures are reported in the body, not
/// through the HTTP status.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub api_key_present: bool,
}

// Client

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn text_provider(&self) -> ProviderKind {
        self.config.text_provider
    }

    pub fn pdf_provider(&self) -> ProviderKind {
        self.config.pdf_provider
    }

    fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => self.config.gemini_api_key.as_deref(),
            ProviderKind::OpenAi => self.config.openai_api_key.as_deref(),
            ProviderKind::Aiml => self.config.aiml_api_key.as_deref(),
        }
    }

    fn require_key(&self, kind: ProviderKind) -> Result<&str, LlmError> {
        self.api_key(kind)
            .ok_or_else(|| LlmError::MissingApiKey(kind.display_name().to_string()))
    }

    fn api_base(&self, kind: ProviderKind) -> &str {
        let configured = match kind {
            ProviderKind::Gemini => self.config.gemini_api_base.as_deref(),
            ProviderKind::OpenAi => self.config.openai_api_base.as_deref(),
            ProviderKind::Aiml => self.config.aiml_api_base.as_deref(),
        };
        configured
            .unwrap_or(match kind {
                ProviderKind::Gemini => GEMINI_API_BASE,
                ProviderKind::OpenAi => OPENAI_API_BASE,
                ProviderKind::Aiml => AIML_API_BASE,
            })
            .trim_end_matches('/')
    }

    /// Send a single text prompt and return the reply text.
    pub async fn complete_text(
        &self,
        kind: ProviderKind,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        tracing::info!("Sending prompt to {}", kind.display_name());
        match kind {
            ProviderKind::Gemini => {
                self.gemini_generate(
                    kind.text_model(),
                    vec![json!({ "text": prompt })],
                    max_tokens,
                )
                .await
            }
            ProviderKind::OpenAi | ProviderKind::Aiml => {
                let messages = vec![ChatMessage {
                    role: "user",
                    content: Value::String(prompt.to_string()),
                }];
                self.chat_completion(kind, kind.text_model(), messages, max_tokens)
                    .await
            }
        }
    }

    /// Send a PDF document along with instructions and return the reply text.
    pub async fn complete_with_pdf(
        &self,
        kind: ProviderKind,
        system_prompt: &str,
        user_prompt: &str,
        pdf: &[u8],
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let encoded = STANDARD.encode(pdf);
        tracing::info!(
            "Sending {} byte PDF to {}",
            pdf.len(),
            kind.display_name()
        );

        match kind {
            ProviderKind::Gemini => {
                let parts = vec![
                    json!({ "text": format!("{}\n\n{}", system_prompt, user_prompt) }),
                    json!({ "inline_data": { "mime_type": "application/pdf", "data": encoded } }),
                ];
                self.gemini_generate(kind.pdf_model(), parts, max_tokens)
                    .await
            }
            ProviderKind::OpenAi | ProviderKind::Aiml => {
                let messages = vec![
                    ChatMessage {
                        role: "system",
                        content: Value::String(system_prompt.to_string()),
                    },
                    ChatMessage {
                        role: "user",
                        content: json!([
                            { "type": "text", "text": user_prompt },
                            {
                                "type": "file",
                                "file": {
                                    "filename": "workout-plan.pdf",
                                    "file_data": format!("data:application/pdf;base64,{}", encoded)
                                }
                            }
                        ]),
                    },
                ];
                self.chat_completion(kind, kind.pdf_model(), messages, max_tokens)
                    .await
            }
        }
    }

    /// Send a tiny prompt to the provider and describe what happened.
    pub async fn test_connection(&self, kind: ProviderKind) -> ConnectionReport {
        let api_key_present = self.api_key(kind).is_some();
        let name = kind.display_name();

        match self
            .complete_text(kind, prompts::CONNECTION_TEST_PROMPT, CONNECTION_TEST_MAX_TOKENS)
            .await
        {
            Ok(reply) => ConnectionReport {
                success: true,
                provider: kind.as_str(),
                message: Some(format!("{} API connection successful", name)),
                response: Some(reply),
                error: None,
                api_key_present,
            },
            Err(e) => {
                tracing::warn!("{} connection test failed: {}", name, e);
                ConnectionReport {
                    success: false,
                    provider: kind.as_str(),
                    message: None,
                    response: None,
                    error: Some(e.to_string()),
                    api_key_present,
                }
            }
        }
    }

    async fn gemini_generate(
        &self,
        model: &str,
        parts: Vec<Value>,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let api_key = self.require_key(ProviderKind::Gemini)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base(ProviderKind::Gemini),
            model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;
        let body = read_body(response).await?;

        let reply: GeminiResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

        reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| LlmError::Parse("No text content in Gemini response".to_string()))
    }

    async fn chat_completion(
        &self,
        kind: ProviderKind,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let api_key = self.require_key(kind)?;
        let url = format!("{}/chat/completions", self.api_base(kind));
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;
        let body = read_body(response).await?;

        let reply: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("No text content in chat response".to_string()))
    }
}

/// The body of a successful response, or the provider's error message.
async fn read_body(response: reqwest::Response) -> Result<String, LlmError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
        tracing::error!("LLM API returned {}: {}", status, body);
        if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return Err(LlmError::Api(format!("({}) {}", status.as_u16(), error_resp.error.message)));
        }
        return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    Ok(body)
}
