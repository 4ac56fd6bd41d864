use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::ApiKey;
use crate::error::{Error, Result, Service, UpstreamKind};
use crate::{Summary, Transcript};

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

pub const MIN_WORDS: u32 = 100;
pub const MAX_WORDS: u32 = 500;

const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 2048;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Per-request knobs for the summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryOptions {
    /// Upper bound on summary length, in words
    pub max_words: u32,
    /// Sampling temperature ("creativity")
    pub temperature: f32,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            max_words: 250,
            temperature: 0.3,
        }
    }
}

impl SummaryOptions {
    /// Build options, clamping both values into their supported ranges
    pub fn new(max_words: u32, temperature: f32) -> Self {
        let temperature = if temperature.is_nan() {
            SummaryOptions::default().temperature
        } else {
            temperature.clamp(0.0, 1.0)
        };
        SummaryOptions {
            max_words: max_words.clamp(MIN_WORDS, MAX_WORDS),
            temperature,
        }
    }
}

/// Turns a transcript into a summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &Transcript, options: &SummaryOptions) -> Result<Summary>;
}

/// Build the prompt sent to the model
pub fn build_prompt(transcript: &Transcript, options: &SummaryOptions) -> String {
    let title = if transcript.title.is_empty() {
        String::new()
    } else {
        format!("Video title: {}\n\n", transcript.title)
    };

    format!(
        "Please analyze the following YouTube video transcript and provide a concise summary with:
1. Main topic and purpose (1-2 sentences)
2. 3-5 key points (as bullet points)
3. Any important facts, figures, or statistics mentioned
4. Overall conclusions or takeaways

Guidelines:
- Keep summary under {max_words} words
- Use neutral, academic tone
- Focus on factual content only
- Format with clear section headings

{title}Transcript:
{text}
",
        max_words = options.max_words,
        text = transcript.text(),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    safety_settings: Vec<SafetySetting>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// A model visible to the configured credential
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

/// Google Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    client: reqwest::Client,
    api_key: ApiKey,
    model: String,
    endpoint: String,
}

impl GeminiSummarizer {
    pub fn new(client: reqwest::Client, api_key: ApiKey, model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        GeminiSummarizer {
            client,
            api_key,
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn model_path(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/v1beta/models/{model}:generateContent", self.endpoint)
    }

    /// List the models the credential can use
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let resp = self
            .client
            .get(format!("{}/v1beta/models", self.endpoint))
            .header("x-goog-api-key", self.api_key.expose())
            .send()
            .await
            .map_err(gemini_error)?;

        let resp = check_status(resp).await?;
        let list: ModelList = resp.json().await.map_err(gemini_error)?;
        Ok(list.models)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, transcript: &Transcript, options: &SummaryOptions) -> Result<Summary> {
        let prompt = build_prompt(transcript, options);
        debug!(
            "Summarizing {} via Gemini model {} ({} prompt chars)",
            transcript.video_id,
            self.model,
            prompt.len()
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_ONLY_HIGH",
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: TOP_P,
                top_k: TOP_K,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let resp = self
            .client
            .post(self.model_path())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(gemini_error)?;

        let resp = check_status(resp).await?;
        let json: GenerateContentResponse = resp.json().await.map_err(gemini_error)?;
        let text = extract_text(json)?;
        info!("Summary for {}: {} chars", transcript.video_id, text.len());

        Ok(Summary {
            video_id: transcript.video_id.clone(),
            text,
        })
    }
}

fn gemini_error(err: reqwest::Error) -> Error {
    Error::from_reqwest(Service::Gemini, err)
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(Error::upstream(
        Service::Gemini,
        classify_status(status.as_u16(), &message),
        message,
    ))
}

fn classify_status(status: u16, message: &str) -> UpstreamKind {
    let lower = message.to_ascii_lowercase();
    match status {
        401 | 403 => UpstreamKind::Authentication,
        429 => UpstreamKind::RateLimited,
        413 => UpstreamKind::InputTooLarge,
        400 if lower.contains("api key not valid") || lower.contains("api_key_invalid") => UpstreamKind::Authentication,
        400 if lower.contains("token") && (lower.contains("exceed") || lower.contains("limit")) => {
            UpstreamKind::InputTooLarge
        }
        400 if lower.contains("too long") || lower.contains("too large") => UpstreamKind::InputTooLarge,
        other => UpstreamKind::Http(other),
    }
}

fn extract_text(resp: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(Error::SummarizationFailed(format!("prompt blocked by safety filter ({reason})")));
    }

    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(Error::SummarizationFailed("model returned no candidates".to_string()));
    };

    let text = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(Error::SummarizationFailed(format!("empty response (finish reason {reason})")));
    }
    Ok(text)
}
