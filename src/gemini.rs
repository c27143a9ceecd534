//! Gemini-backed implementation of [`SubtitleGenerator`].
//!
//! The audio is sent inline (base64) alongside a fixed prompt that asks the model for
//! an SRT subtitle file wrapped in start/end markers. We make exactly one request per
//! generation: no retries, no streaming, and a single generic failure path — the
//! caller cannot usefully distinguish a dead network from a service-side rejection.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generator::{SubtitleGenerator, extract_payload};
use crate::{Error, Result};

/// Prompt sent with every generation request.
///
/// The wrapping markers let [`extract_payload`] cut conversational filler away from
/// the SRT body; the square-bracket instruction keeps translations inline as plain
/// caption text rather than a side channel.
const PROMPT: &str = "Generate a Lyrical Subtitle File for this song in the SRT format. \
The SRT format should follow this structure for each subtitle:\n\
1. Subtitle number\n\
2. Timestamp in format: MM:SS,mmm --> MM:SS,mmm\n\
3. Blank line\n\
4. If the line isn't in English, put the English translation in square brackets on the corresponding line.\n\
\n\
For example:\n\
1\n\
00:01,000 --> 00:04,000\n\
First line of lyrics\n\
\n\
2\n\
00:05,000 --> 00:06,000\n\
Second line of lyrics\n\
\n\
Please include accurate timestamps that match when each line is actually sung in the audio. \
Make sure the durations are appropriate for each line of lyrics.\n\
Please wrap the subtitles between [SUBTITLES_START] and [SUBTITLES_END] tags.";

/// Client for Google's Gemini `generateContent` API.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Default Gemini API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default model for lyric generation.
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";

    /// Create a client with the given credential and model.
    ///
    /// We require a non-empty key at construction so a misconfigured deployment
    /// fails at startup with a clear message, not on the first upload.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("Gemini API key must be provided".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            model: model.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    fn build_request(&self, audio: &[u8], mime_type: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: Some(PROMPT.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: mime_type.to_string(),
                            data: BASE64.encode(audio),
                        }),
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: Some(8192),
            }),
        }
    }
}

#[async_trait]
impl SubtitleGenerator for GeminiClient {
    async fn generate(
        &self,
        audio: &[u8],
        mime_type: &str,
        api_key: Option<&str>,
    ) -> Result<String> {
        let api_request = self.build_request(audio, mime_type);

        // API key goes in a header (per-request override allowed) so it never
        // appears in logged URLs.
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let key = api_key.unwrap_or(&self.api_key);

        debug!(model = %self.model, audio_bytes = audio.len(), "requesting lyric generation");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Generation(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let error: ApiError = serde_json::from_str(&body).unwrap_or(ApiError {
                error: ApiErrorDetail {
                    message: body.clone(),
                    status: None,
                },
            });
            let status_str = error.error.status.as_deref().unwrap_or("unknown");
            return Err(Error::Generation(format!(
                "Gemini API error ({status}; status={status_str}): {}",
                error.error.message
            )));
        }

        let api_response: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Generation(format!("failed to parse response: {e}")))?;

        if let Some(reason) = api_response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(Error::Generation(format!("prompt blocked: {reason}")));
        }

        let text = api_response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::Generation(
                "Gemini returned no subtitle text".to_string(),
            ));
        }

        Ok(extract_payload(&text).to_string())
    }
}

// Gemini API types (camelCase on the wire).

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}
