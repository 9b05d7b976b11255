//! Client for Stability AI's Stable Audio text-to-audio endpoint.

use super::{AudioGenerator, GenerationOptions, GeneratorError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{multipart::Form, Client};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_STABLE_AUDIO_URL: &str = "https://api.stability.ai";
pub const DEFAULT_STABLE_AUDIO_MODEL: &str = "stable-audio-2.5";

const TEXT_TO_AUDIO_PATH: &str = "/v2beta/audio/stable-audio-2/text-to-audio";

pub struct StableAudioClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl StableAudioClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://api.stability.ai")
    /// * `model` - Model name sent with every request
    /// * `api_key` - Bearer token; requests go out unauthenticated without it
    /// * `timeout_sec` - Per-request timeout. Generation routinely takes minutes.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_sec: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            model: model.into(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, TEXT_TO_AUDIO_PATH)
    }
}

#[async_trait]
impl AudioGenerator for StableAudioClient {
    fn name(&self) -> &str {
        "stable-audio"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<u8>, GeneratorError> {
        let form = Form::new()
            .text("prompt", prompt.to_string())
            .text("output_format", options.output_format.as_str())
            .text("duration", options.duration_secs.to_string())
            .text("model", self.model.clone());

        debug!(
            model = %self.model,
            duration = options.duration_secs,
            "Sending text-to-audio request"
        );

        let mut request = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::ACCEPT, "audio/*")
            .multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GeneratorError::Timeout
            } else {
                GeneratorError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GeneratorError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Text-to-audio request rejected");
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                GeneratorError::Timeout
            } else {
                GeneratorError::InvalidResponse(format!("Failed to read audio body: {}", e))
            }
        })?;
        if bytes.is_empty() {
            return Err(GeneratorError::InvalidResponse(
                "Empty audio body".to_string(),
            ));
        }

        debug!(bytes = bytes.len(), "Received generated audio");
        Ok(bytes.to_vec())
    }
}
