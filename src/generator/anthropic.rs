use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{Generator, Sampling};

/// Messages API version sent with every request.
const API_VERSION: &str = "2023-06-01";

/// Messages-API client for Anthropic models.
pub struct AnthropicGenerator {
    endpoint: String,
    model: String,
    sampling: Sampling,
    client: Client,
}

impl AnthropicGenerator {
    /// Builds a client posting to `{base_url}/messages`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: String,
        sampling: Sampling,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.trim();
        anyhow::ensure!(!api_key.is_empty(), "missing Anthropic API key");
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).context("invalid Anthropic API key")?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Anthropic HTTP client")?;
        Ok(Self {
            endpoint: format!("{}/messages", base_url.trim_end_matches('/')),
            model,
            sampling,
            client,
        })
    }

    fn request<'a>(&'a self, prompt: &'a str) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.model,
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![AnthropicContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
        }
    }
}

impl Generator for AnthropicGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&self.request(prompt))
            .send()
            .with_context(|| format!("failed to call Anthropic at {}", self.endpoint))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("Anthropic returned {status}: {text}");
        }
        let parsed: AnthropicResponse =
            resp.json().context("failed to parse Anthropic response")?;
        parsed.into_answer()
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<AnthropicContentBlock<'a>>,
}

#[derive(Serialize)]
struct AnthropicContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
}

impl AnthropicResponse {
    fn into_answer(self) -> Result<String> {
        let answer = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicResponseBlock::Text { text } => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        let answer = answer.trim();
        if answer.is_empty() {
            bail!("Anthropic response missing text content");
        }
        Ok(answer.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
