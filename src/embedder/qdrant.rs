//! Qdrant Cloud Inference embedding client.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::Embedder;

/// Blocking embeddings client that talks to Qdrant Cloud Inference endpoints.
#[derive(Clone)]
pub struct QdrantEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl QdrantEmbedder {
    /// Builds a new Qdrant embeddings client.
    ///
    /// # Arguments
    /// * `api_key` - Value for the `api-key` header (usually from `QDRANT_API_KEY` env var)
    /// * `endpoint` - Full inference endpoint, e.g. `https://cluster-id.cloud.qdrant.io/inference/text`
    /// * `model` - Model identifier advertised by the cluster (e.g. `qdrant/all-MiniLM-L6-v2`)
    pub fn new(api_key: &str, endpoint: &str, model: String, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Qdrant API key");
        anyhow::ensure!(
            endpoint.starts_with("http://") || endpoint.starts_with("https://"),
            "Qdrant inference endpoint must be an http(s) URL"
        );
        anyhow::ensure!(!model.trim().is_empty(), "missing Qdrant model name");
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key.trim()).context("invalid Qdrant API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Qdrant inference HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Sends a batch of strings to Qdrant Cloud Inference and returns embedding vectors.
    pub fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let request = InferenceRequest {
            model: &self.model,
            inputs,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .with_context(|| format!("failed to call Qdrant inference at {}", self.endpoint))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("Qdrant inference request failed ({}): {}", status, body);
        }
        let payload: InferenceResponse = resp
            .json()
            .context("failed to parse Qdrant inference response")?;
        payload.into_embeddings(inputs.len())
    }
}

impl Embedder for QdrantEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        super::single(self.embed_batch(&[text])?, "Qdrant inference")
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    model: &'a str,
    #[serde(rename = "input")]
    inputs: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    data: Vec<InferenceData>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

impl InferenceResponse {
    fn into_embeddings(self, expected_len: usize) -> Result<Vec<Vec<f32>>> {
        if !self.data.is_empty() {
            anyhow::ensure!(
                self.data.len() == expected_len,
                "Qdrant returned {} embeddings for {} inputs",
                self.data.len(),
                expected_len
            );
            let mut data = self.data;
            data.sort_by_key(|d| d.index.unwrap_or(0));
            return Ok(data.into_iter().map(|d| d.embedding).collect());
        }
        if !self.embeddings.is_empty() {
            anyhow::ensure!(
                self.embeddings.len() == expected_len,
                "Qdrant returned {} embeddings for {} inputs",
                self.embeddings.len(),
                expected_len
            );
            return Ok(self.embeddings);
        }
        Err(anyhow!("Qdrant response missing embedding payloads"))
    }
}

#[derive(Debug, Deserialize)]
struct InferenceData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_data_is_reordered() {
        let payload: InferenceResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[2.0],"index":1},{"embedding":[1.0],"index":0}]}"#,
        )
        .unwrap();
        assert_eq!(payload.into_embeddings(2).unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn bare_embeddings_are_accepted() {
        let payload: InferenceResponse =
            serde_json::from_str(r#"{"embeddings":[[0.5,0.25]]}"#).unwrap();
        assert_eq!(payload.into_embeddings(1).unwrap(), vec![vec![0.5, 0.25]]);
    }

    #[test]
    fn count_mismatch_and_empty_payloads_fail() {
        let payload: InferenceResponse =
            serde_json::from_str(r#"{"embeddings":[[0.5],[0.25]]}"#).unwrap();
        assert!(payload.into_embeddings(1).is_err());
        let empty: InferenceResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_embeddings(1).is_err());
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = QdrantEmbedder::new(
            "key",
            "ftp://cluster/inference",
            "qdrant/all-MiniLM-L6-v2".into(),
            Duration::from_secs(1),
        );
        assert!(err.is_err());
    }
}
