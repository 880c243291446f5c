//! Command-line and environment configuration shared by the binaries.
//!
//! Both the API server and the ingestion tool flatten [`ServiceArgs`], so the
//! collection name, model names and endpoints are configured in one place.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use url::Url;

use crate::embedder::{Embedder, OpenAiEmbedder, QdrantEmbedder};
use crate::generator::{AnthropicGenerator, Generator, OpenAiGenerator, Sampling};
use crate::vector_store::QdrantStore;

/// Default Qdrant collection holding lecture units.
pub const DEFAULT_COLLECTION: &str = "jyotir_brahmana_units";

/// Qdrant connection settings.
#[derive(Args, Debug, Clone)]
pub struct QdrantArgs {
    /// Base URL of the Qdrant cluster.
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6333")]
    pub qdrant_url: String,

    /// Qdrant API key (sent as the `api-key` header).
    #[arg(long, env = "QDRANT_API_KEY", hide_env_values = true)]
    pub qdrant_api_key: Option<String>,

    /// Collection storing the embedded units.
    #[arg(long, env = "JYOTIR_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,
}

/// Which service embeds text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Qdrant Cloud Inference.
    Qdrant,
    /// OpenAI-compatible `/embeddings`.
    Openai,
}

/// Embedding settings.
#[derive(Args, Debug, Clone)]
pub struct EmbedderArgs {
    /// Embedding provider.
    #[arg(long, env = "JYOTIR_EMBEDDER", value_enum, default_value_t = EmbedderKind::Qdrant)]
    pub embedder: EmbedderKind,

    /// Embedding model; defaults to `qdrant/all-MiniLM-L6-v2` or `text-embedding-3-small`.
    #[arg(long, env = "JYOTIR_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Full Qdrant inference endpoint; defaults to `{qdrant_url}/inference/text`.
    #[arg(long, env = "JYOTIR_QDRANT_INFERENCE_URL")]
    pub inference_url: Option<String>,

    /// Optional dimension override for OpenAI embedding models.
    #[arg(long, env = "JYOTIR_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,
}

/// Which service generates text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmProvider {
    /// OpenAI chat completions.
    Openai,
    /// Anthropic messages.
    Anthropic,
}

/// Generation settings.
#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// LLM provider.
    #[arg(long, env = "JYOTIR_LLM_PROVIDER", value_enum, default_value_t = LlmProvider::Openai)]
    pub llm_provider: LlmProvider,

    /// OpenAI chat model.
    #[arg(long, env = "JYOTIR_OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    /// Anthropic API key (required with `--llm-provider anthropic`).
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Base URL for the Anthropic messages API.
    #[arg(long, env = "JYOTIR_ANTHROPIC_BASE", default_value = "https://api.anthropic.com/v1")]
    pub anthropic_base_url: String,

    /// Anthropic model identifier.
    #[arg(long, env = "JYOTIR_ANTHROPIC_MODEL", default_value = "claude-3-5-sonnet-latest")]
    pub anthropic_model: String,

    /// Sampling temperature; provider default when unset.
    #[arg(long, env = "JYOTIR_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Maximum tokens requested from the model.
    #[arg(long, env = "JYOTIR_MAX_COMPLETION_TOKENS", default_value_t = 1200)]
    pub max_completion_tokens: usize,
}

/// Every external service the binaries talk to.
#[derive(Args, Debug, Clone)]
#[allow(missing_docs)]
pub struct ServiceArgs {
    #[command(flatten)]
    pub qdrant: QdrantArgs,

    #[command(flatten)]
    pub embedder: EmbedderArgs,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// OpenAI API key, used by the OpenAI embedder and generator.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints.
    #[arg(long, env = "JYOTIR_OPENAI_BASE", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Seconds before any outbound HTTP request times out.
    #[arg(long, env = "JYOTIR_HTTP_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl ServiceArgs {
    /// Timeout applied to every outbound client.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Client for the configured collection.
    pub fn store(&self) -> Result<QdrantStore> {
        QdrantStore::new(
            &self.qdrant.qdrant_url,
            self.qdrant.qdrant_api_key.as_deref(),
            self.qdrant.collection.clone(),
            self.timeout(),
        )
    }

    /// The configured embedder.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        let args = &self.embedder;
        match args.embedder {
            EmbedderKind::Qdrant => {
                let key = self
                    .qdrant
                    .qdrant_api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("QDRANT_API_KEY must be set for the Qdrant embedder"))?;
                let endpoint = match &args.inference_url {
                    Some(url) => url.clone(),
                    None => format!(
                        "{}/inference/text",
                        self.qdrant.qdrant_url.trim_end_matches('/')
                    ),
                };
                let model = args
                    .embedding_model
                    .clone()
                    .unwrap_or_else(|| "qdrant/all-MiniLM-L6-v2".to_string());
                Ok(Arc::new(QdrantEmbedder::new(
                    key,
                    &endpoint,
                    model,
                    self.timeout(),
                )?))
            }
            EmbedderKind::Openai => {
                let key = self.openai_key("embedder")?;
                let model = args
                    .embedding_model
                    .clone()
                    .unwrap_or_else(|| "text-embedding-3-small".to_string());
                Ok(Arc::new(OpenAiEmbedder::new(
                    key,
                    &self.openai_base()?,
                    model,
                    args.embedding_dimensions,
                    self.timeout(),
                )?))
            }
        }
    }

    /// The configured generator.
    pub fn generator(&self) -> Result<Arc<dyn Generator>> {
        let args = &self.generator;
        let sampling = Sampling {
            temperature: args.temperature,
            max_tokens: args.max_completion_tokens.max(1),
        };
        match args.llm_provider {
            LlmProvider::Openai => Ok(Arc::new(OpenAiGenerator::new(
                self.openai_key("generator")?.to_string(),
                &self.openai_base()?,
                args.openai_model.clone(),
                sampling,
                self.timeout(),
            )?)),
            LlmProvider::Anthropic => {
                let key = args.anthropic_api_key.clone().ok_or_else(|| {
                    anyhow!("ANTHROPIC_API_KEY must be set for the Anthropic provider")
                })?;
                Ok(Arc::new(AnthropicGenerator::new(
                    &key,
                    &http_base(&args.anthropic_base_url, "Anthropic")?,
                    args.anthropic_model.clone(),
                    sampling,
                    self.timeout(),
                )?))
            }
        }
    }

    fn openai_key(&self, role: &str) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY must be set for the OpenAI {role}"))
    }

    fn openai_base(&self) -> Result<String> {
        http_base(&self.openai_base_url, "OpenAI")
    }
}

fn http_base(raw: &str, service: &str) -> Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid {service} base URL {raw}"))?;
    anyhow::ensure!(
        matches!(url.scheme(), "http" | "https"),
        "{service} base URL must be http(s)"
    );
    Ok(raw.trim_end_matches('/').to_string())
}
