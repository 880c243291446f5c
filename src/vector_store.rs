//! Qdrant collection access over the REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::unit::{ScoredUnit, Unit};

/// Nearest-neighbour search over stored unit vectors.
pub trait UnitSearch: Send + Sync {
    /// Returns up to `top_k` units, most similar first.
    fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredUnit>>;
}

/// Write access used by ingestion.
pub trait UnitSink: Send + Sync {
    /// Name of the target collection.
    fn collection(&self) -> &str;

    /// Creates the collection for `vector_size`-dimensional vectors unless
    /// it exists; `true` when it was created.
    fn ensure_collection(&self, vector_size: usize) -> Result<bool>;

    /// Inserts or replaces one point.
    fn upsert(&self, id: u64, vector: Vec<f32>, payload: Map<String, Value>) -> Result<()>;
}

/// Blocking client bound to one Qdrant collection.
#[derive(Clone)]
pub struct QdrantStore {
    client: Client,
    base_url: String,
    collection: String,
}

impl QdrantStore {
    /// Builds a client for `collection` on the cluster at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("invalid Qdrant URL {base_url}"))?;
        anyhow::ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            "Qdrant URL must be http(s)"
        );
        let collection = collection.into();
        anyhow::ensure!(!collection.trim().is_empty(), "collection name is required");
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key).context("invalid Qdrant API key")?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Qdrant HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
        })
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    /// Whether the collection already exists.
    pub fn collection_exists(&self) -> Result<bool> {
        let url = self.collection_url("/exists");
        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("failed to call Qdrant at {url}"))?;
        let parsed: QdrantResponse<ExistsResult> = read_json(resp, "collection exists")?;
        Ok(parsed.result.exists)
    }
}

impl UnitSink for QdrantStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    // Cosine distance; existing points are never dropped.
    fn ensure_collection(&self, vector_size: usize) -> Result<bool> {
        anyhow::ensure!(vector_size > 0, "vector size must be positive");
        if self.collection_exists()? {
            return Ok(false);
        }
        let url = self.collection_url("");
        let body = CreateCollection {
            vectors: VectorParams {
                size: vector_size,
                distance: "Cosine",
            },
        };
        let resp = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .with_context(|| format!("failed to create Qdrant collection {}", self.collection))?;
        let _: QdrantResponse<Value> = read_json(resp, "create collection")?;
        Ok(true)
    }

    // Waits until the point is indexed.
    fn upsert(&self, id: u64, vector: Vec<f32>, payload: Map<String, Value>) -> Result<()> {
        let url = self.collection_url("/points?wait=true");
        let body = UpsertRequest {
            points: vec![PointStruct {
                id,
                vector,
                payload,
            }],
        };
        let resp = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .with_context(|| format!("failed to upsert into Qdrant collection {}", self.collection))?;
        let _: QdrantResponse<Value> = read_json(resp, "upsert points")?;
        Ok(())
    }
}

impl UnitSearch for QdrantStore {
    fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredUnit>> {
        let url = self.collection_url("/points/query");
        let body = QueryRequest {
            query: vector,
            limit: top_k,
            with_payload: true,
        };
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .with_context(|| format!("failed to query Qdrant collection {}", self.collection))?;
        let parsed: QdrantResponse<QueryResult> = read_json(resp, "query points")?;
        Ok(parsed.result.into_units())
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(
    resp: reqwest::blocking::Response,
    action: &str,
) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp
            .text()
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        anyhow::bail!("Qdrant {action} failed ({status}): {body}");
    }
    resp.json()
        .with_context(|| format!("failed to parse Qdrant {action} response"))
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct UpsertRequest {
    points: Vec<PointStruct>,
}

#[derive(Serialize)]
struct PointStruct {
    id: u64,
    vector: Vec<f32>,
    payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

impl QueryResult {
    fn into_units(self) -> Vec<ScoredUnit> {
        self.points
            .into_iter()
            .map(|point| ScoredUnit {
                unit: Unit::from_payload(&point.payload.unwrap_or_default()),
                score: point.score,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}
