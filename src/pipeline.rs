//! Question answering: embed, retrieve, assemble, compose, generate, sanitize.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::citations::sanitize_citations;
use crate::context::assemble_context;
use crate::embedder::Embedder;
use crate::error::PipelineError;
use crate::generator::Generator;
use crate::prompt::PromptComposer;
use crate::unit::Unit;
use crate::vector_store::UnitSearch;

/// Answer returned when retrieval comes back empty.
pub const NO_MATERIAL_ANSWER: &str = "No relevant teachings found in the Qdrant collection.";

/// Default number of units retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Outcome of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    /// The generator answered from retrieved units.
    Grounded {
        /// Question as asked.
        question: String,
        /// Sanitized answer text.
        answer: String,
        /// References available to the generator, in retrieval order.
        sources_used: Vec<String>,
    },
    /// Nothing was retrieved; no generation happened.
    NoMaterial {
        /// Always [`NO_MATERIAL_ANSWER`].
        answer: String,
    },
}

impl Answer {
    fn no_material() -> Self {
        Self::NoMaterial {
            answer: NO_MATERIAL_ANSWER.to_string(),
        }
    }

    /// Answer text of either variant.
    pub fn text(&self) -> &str {
        match self {
            Self::Grounded { answer, .. } | Self::NoMaterial { answer } => answer,
        }
    }
}

/// Request-independent pipeline wiring.
///
/// Built once at startup; collaborators are shared read-only, so one
/// pipeline serves concurrent requests without locking.
#[derive(Clone)]
pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn UnitSearch>,
    generator: Arc<dyn Generator>,
    composer: PromptComposer,
    top_k: usize,
}

impl Pipeline {
    /// Wires the pipeline with the default composer and top-k.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn UnitSearch>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            composer: PromptComposer::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Replaces the prompt composer.
    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Sets how many units are retrieved per question (at least one).
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Embedder used for questions; also serves health probes.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Answers one question. Every collaborator is called at most once.
    pub fn answer(&self, question: &str) -> Result<Answer, PipelineError> {
        if question.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }
        info!(question, "querying vector store");

        let vector = self
            .embedder
            .embed(question)
            .map_err(PipelineError::Embedding)?;
        let hits = self
            .store
            .search(&vector, self.top_k)
            .map_err(PipelineError::Search)?;
        debug!(hits = hits.len(), top_k = self.top_k, "retrieval finished");

        let units: Vec<Unit> = hits.into_iter().map(|hit| hit.unit).collect();
        let Some(context) = assemble_context(&units) else {
            info!("no units retrieved; returning fallback answer");
            return Ok(Answer::no_material());
        };

        let prompt = self
            .composer
            .compose(question, &context.text, &context.references);
        info!(sources = context.references.len(), "generating answer");
        let raw = self
            .generator
            .generate(&prompt)
            .map_err(PipelineError::Generation)?;

        let raw = raw.trim();
        let answer = sanitize_citations(raw, &context.references);
        if answer.len() != raw.len() {
            warn!(
                removed_bytes = raw.len().saturating_sub(answer.len()),
                "stripped citations outside the retrieved sources"
            );
        }
        Ok(Answer::Grounded {
            question: question.to_string(),
            answer,
            sources_used: context.references,
        })
    }
}
