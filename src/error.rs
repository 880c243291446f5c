//! Errors surfaced by the question-answering pipeline.

/// Failure of one `/ask` request.
///
/// Callers treat every collaborator variant the same way; the variants only
/// exist so operators can see which service failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The question was missing or blank; nothing external was called.
    #[error("question must not be empty")]
    EmptyQuestion,

    /// The embedder failed to vectorize the question.
    #[error("embedding failed: {0:#}")]
    Embedding(#[source] anyhow::Error),

    /// The vector store search failed.
    #[error("vector search failed: {0:#}")]
    Search(#[source] anyhow::Error),

    /// The generator failed to produce an answer.
    #[error("generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),
}

impl PipelineError {
    /// Whether the failure is the caller's fault rather than a service fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyQuestion)
    }
}
