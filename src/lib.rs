#![warn(missing_docs)]
//! Retrieval-augmented answers over embedded lecture units, with
//! citation checking against the retrieved sources.

pub mod citations;
pub mod config;
pub mod context;
pub mod embedder;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod server;
pub mod unit;
pub mod vector_store;

pub use citations::sanitize_citations;
pub use context::{assemble_context, AssembledContext};
pub use embedder::Embedder;
pub use error::PipelineError;
pub use generator::Generator;
pub use pipeline::{Answer, Pipeline, NO_MATERIAL_ANSWER};
pub use prompt::PromptComposer;
pub use unit::{ScoredUnit, Unit};
pub use vector_store::{QdrantStore, UnitSearch, UnitSink};
