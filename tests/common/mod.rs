#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use jyotir_rag::{Embedder, Generator, Pipeline, ScoredUnit, Unit, UnitSearch};

pub struct FakeEmbedder {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Embedder for FakeEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("embedder unreachable"));
        }
        Ok(vec![0.1; 384])
    }
}

pub struct FakeStore {
    pub units: Vec<Unit>,
    pub fail: bool,
    pub last_top_k: Mutex<Option<usize>>,
}

impl FakeStore {
    pub fn with_units(units: Vec<Unit>) -> Self {
        Self {
            units,
            fail: false,
            last_top_k: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            units: Vec::new(),
            fail: true,
            last_top_k: Mutex::new(None),
        }
    }
}

impl UnitSearch for FakeStore {
    fn search(&self, _vector: &[f32], top_k: usize) -> Result<Vec<ScoredUnit>> {
        *self.last_top_k.lock().unwrap() = Some(top_k);
        if self.fail {
            return Err(anyhow!("qdrant returned 503"));
        }
        Ok(self
            .units
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, unit)| ScoredUnit {
                unit: unit.clone(),
                score: 1.0 - rank as f32 * 0.1,
            })
            .collect())
    }
}

pub struct FakeGenerator {
    pub reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Generator for FakeGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|message| anyhow!(message))
    }
}

pub fn witness_units() -> Vec<Unit> {
    vec![
        Unit::new("Talk1", "3", "The witness is never an object."),
        Unit::new("Talk2", "4", "Light by which all else is known."),
    ]
}

pub fn pipeline(
    embedder: Arc<FakeEmbedder>,
    store: Arc<FakeStore>,
    generator: Arc<FakeGenerator>,
) -> Pipeline {
    Pipeline::new(embedder, store, generator)
}
