//! Turns ranked units into the reference whitelist and prompt context.

use crate::unit::Unit;

/// Separator placed between unit blocks in the assembled context.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Context built for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// One reference per unit, in retrieval order. Duplicates are kept.
    pub references: Vec<String>,
    /// Bracketed reference + content blocks joined by [`BLOCK_SEPARATOR`].
    pub text: String,
}

/// Builds the context for a ranked list of units.
///
/// Returns `None` for an empty retrieval so callers can short-circuit
/// before any generation happens.
pub fn assemble_context(units: &[Unit]) -> Option<AssembledContext> {
    if units.is_empty() {
        return None;
    }
    let mut references = Vec::with_capacity(units.len());
    let mut blocks = Vec::with_capacity(units.len());
    for unit in units {
        let reference = unit.reference();
        blocks.push(format!("[{reference}]\n{}", unit.content));
        references.push(reference);
    }
    Some(AssembledContext {
        references,
        text: blocks.join(BLOCK_SEPARATOR),
    })
}
