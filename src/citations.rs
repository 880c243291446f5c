//! Removes citations the generator invented.
//!
//! A citation looks like `(Ref: Class 3 – Talk1)`. Only citations whose
//! enclosed reference is exactly one of the request's references survive;
//! everything else is cut out together with the whitespace before it.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn citation_open() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\(Ref:(\s*)Class\s*\d+").expect("citation pattern compiles")
    })
}

fn empty_parens() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+\(\s*\)").expect("empty paren pattern compiles"))
}

/// Strips every citation whose reference is not in `valid_refs`.
///
/// Deterministic, total and idempotent: the cleanup repeats until the text
/// no longer changes, and every pass that changes the text shortens it.
pub fn sanitize_citations(answer: &str, valid_refs: &[String]) -> String {
    let whitelist: HashSet<&str> = valid_refs.iter().map(String::as_str).collect();
    let mut current = answer.to_string();
    loop {
        let next = sanitize_pass(&current, &whitelist);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_pass(text: &str, whitelist: &HashSet<&str>) -> String {
    let stripped = strip_invalid(text, whitelist);
    let mut collapsed = stripped;
    while empty_parens().is_match(&collapsed) {
        collapsed = empty_parens().replace_all(&collapsed, "").into_owned();
    }
    collapsed.trim().to_string()
}

fn strip_invalid(text: &str, whitelist: &HashSet<&str>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for caps in citation_open().captures_iter(text) {
        let (Some(open), Some(lead)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if open.start() < cursor {
            continue;
        }
        let body = &text[lead.end()..];
        let Some(span) = resolve(body, whitelist) else {
            // No closing paren anywhere; not a citation.
            continue;
        };
        let end = lead.end() + span.close + 1;
        if span.valid {
            out.push_str(&text[cursor..end]);
            cursor = end;
            continue;
        }
        let before = &text[cursor..open.start()];
        let kept = before.trim_end_matches([' ', '\t']);
        out.push_str(kept);
        let mut rest = end;
        if out.is_empty() || out.ends_with('\n') {
            rest += text[end..].len() - text[end..].trim_start_matches([' ', '\t']).len();
        } else if kept.len() < before.len() && needs_space(&out, &text[end..]) {
            out.push(' ');
        }
        cursor = rest;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Where a citation candidate ends and whether it survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    close: usize,
    valid: bool,
}

/// Resolves the candidate whose reference starts at `body`.
///
/// The balanced close is tried first so titles containing parens can be
/// cited exactly; otherwise the candidate ends at the first `)`. Invalid
/// candidates are cut to the balanced close when there is one. `None`
/// when no `)` follows at all.
fn resolve(body: &str, whitelist: &HashSet<&str>) -> Option<Span> {
    let first = body.find(')')?;
    let balanced = closing_paren(body);
    if let Some(close) = balanced {
        if whitelist.contains(body[..close].trim_end()) {
            return Some(Span { close, valid: true });
        }
    }
    if whitelist.contains(body[..first].trim_end()) {
        return Some(Span {
            close: first,
            valid: true,
        });
    }
    Some(Span {
        close: balanced.unwrap_or(first),
        valid: false,
    })
}

/// Offset of the paren closing a citation whose body starts at `body`,
/// counting nested parens inside the reference.
fn closing_paren(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn needs_space(out: &str, rest: &str) -> bool {
    let prev = out.chars().next_back();
    let next = rest.chars().next();
    match (prev, next) {
        (Some(prev), Some(next)) => {
            !prev.is_whitespace()
                && !next.is_whitespace()
                && !matches!(next, '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']')
        }
        _ => false,
    }
}
