//! Include-guard discovery and synthesis.
//!
//! Regenerating a header for an unchanged schema must not churn its guard
//! token, or every regeneration would spuriously invalidate include-based
//! build caching. So: reuse the token of an existing matching
//! `#ifndef` / `#define` pair, and otherwise derive a fresh token
//! deterministically from the output identifier.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::names::make_canonical;

static IFNDEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#ifndef\s+(\S+)$").unwrap());
static DEFINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#define\s+(\S+)$").unwrap());

/// Scan an existing header for its guard: an `#ifndef TOKEN` line whose
/// matching `#define TOKEN` arrives before any non-`#define` line resets
/// the scan.
pub fn read_guard(contents: &str) -> Option<String> {
    let mut candidate: Option<String> = None;
    for raw in contents.lines() {
        let line = raw.trim();
        if let Some(token) = candidate.take() {
            if let Some(caps) = DEFINE.captures(line) {
                if &caps[1] == token.as_str() {
                    return Some(token);
                }
                // a #define for something else keeps the candidate alive
                candidate = Some(token);
            }
        } else if let Some(caps) = IFNDEF.captures(line) {
            candidate = Some(caps[1].to_string());
        }
    }
    None
}

/// Fresh guard token for a header with no reusable guard: the
/// canonicalized header name plus a short hash of it, so repeated runs
/// over the same output target agree.
pub fn fresh_guard(header_name: &str) -> String {
    let stem = make_canonical(header_name, true);
    let digest = blake3::hash(header_name.as_bytes());
    let tag = digest.to_hex()[..16].to_uppercase();
    format!("{stem}_{tag}_H")
}

// ------------------------------- Tests ------------------------------------ //
