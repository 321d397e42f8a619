//! Identity key derivation for stored places.
//!
//! # Responsibility
//! - Derive the storage key used for deduplication and store lookups.
//!
//! # Invariants
//! - The key is a pure function of `name` and `formatted_address`.
//! - The key is 32 lowercase hex characters and therefore filesystem-safe.
//! - Derivation is total: every string pair yields a key.

use crate::model::place::Place;
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ &_=+:]").expect("valid separator regex"));
static ILLEGAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9\-.]").expect("valid illegal-char regex"));

/// Returns the identity key of `place`.
pub fn identity_key(place: &Place) -> String {
    identity_key_for(&place.name, &place.formatted_address)
}

/// Returns the identity key for a raw `(name, address)` pair.
pub fn identity_key_for(name: &str, formatted_address: &str) -> String {
    let base = sanitize_base_name(&format!("{name}_{formatted_address}"));
    format!("{:x}", md5::compute(base.as_bytes()))
}

/// Reduces `value` to an ASCII file-name-safe token.
///
/// Joining characters become `-`, everything outside `[A-Za-z0-9.-]` is
/// dropped, then double dashes are collapsed once, left to right.
pub fn sanitize_base_name(value: &str) -> String {
    let joined = SEPARATOR_RE.replace_all(value, "-");
    let legal = ILLEGAL_RE.replace_all(&joined, "");
    legal.replace("--", "-")
}
