use std::fmt::Write;

use sha2::{Digest, Sha256};

/// Content fingerprint used as an identity component in report keys.
///
/// SHA-256 of the UTF-8 bytes rendered as uppercase hex without separators.
/// Empty text maps to the empty string without hashing, which callers rely on
/// when a fragment carries no text.
pub fn hash(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let digest = Sha256::digest(text.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}
