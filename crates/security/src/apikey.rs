//! API-key fingerprinting.
//!
//! The router never validates an API key against a database — the
//! Identity/Solver service does that authoritatively. The router only
//! computes a SHA-256 fingerprint for propagation and a short display
//! prefix safe to put in logs, per spec.md §3 and §4.3.

use sha2::{Digest, Sha256};

/// Number of leading characters of a raw API key considered safe to log.
pub const DISPLAY_PREFIX_LEN: usize = 11;

/// SHA-256 fingerprint of a raw API key.
pub fn fingerprint(raw_key: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hasher.finalize().into()
}

/// Lowercase hex encoding of a fingerprint, as propagated in `X-API-Key-Hash`.
pub fn fingerprint_hex(raw_key: &str) -> String {
    hex_encode(&fingerprint(raw_key))
}

/// The first [`DISPLAY_PREFIX_LEN`] characters of the raw key, or the whole
/// key if shorter. Never logs the remainder.
pub fn display_prefix(raw_key: &str) -> String {
    raw_key.chars().take(DISPLAY_PREFIX_LEN).collect()
}

/// Lowercase hex encoding of arbitrary bytes, exposed for callers that
/// already hold a fingerprint (e.g. `Principal::ApiKey`) rather than the
/// raw key.
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint("cp_abc123"), fingerprint("cp_abc123"));
    }

    #[test]
    fn different_keys_fingerprint_differently() {
        assert_ne!(fingerprint("cp_abc123"), fingerprint("cp_xyz789"));
    }

    #[test]
    fn fingerprint_hex_is_lowercase_and_64_chars() {
        let hex = fingerprint_hex("cp_abc123");
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn display_prefix_truncates_to_eleven_chars() {
        assert_eq!(display_prefix("cp_abcdefghijklmnop"), "cp_abcdefgh");
    }

    #[test]
    fn display_prefix_handles_short_keys() {
        assert_eq!(display_prefix("cp_ab"), "cp_ab");
    }

    #[test]
    fn display_prefix_never_contains_full_key() {
        let key = "cp_supersecretvalue1234567890";
        let prefix = display_prefix(key);
        assert!(prefix.len() < key.len());
        assert!(!prefix.contains("supersecretvalue"));
    }
}
