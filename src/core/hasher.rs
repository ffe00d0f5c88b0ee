//! Content integrity checks.
//!
//! Artifacts are addressed by content hash. When the identifier is a
//! SHA-256 digest, the fetched bytes are verified against it before
//! anything is written to the sandbox.

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

/// Computes the lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Returns `true` if `id` looks like a hex-encoded SHA-256 digest.
pub fn is_sha256_id(id: &str) -> bool {
    id.len() == SHA256_HEX_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Outcome of verifying fetched bytes against an artifact identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    /// The identifier is a SHA-256 digest and the bytes match it.
    Verified,
    /// The identifier is not a SHA-256 digest; nothing to check.
    Unchecked,
    /// The identifier is a SHA-256 digest and the bytes do not match.
    Mismatch {
        /// Digest of the fetched bytes.
        actual: String,
    },
}

/// Verifies `data` against `id` when `id` is a SHA-256 digest.
pub fn verify_content(id: &str, data: &[u8]) -> Integrity {
    if !is_sha256_id(id) {
        return Integrity::Unchecked;
    }

    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(id) {
        Integrity::Verified
    } else {
        Integrity::Mismatch { actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_is_sha256_id() {
        assert!(is_sha256_id(HELLO_SHA256));
        assert!(is_sha256_id(&HELLO_SHA256.to_uppercase()));
        assert!(!is_sha256_id("abc123"));
        assert!(!is_sha256_id(&format!("{}zz", &HELLO_SHA256[..62])));
    }

    #[test]
    fn test_verify_content() {
        assert_eq!(verify_content(HELLO_SHA256, b"hello"), Integrity::Verified);
        assert_eq!(
            verify_content(&HELLO_SHA256.to_uppercase(), b"hello"),
            Integrity::Verified
        );
        assert_eq!(verify_content("abc123", b"hello"), Integrity::Unchecked);
        assert!(matches!(
            verify_content(HELLO_SHA256, b"tampered"),
            Integrity::Mismatch { .. }
        ));
    }
}
