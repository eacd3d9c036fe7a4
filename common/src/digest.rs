//! Validated SHA-256 digest strings and content hashing.
//!
//! A [`Sha256Digest`] is always a 64-character lowercase hexadecimal string.
//! Mixed-case input is accepted and normalised at construction, so equality
//! on the wrapper gives the case-insensitive comparison that artifact
//! verification requires.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Chunk size for streaming file hashing.
const HASH_BUF_LEN: usize = 8192;

/// Errors arising from digest validation.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// The supplied string is not a well-formed SHA-256 hex digest.
    #[error("malformed SHA-256 digest: {reason}")]
    Malformed {
        /// Description of the validation failure.
        reason: String,
    },
}

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use outfitter_common::digest::Sha256Digest;
///
/// let upper = "A".repeat(64);
/// let digest: Sha256Digest = upper.as_str().try_into().unwrap();
/// assert_eq!(digest.as_str(), "a".repeat(64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Return the digest as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, DigestError> {
        validate_sha256(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, DigestError> {
        validate_sha256(&value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> Result<(), DigestError> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestError::Malformed {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestError::Malformed {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    Ok(())
}

/// Compute the SHA-256 digest of the file at `path`.
///
/// Reads the file in chunks so large downloads are hashed without loading
/// them into memory.
///
/// # Errors
///
/// Returns any I/O error encountered while reading the file.
pub fn hash_file(path: &Path) -> std::io::Result<Sha256Digest> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUF_LEN];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Sha256Digest(format!("{:x}", hasher.finalize())))
}

/// Compute the SHA-256 digest of an in-memory byte slice.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Sha256Digest(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_digest() -> String {
        "a".repeat(64)
    }

    #[test]
    fn accepts_valid_sixty_four_char_hex() {
        let digest = Sha256Digest::try_from(valid_digest().as_str());
        assert!(digest.is_ok());
    }

    #[test]
    fn normalises_uppercase_hex() {
        let upper = "AB".repeat(32);
        let digest = Sha256Digest::try_from(upper.as_str()).expect("valid digest");
        assert_eq!(digest.as_str(), "ab".repeat(32));
    }

    #[test]
    fn mixed_case_digests_compare_equal() {
        let lower = Sha256Digest::try_from("ab".repeat(32)).expect("valid");
        let upper = Sha256Digest::try_from("AB".repeat(32)).expect("valid");
        assert_eq!(lower, upper);
    }

    #[rstest]
    #[case::too_short("abcdef")]
    #[case::empty("")]
    fn rejects_wrong_length(#[case] value: &str) {
        let result = Sha256Digest::try_from(value);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_too_long() {
        let long = "a".repeat(65);
        assert!(Sha256Digest::try_from(long.as_str()).is_err());
    }

    #[test]
    fn rejects_non_hex_characters() {
        let mut bad = "a".repeat(63);
        bad.push('g');
        let result = Sha256Digest::try_from(bad.as_str());
        assert!(matches!(result, Err(DigestError::Malformed { .. })));
    }

    #[test]
    fn display_shows_full_digest() {
        let hex = valid_digest();
        let digest = Sha256Digest::try_from(hex.as_str()).expect("known good");
        assert_eq!(format!("{digest}"), hex);
    }

    #[test]
    fn hash_bytes_matches_known_vector() {
        // SHA-256 of the empty string.
        let digest = hash_bytes(b"");
        assert_eq!(
            digest.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("content.bin");
        std::fs::write(&path, b"outfitter test content").expect("write");

        let from_file = hash_file(&path).expect("hash file");
        let from_bytes = hash_bytes(b"outfitter test content");
        assert_eq!(from_file, from_bytes);
    }
}
