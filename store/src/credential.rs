//! Salted credential digests.
//!
//! Secrets never touch the database. Each record carries a random per-user
//! salt and the hex digest of an iterated SHA-256 chain over salt and
//! secret. Verification re-derives the digest from the candidate secret;
//! lookup misses derive against a fixed salt so both paths do the same
//! amount of work.

use sha2::{Digest, Sha256};

/// Rounds in the digest chain. Changing this invalidates every stored digest.
pub(crate) const ITERATIONS: u32 = 100_000;

/// Salt used when no record exists, so a miss still burns a full derivation.
pub(crate) const FALLBACK_SALT: &str = "0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f";

/// Generate a fresh 16-byte salt, hex-encoded.
pub(crate) fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::random();
    to_hex(&bytes)
}

/// Derive the stored digest for `secret` under `salt_hex`.
pub(crate) fn derive_digest(secret: &str, salt_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(secret.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..ITERATIONS {
        let mut hasher = Sha256::new();
        hasher.update(salt_hex.as_bytes());
        hasher.update(digest);
        digest = hasher.finalize();
    }

    to_hex(&digest)
}

/// Compare two hex digests, touching every byte before deciding.
///
/// Stored and derived digests share a fixed length; the length check only
/// rejects malformed input.
pub(crate) fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

// Manual hex encoding to avoid hex crate dependency
fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
