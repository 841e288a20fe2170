//! Chain Hashing
//!
//! SHA-256 helpers for the commitment chain:
//! - Seeding the first element from (secret, public seed)
//! - Stepping from one element to the next
//! - Hex rendering used both for display and as hash input

use sha2::{Sha256, Digest};

/// Digest output type (256 bits / 32 bytes)
pub type ChainHash = [u8; 32];

/// Width of a chain digest in bits.
pub const DIGEST_BITS: u64 = 256;

/// Name of the digest algorithm, published with the commitment.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// Incremental hasher for chain elements.
///
/// Every chain step is `SHA256(secret ∥ input)`, so the secret is
/// always absorbed first.
pub struct ChainHasher {
    hasher: Sha256,
}

impl ChainHasher {
    /// Create a hasher keyed with the commitment secret.
    pub fn keyed(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        Self { hasher }
    }

    /// Update with a string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.hasher.update(value.as_bytes());
    }

    /// Update with the lowercase hex text of a previous element.
    #[inline]
    pub fn update_hash_hex(&mut self, hash: &ChainHash) {
        self.hasher.update(hex::encode(hash).as_bytes());
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> ChainHash {
        self.hasher.finalize().into()
    }
}

/// First element of a chain: `SHA256(secret ∥ seed)`.
pub fn seed_hash(secret: &str, seed: &str) -> ChainHash {
    let mut hasher = ChainHasher::keyed(secret);
    hasher.update_str(seed);
    hasher.finalize()
}

/// Next element of a chain: `SHA256(secret ∥ hex(previous))`.
#[inline]
pub fn chain_step(secret: &str, previous: &ChainHash) -> ChainHash {
    let mut hasher = ChainHasher::keyed(secret);
    hasher.update_hash_hex(previous);
    hasher.finalize()
}

/// Lowercase hex rendering of a digest.
pub fn to_hex(hash: &ChainHash) -> String {
    hex::encode(hash)
}

/// Parse a 64-character hex digest.
pub fn from_hex(s: &str) -> Option<ChainHash> {
    let bytes = hex::decode(s).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Some(arr)
}

/// Serde adapter rendering a [`ChainHash`] as a hex string.
pub mod hex_serde {
    use super::{from_hex, to_hex, ChainHash};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as lowercase hex.
    pub fn serialize<S: Serializer>(hash: &ChainHash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(hash))
    }

    /// Deserialize from a 64-character hex string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ChainHash, D::Error> {
        let s = String::deserialize(deserializer)?;
        from_hex(&s).ok_or_else(|| serde::de::Error::custom("expected 64 hex characters"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_hash_matches_plain_concatenation() {
        let direct: ChainHash = Sha256::digest(b"kseed").into();
        assert_eq!(seed_hash("k", "seed"), direct);
    }

    #[test]
    fn test_chain_step_hashes_hex_text() {
        let prev = seed_hash("k", "seed");
        let input = format!("k{}", to_hex(&prev));
        let direct: ChainHash = Sha256::digest(input.as_bytes()).into();

        assert_eq!(chain_step("k", &prev), direct);
    }

    #[test]
    fn test_secret_separates_chains() {
        let prev = [7u8; 32];
        assert_ne!(chain_step("a", &prev), chain_step("b", &prev));
    }

    #[test]
    fn test_known_vector() {
        // sha256("abc")
        let hash = seed_hash("a", "bc");
        assert_eq!(
            to_hex(&hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hex_parse() {
        let hash = seed_hash("k", "0");
        assert_eq!(from_hex(&to_hex(&hash)), Some(hash));
        assert_eq!(from_hex("abcd"), None);
        assert_eq!(from_hex("zz"), None);
    }
}
