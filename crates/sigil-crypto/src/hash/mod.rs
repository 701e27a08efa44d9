//! Digest functions used by the signature handles
//!
//! Each handle family fixes its own digest: SHA-256 for the two ECDSA
//! curves and SM3 for SM2. Base64 transport helpers live in [`base64`].

pub mod base64;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sm3::Sm3;

// ============================================================================
// Hash Algorithm Selection
// ============================================================================

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (32-byte output)
    #[default]
    Sha256,
    /// SM3 (32-byte output)
    Sm3,
}

impl HashAlgorithm {
    /// Output length in bytes
    pub const fn output_len(&self) -> usize {
        32
    }
}

// ============================================================================
// Generic Hash Functions
// ============================================================================

/// Compute hash of data using specified algorithm
///
/// # Example
/// ```
/// use sigil_crypto::hash::{hash, HashAlgorithm};
///
/// let digest = hash(b"abc", HashAlgorithm::Sm3);
/// assert_eq!(digest.len(), 32);
/// ```
pub fn hash(data: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => sha256(data).to_vec(),
        HashAlgorithm::Sm3 => sm3(data).to_vec(),
    }
}

/// Compute hash and return as hex string
pub fn hash_hex(data: &[u8], algorithm: HashAlgorithm) -> String {
    hex::encode(hash(data, algorithm))
}

/// SHA-256 digest
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SM3 digest
pub fn sm3(data: &[u8]) -> [u8; 32] {
    Sm3::digest(data).into()
}
