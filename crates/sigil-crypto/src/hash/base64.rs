//! Standard base64 (RFC 4648, padded) used as the text transport form of
//! signatures.
//!
//! ```
//! use sigil_crypto::hash::base64;
//!
//! let encoded = base64::encode(b"Hello, World!");
//! assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
//! assert_eq!(base64::decode(&encoded).unwrap(), b"Hello, World!");
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::Result;

/// Encode bytes to standard base64 string with padding
pub fn encode<T: AsRef<[u8]>>(data: T) -> String {
    STANDARD.encode(data)
}

/// Decode standard base64 string to bytes
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded.trim())?)
}
