//! # Sigil
//!
//! Unified signing handles over ECDSA P-256, ECDSA secp256k1 and SM2/SM3,
//! AES-CBC with PKCS#7 padding, and a key generation framework.
//!
//! ## Crates
//!
//! - `sigil_crypto` - key loading, algorithm handles, AES-CBC
//! - `sigil_key` - keys, key stores, signer adapters

pub use sigil_crypto;
pub use sigil_key;
