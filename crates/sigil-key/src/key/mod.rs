//! Opaque keys
//!
//! A [`Key`] is addressed by its [`Ski`], a SHA-256 identifier derived from
//! the key bytes. Elliptic curve keys hash the uncompressed public point, so
//! a private key and its public half share one SKI.

mod aes;
mod ecc;

use std::{any::Any, fmt};

use serde::{Deserialize, Serialize};
use sigil_crypto::{KeyCurve, SignatureAlgorithm};

pub use self::aes::AesKey;
pub use self::ecc::{EcPrivateKey, EcPublicKey};
use crate::error::{Error, Result};

// ============================================================================
// Algorithm
// ============================================================================

/// Algorithms a [`Key`] can belong to
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    EcdsaP256,
    EcdsaSecp256k1,
    Sm2,
    Aes128,
    Aes192,
    Aes256,
}

impl KeyAlgorithm {
    /// Curve of an elliptic curve algorithm
    pub const fn curve(&self) -> Option<KeyCurve> {
        match self {
            KeyAlgorithm::EcdsaP256 => Some(KeyCurve::P256),
            KeyAlgorithm::EcdsaSecp256k1 => Some(KeyCurve::Secp256k1),
            KeyAlgorithm::Sm2 => Some(KeyCurve::Sm2),
            KeyAlgorithm::Aes128 | KeyAlgorithm::Aes192 | KeyAlgorithm::Aes256 => None,
        }
    }

    /// Key length in bytes of an AES algorithm
    pub const fn aes_key_len(&self) -> Option<usize> {
        match self {
            KeyAlgorithm::Aes128 => Some(16),
            KeyAlgorithm::Aes192 => Some(24),
            KeyAlgorithm::Aes256 => Some(32),
            _ => None,
        }
    }

    pub const fn is_symmetric(&self) -> bool {
        self.aes_key_len().is_some()
    }

    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        self.curve().map(SignatureAlgorithm::from)
    }
}

impl From<KeyCurve> for KeyAlgorithm {
    fn from(curve: KeyCurve) -> Self {
        match curve {
            KeyCurve::P256 => KeyAlgorithm::EcdsaP256,
            KeyCurve::Secp256k1 => KeyAlgorithm::EcdsaSecp256k1,
            KeyCurve::Sm2 => KeyAlgorithm::Sm2,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyAlgorithm::EcdsaP256 => "ECDSA-P256",
            KeyAlgorithm::EcdsaSecp256k1 => "ECDSA-secp256k1",
            KeyAlgorithm::Sm2 => "SM2",
            KeyAlgorithm::Aes128 => "AES-128",
            KeyAlgorithm::Aes192 => "AES-192",
            KeyAlgorithm::Aes256 => "AES-256",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Subject Key Identifier
// ============================================================================

/// Subject key identifier: SHA-256 over the key bytes
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Ski(pub [u8; 32]);

impl Ski {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(text: &str) -> Result<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(text, &mut out)
            .map_err(|e| Error::EncodingError(format!("invalid SKI hex: {}", e)))?;
        Ok(Ski(out))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ski({})", self.to_hex())
    }
}

// ============================================================================
// Key
// ============================================================================

/// Opaque key material
pub trait Key: Send + Sync + fmt::Debug {
    fn algorithm(&self) -> KeyAlgorithm;

    /// Stable identifier used for store lookups
    fn ski(&self) -> Ski;

    fn is_symmetric(&self) -> bool {
        self.algorithm().is_symmetric()
    }

    fn is_private(&self) -> bool;

    /// Public half of an asymmetric key
    fn public_key(&self) -> Result<Box<dyn Key>>;

    /// Serialized form: PKCS#8 for private keys, SPKI for public keys,
    /// raw bytes for AES
    fn to_der(&self) -> Result<Vec<u8>>;

    fn as_any(&self) -> &dyn Any;
}

/// Rebuild a key from its [`Key::to_der`] form
pub fn decode_key(algorithm: KeyAlgorithm, private: bool, der: &[u8]) -> Result<Box<dyn Key>> {
    match (algorithm.curve(), private) {
        (Some(curve), true) => Ok(Box::new(EcPrivateKey::from_pkcs8_der(curve, der)?)),
        (Some(curve), false) => Ok(Box::new(EcPublicKey::from_spki_der(curve, der)?)),
        (None, _) => {
            let key = AesKey::from_bytes(der)?;
            if key.algorithm() != algorithm {
                return Err(Error::KeyError(format!(
                    "{} key bytes do not match {}",
                    key.algorithm(),
                    algorithm
                )));
            }
            Ok(Box::new(key))
        }
    }
}

// ============================================================================
// Generation options
// ============================================================================

/// Options for [`crate::key_gen`]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KeyGenOpts {
    pub algorithm: KeyAlgorithm,
    /// Caller's hint that the key is meant for a single session. It is
    /// logged at generation and does not change how the key is generated
    /// or whether [`crate::request_key`] stores it.
    #[serde(default)]
    pub ephemeral: bool,
}

impl KeyGenOpts {
    pub fn new(algorithm: KeyAlgorithm) -> Self {
        Self {
            algorithm,
            ephemeral: false,
        }
    }

    pub fn ephemeral(algorithm: KeyAlgorithm) -> Self {
        Self {
            algorithm,
            ephemeral: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_properties() {
        assert_eq!(KeyAlgorithm::Sm2.curve(), Some(KeyCurve::Sm2));
        assert_eq!(
            KeyAlgorithm::EcdsaSecp256k1.signature_algorithm(),
            Some(SignatureAlgorithm::EcdsaSecp256k1)
        );
        assert!(KeyAlgorithm::Aes192.is_symmetric());
        assert_eq!(KeyAlgorithm::Aes256.aes_key_len(), Some(32));
        assert_eq!(KeyAlgorithm::Aes128.signature_algorithm(), None);
    }

    #[test]
    fn test_ski_hex() {
        let ski = Ski([0xab; 32]);
        assert_eq!(Ski::from_hex(&ski.to_hex()).unwrap(), ski);
        assert!(Ski::from_hex("abcd").is_err());
    }

    #[test]
    fn test_keygen_opts_json() {
        let opts: KeyGenOpts = serde_json::from_str(r#"{"algorithm":"Sm2"}"#).unwrap();
        assert_eq!(opts, KeyGenOpts::new(KeyAlgorithm::Sm2));
        assert!(KeyGenOpts::ephemeral(KeyAlgorithm::Aes128).ephemeral);
    }

    #[test]
    fn test_decode_key_round_trip() {
        let private = EcPrivateKey::generate(KeyCurve::Secp256k1);
        let decoded = decode_key(KeyAlgorithm::EcdsaSecp256k1, true, &private.to_der().unwrap())
            .unwrap();
        assert_eq!(decoded.ski(), private.ski());
        assert!(decoded.is_private());

        let public = private.public_key().unwrap();
        let decoded =
            decode_key(KeyAlgorithm::EcdsaSecp256k1, false, &public.to_der().unwrap()).unwrap();
        assert_eq!(decoded.ski(), private.ski());
        assert!(!decoded.is_private());
    }

    #[test]
    fn test_decode_aes_length_mismatch() {
        assert!(decode_key(KeyAlgorithm::Aes256, true, &[0u8; 16]).is_err());
        assert!(decode_key(KeyAlgorithm::Aes128, true, &[0u8; 16]).is_ok());
    }
}
