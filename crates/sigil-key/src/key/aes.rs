use std::{any::Any, fmt};

use sha2::{Digest, Sha256};
use sigil_crypto::symmetric::cbc;
use zeroize::Zeroizing;

use super::{Key, KeyAlgorithm, Ski};
use crate::error::{Error, Result};

/// AES key (128, 192 or 256 bits)
#[derive(Clone)]
pub struct AesKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl AesKey {
    /// Generate a fresh key for an AES algorithm
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        let len = algorithm
            .aes_key_len()
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("{} is not AES", algorithm)))?;
        let bytes = cbc::random_bytes(len)?;
        Ok(Self {
            bytes: Zeroizing::new(bytes),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self {
                bytes: Zeroizing::new(bytes.to_vec()),
            }),
            n => Err(Error::KeyError(format!("invalid AES key length: {} bytes", n))),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesKey")
            .field("algorithm", &self.algorithm())
            .field("ski", &self.ski())
            .finish_non_exhaustive()
    }
}

impl Key for AesKey {
    fn algorithm(&self) -> KeyAlgorithm {
        match self.bytes.len() {
            16 => KeyAlgorithm::Aes128,
            24 => KeyAlgorithm::Aes192,
            _ => KeyAlgorithm::Aes256,
        }
    }

    /// SHA-256 over a 0x01 tag byte and the key
    fn ski(&self) -> Ski {
        let mut hasher = Sha256::new();
        hasher.update([0x01]);
        hasher.update(self.bytes.as_slice());
        Ski(hasher.finalize().into())
    }

    fn is_private(&self) -> bool {
        true
    }

    fn public_key(&self) -> Result<Box<dyn Key>> {
        Err(Error::KeyError("symmetric keys have no public half".into()))
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_lengths() {
        for (algorithm, len) in [
            (KeyAlgorithm::Aes128, 16),
            (KeyAlgorithm::Aes192, 24),
            (KeyAlgorithm::Aes256, 32),
        ] {
            let key = AesKey::generate(algorithm).unwrap();
            assert_eq!(key.as_bytes().len(), len);
            assert_eq!(key.algorithm(), algorithm);
            assert!(key.is_symmetric());
        }
        assert!(AesKey::generate(KeyAlgorithm::Sm2).is_err());
    }

    #[test]
    fn test_from_bytes() {
        assert!(AesKey::from_bytes(&[1u8; 24]).is_ok());
        assert!(AesKey::from_bytes(&[1u8; 15]).is_err());
        assert!(AesKey::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_ski_depends_on_key() {
        let a = AesKey::from_bytes(&[1u8; 16]).unwrap();
        let b = AesKey::from_bytes(&[2u8; 16]).unwrap();
        assert_ne!(a.ski(), b.ski());
        assert_eq!(a.ski(), AesKey::from_bytes(&[1u8; 16]).unwrap().ski());
    }

    #[test]
    fn test_no_public_half() {
        let key = AesKey::from_bytes(&[9u8; 32]).unwrap();
        assert!(key.public_key().is_err());
        assert_eq!(key.to_der().unwrap(), vec![9u8; 32]);
    }

    #[test]
    fn test_debug_hides_bytes() {
        let key = AesKey::from_bytes(&[0x5a; 16]).unwrap();
        let text = format!("{:?}", key);
        assert!(text.contains("Aes128"));
        assert!(!text.contains(&hex::encode([0x5a; 16])));
    }
}
