//! Signer adapters
//!
//! [`build_signer`] binds the private half of an opaque [`Key`] to the
//! [`SignatureHandle`] contract. Adapters are looked up by algorithm in a
//! [`SignerRegistry`]; an algorithm without an adapter cannot sign.

use std::{collections::HashMap, fmt};

use sigil_crypto::{SignError, SignatureAlgorithm, SignatureHandle, Sm2Config, VerifyError};

use crate::error::{Error, Result};
use crate::key::{EcPrivateKey, EcPublicKey, Key, KeyAlgorithm, Ski};

/// Builds a handle from a key of one algorithm
pub type SignerBuilder = fn(&dyn Key, &Sm2Config) -> Result<Box<dyn SignatureHandle>>;

fn ec_signer(key: &dyn Key, sm2_config: &Sm2Config) -> Result<Box<dyn SignatureHandle>> {
    if let Some(private) = key.as_any().downcast_ref::<EcPrivateKey>() {
        return private.to_handle(sm2_config);
    }
    if key.as_any().is::<EcPublicKey>() {
        return Err(Error::KeyError(format!(
            "{} key {} has no private half to sign with",
            key.algorithm(),
            key.ski()
        )));
    }
    Err(Error::KeyError(format!(
        "{} key {} is not an elliptic curve key",
        key.algorithm(),
        key.ski()
    )))
}

// ============================================================================
// Registry
// ============================================================================

/// Signer adapters by algorithm
#[derive(Clone)]
pub struct SignerRegistry {
    builders: HashMap<KeyAlgorithm, SignerBuilder>,
    sm2_config: Sm2Config,
}

impl SignerRegistry {
    /// Registry with no adapters
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
            sm2_config: Sm2Config::default(),
        }
    }

    /// Uid used by SM2 signers built from here on
    pub fn with_sm2_config(mut self, config: Sm2Config) -> Self {
        self.sm2_config = config;
        self
    }

    /// Add or replace the adapter for `algorithm`
    pub fn register(&mut self, algorithm: KeyAlgorithm, builder: SignerBuilder) {
        self.builders.insert(algorithm, builder);
    }

    pub fn supports(&self, algorithm: KeyAlgorithm) -> bool {
        self.builders.contains_key(&algorithm)
    }

    pub fn build_signer(&self, key: &dyn Key) -> Result<KeySigner> {
        let algorithm = key.algorithm();
        let builder = self.builders.get(&algorithm).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("no signer registered for {}", algorithm))
        })?;
        let handle = builder(key, &self.sm2_config)?;
        let ski = key.ski();
        tracing::debug!(%ski, %algorithm, "built signer");
        Ok(KeySigner {
            ski,
            algorithm,
            handle,
        })
    }
}

impl Default for SignerRegistry {
    /// Adapters for P-256, secp256k1 and SM2
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(KeyAlgorithm::EcdsaP256, ec_signer);
        registry.register(KeyAlgorithm::EcdsaSecp256k1, ec_signer);
        registry.register(KeyAlgorithm::Sm2, ec_signer);
        registry
    }
}

impl fmt::Debug for SignerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut algorithms: Vec<String> = self.builders.keys().map(|a| a.to_string()).collect();
        algorithms.sort();
        f.debug_struct("SignerRegistry")
            .field("algorithms", &algorithms)
            .field("sm2_config", &self.sm2_config)
            .finish()
    }
}

/// [`SignerRegistry::build_signer`] on the default registry
pub fn build_signer(key: &dyn Key) -> Result<KeySigner> {
    SignerRegistry::default().build_signer(key)
}

// ============================================================================
// Signer
// ============================================================================

/// A signature handle bound to a stored key
pub struct KeySigner {
    ski: Ski,
    algorithm: KeyAlgorithm,
    handle: Box<dyn SignatureHandle>,
}

impl KeySigner {
    /// SKI of the key this signer is bound to
    pub fn ski(&self) -> Ski {
        self.ski
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for KeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySigner")
            .field("ski", &self.ski)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SignatureHandle for KeySigner {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.handle.algorithm()
    }

    fn hash(&self, message: &[u8]) -> Vec<u8> {
        self.handle.hash(message)
    }

    fn sign(&self, digest: &[u8]) -> std::result::Result<Vec<u8>, SignError> {
        self.handle.sign(digest)
    }

    fn verify(&self, signature: &[u8], digest: &[u8]) -> std::result::Result<bool, VerifyError> {
        self.handle.verify(signature, digest)
    }

    fn can_sign(&self) -> bool {
        self.handle.can_sign()
    }

    fn public_key_der(&self) -> sigil_crypto::Result<Vec<u8>> {
        self.handle.public_key_der()
    }
}

#[cfg(test)]
mod tests {
    use sigil_crypto::{verify_message, KeyCurve};

    use super::*;
    use crate::key::AesKey;

    #[test]
    fn test_build_signer_for_each_curve() {
        for curve in [KeyCurve::P256, KeyCurve::Secp256k1, KeyCurve::Sm2] {
            let key = EcPrivateKey::generate(curve);
            let signer = build_signer(&key).unwrap();
            assert_eq!(signer.ski(), key.ski());
            assert_eq!(signer.algorithm(), SignatureAlgorithm::from(curve));
            assert!(signer.can_sign());

            let digest = signer.hash(b"payload");
            let signature = signer.sign(&digest).unwrap();
            assert!(signer.verify(&signature, &digest).unwrap());
            assert!(verify_message(&signer, b"payload", &signature).unwrap());
        }
    }

    #[test]
    fn test_aes_key_has_no_signer() {
        let key = AesKey::from_bytes(&[1u8; 16]).unwrap();
        let err = build_signer(&key).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_public_key_cannot_sign() {
        let key = EcPrivateKey::generate(KeyCurve::P256);
        let public = key.public_key().unwrap();
        let err = build_signer(public.as_ref()).unwrap_err();
        assert!(matches!(err, Error::KeyError(_)));
    }

    #[test]
    fn test_empty_registry() {
        let registry = SignerRegistry::empty();
        assert!(!registry.supports(KeyAlgorithm::Sm2));
        let key = EcPrivateKey::generate(KeyCurve::Sm2);
        assert!(matches!(
            registry.build_signer(&key),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_registry_sm2_uid() {
        let key = EcPrivateKey::generate(KeyCurve::Sm2);
        let default_signer = build_signer(&key).unwrap();
        let custom = SignerRegistry::default()
            .with_sm2_config(Sm2Config {
                uid: "alice@example.com".into(),
            })
            .build_signer(&key)
            .unwrap();

        let digest = custom.hash(b"uid bound");
        let signature = custom.sign(&digest).unwrap();
        assert!(custom.verify(&signature, &digest).unwrap());
        assert!(!default_signer.verify(&signature, &digest).unwrap());
    }
}
