use std::{any::Any, fmt};

use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use sigil_crypto::{
    EcdsaK256Handle, EcdsaP256Handle, KeyCurve, SignatureHandle, Sm2Config, Sm2Handle,
};

use super::{Key, KeyAlgorithm, Ski};
use crate::error::{Error, Result};

// ============================================================================
// Curve-tagged key material
// ============================================================================

#[derive(Clone)]
enum EcSecret {
    P256(p256::SecretKey),
    Secp256k1(k256::SecretKey),
    Sm2(sm2::SecretKey),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EcPublic {
    P256(p256::PublicKey),
    Secp256k1(k256::PublicKey),
    Sm2(sm2::PublicKey),
}

impl EcPublic {
    fn curve(&self) -> KeyCurve {
        match self {
            EcPublic::P256(_) => KeyCurve::P256,
            EcPublic::Secp256k1(_) => KeyCurve::Secp256k1,
            EcPublic::Sm2(_) => KeyCurve::Sm2,
        }
    }

    /// Uncompressed SEC1 point
    fn to_sec1(&self) -> Vec<u8> {
        match self {
            EcPublic::P256(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            EcPublic::Secp256k1(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            EcPublic::Sm2(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    fn ski(&self) -> Ski {
        Ski(Sha256::digest(self.to_sec1()).into())
    }

    fn to_spki_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            EcPublic::P256(pk) => pk.to_public_key_der(),
            EcPublic::Secp256k1(pk) => pk.to_public_key_der(),
            EcPublic::Sm2(pk) => pk.to_public_key_der(),
        }
        .map_err(|e| Error::EncodingError(format!("SPKI export failed: {}", e)))?;
        Ok(der.as_bytes().to_vec())
    }
}

// ============================================================================
// Private key
// ============================================================================

/// Elliptic curve private key (P-256, secp256k1 or SM2)
#[derive(Clone)]
pub struct EcPrivateKey {
    secret: EcSecret,
    public: EcPublic,
}

impl EcPrivateKey {
    /// Generate a new key on `curve`
    pub fn generate(curve: KeyCurve) -> Self {
        let secret = match curve {
            KeyCurve::P256 => EcSecret::P256(p256::SecretKey::random(&mut OsRng)),
            KeyCurve::Secp256k1 => EcSecret::Secp256k1(k256::SecretKey::random(&mut OsRng)),
            KeyCurve::Sm2 => EcSecret::Sm2(sm2::SecretKey::random(&mut OsRng)),
        };
        Self::from_secret(secret)
    }

    fn from_secret(secret: EcSecret) -> Self {
        let public = match &secret {
            EcSecret::P256(sk) => EcPublic::P256(sk.public_key()),
            EcSecret::Secp256k1(sk) => EcPublic::Secp256k1(sk.public_key()),
            EcSecret::Sm2(sk) => EcPublic::Sm2(sk.public_key()),
        };
        Self { secret, public }
    }

    /// Create from a big-endian private scalar
    pub fn from_scalar(curve: KeyCurve, scalar: &[u8]) -> Result<Self> {
        let err = |e: p256::elliptic_curve::Error| {
            Error::KeyError(format!("{:?} scalar rejected: {}", curve, e))
        };
        let secret = match curve {
            KeyCurve::P256 => EcSecret::P256(p256::SecretKey::from_slice(scalar).map_err(err)?),
            KeyCurve::Secp256k1 => {
                EcSecret::Secp256k1(k256::SecretKey::from_slice(scalar).map_err(err)?)
            }
            KeyCurve::Sm2 => EcSecret::Sm2(sm2::SecretKey::from_slice(scalar).map_err(err)?),
        };
        Ok(Self::from_secret(secret))
    }

    /// Import from PKCS#8 DER
    pub fn from_pkcs8_der(curve: KeyCurve, der: &[u8]) -> Result<Self> {
        let err = |e: pkcs8::Error| {
            Error::KeyError(format!("{:?} PKCS#8 import failed: {}", curve, e))
        };
        let secret = match curve {
            KeyCurve::P256 => EcSecret::P256(p256::SecretKey::from_pkcs8_der(der).map_err(err)?),
            KeyCurve::Secp256k1 => {
                EcSecret::Secp256k1(k256::SecretKey::from_pkcs8_der(der).map_err(err)?)
            }
            KeyCurve::Sm2 => EcSecret::Sm2(sm2::SecretKey::from_pkcs8_der(der).map_err(err)?),
        };
        Ok(Self::from_secret(secret))
    }

    pub fn curve(&self) -> KeyCurve {
        self.public.curve()
    }

    pub fn public(&self) -> EcPublicKey {
        EcPublicKey {
            public: self.public,
        }
    }

    /// Export the private key as PKCS#8 DER
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let der = match &self.secret {
            EcSecret::P256(sk) => sk.to_pkcs8_der(),
            EcSecret::Secp256k1(sk) => sk.to_pkcs8_der(),
            EcSecret::Sm2(sk) => sk.to_pkcs8_der(),
        }
        .map_err(|e| Error::EncodingError(format!("PKCS#8 export failed: {}", e)))?;
        Ok(der.as_bytes().to_vec())
    }

    /// Bind this key to a signature handle of its family
    pub fn to_handle(&self, sm2_config: &Sm2Config) -> Result<Box<dyn SignatureHandle>> {
        let handle: Box<dyn SignatureHandle> = match &self.secret {
            EcSecret::P256(sk) => Box::new(EcdsaP256Handle::from_secret_key(sk.clone(), None)),
            EcSecret::Secp256k1(sk) => Box::new(EcdsaK256Handle::from_secret_key(sk.clone(), None)),
            EcSecret::Sm2(sk) => Box::new(Sm2Handle::from_secret_key_with_config(
                sk.clone(),
                None,
                sm2_config,
            )?),
        };
        Ok(handle)
    }

    /// SM2 private key, for decryption
    pub fn as_sm2(&self) -> Option<&sm2::SecretKey> {
        match &self.secret {
            EcSecret::Sm2(sk) => Some(sk),
            _ => None,
        }
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("curve", &self.curve())
            .field("ski", &self.public.ski())
            .finish_non_exhaustive()
    }
}

impl Key for EcPrivateKey {
    fn algorithm(&self) -> KeyAlgorithm {
        self.curve().into()
    }

    fn ski(&self) -> Ski {
        self.public.ski()
    }

    fn is_private(&self) -> bool {
        true
    }

    fn public_key(&self) -> Result<Box<dyn Key>> {
        Ok(Box::new(self.public()))
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        self.to_pkcs8_der()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Public key
// ============================================================================

/// Elliptic curve public key (P-256, secp256k1 or SM2)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EcPublicKey {
    public: EcPublic,
}

impl EcPublicKey {
    /// Import from SPKI DER
    pub fn from_spki_der(curve: KeyCurve, der: &[u8]) -> Result<Self> {
        let err = |e: pkcs8::spki::Error| {
            Error::KeyError(format!("{:?} SPKI import failed: {}", curve, e))
        };
        let public = match curve {
            KeyCurve::P256 => {
                EcPublic::P256(p256::PublicKey::from_public_key_der(der).map_err(err)?)
            }
            KeyCurve::Secp256k1 => {
                EcPublic::Secp256k1(k256::PublicKey::from_public_key_der(der).map_err(err)?)
            }
            KeyCurve::Sm2 => EcPublic::Sm2(sm2::PublicKey::from_public_key_der(der).map_err(err)?),
        };
        Ok(Self { public })
    }

    pub fn curve(&self) -> KeyCurve {
        self.public.curve()
    }

    /// Uncompressed SEC1 point
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.public.to_sec1()
    }

    /// Verify-only handle for this key
    pub fn to_handle(&self, sm2_config: &Sm2Config) -> Result<Box<dyn SignatureHandle>> {
        let handle: Box<dyn SignatureHandle> = match self.public {
            EcPublic::P256(pk) => Box::new(EcdsaP256Handle::from_public_key(pk)),
            EcPublic::Secp256k1(pk) => Box::new(EcdsaK256Handle::from_public_key(pk)),
            EcPublic::Sm2(pk) => Box::new(Sm2Handle::from_public_key_with_config(pk, sm2_config)?),
        };
        Ok(handle)
    }

    /// SM2 public key, for encryption
    pub fn as_sm2(&self) -> Option<&sm2::PublicKey> {
        match &self.public {
            EcPublic::Sm2(pk) => Some(pk),
            _ => None,
        }
    }
}

impl fmt::Debug for EcPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPublicKey")
            .field("curve", &self.curve())
            .field("ski", &self.public.ski())
            .finish()
    }
}

impl Key for EcPublicKey {
    fn algorithm(&self) -> KeyAlgorithm {
        self.curve().into()
    }

    fn ski(&self) -> Ski {
        self.public.ski()
    }

    fn is_private(&self) -> bool {
        false
    }

    fn public_key(&self) -> Result<Box<dyn Key>> {
        Ok(Box::new(*self))
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        self.public.to_spki_der()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
