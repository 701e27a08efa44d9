//! PEM key material loader
//!
//! A PEM block is classified by its type label before anything else is
//! decoded. Public material arrives either as a bare SPKI (`PUBLIC KEY`) or
//! embedded in an X.509 certificate (`CERTIFICATE`); both are reduced to SPKI
//! DER. Private keys are PKCS#8 (`PRIVATE KEY`) for every curve and use their
//! own entry point.
//!
//! Certificate signatures and validity periods are not checked here.

use const_oid::{AssociatedOid, ObjectIdentifier};
use pkcs8::{DecodePrivateKey, DecodePublicKey, PrivateKeyInfo};
use spki::SubjectPublicKeyInfoRef;
use x509_cert::{
    der::{Decode, Encode},
    Certificate,
};

use crate::error::{KeyLoadError, ParseError};

/// `id-ecPublicKey` (RFC 5480)
const EC_PUBLIC_KEY_OID: ObjectIdentifier = p256::elliptic_curve::ALGORITHM_OID;

// ============================================================================
// Classification
// ============================================================================

/// Recognized PEM block labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PemLabel {
    /// `PUBLIC KEY`: DER-encoded SubjectPublicKeyInfo
    PublicKey,
    /// `CERTIFICATE`: DER-encoded X.509 certificate
    Certificate,
    /// `PRIVATE KEY`: DER-encoded PKCS#8 PrivateKeyInfo
    PrivateKey,
}

impl PemLabel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PemLabel::PublicKey => "PUBLIC KEY",
            PemLabel::Certificate => "CERTIFICATE",
            PemLabel::PrivateKey => "PRIVATE KEY",
        }
    }

    /// Classify a PEM type label. Unknown labels are an error, never a
    /// fallback.
    pub fn classify(tag: &str) -> Result<Self, ParseError> {
        match tag {
            "PUBLIC KEY" => Ok(PemLabel::PublicKey),
            "CERTIFICATE" => Ok(PemLabel::Certificate),
            "PRIVATE KEY" => Ok(PemLabel::PrivateKey),
            other => Err(ParseError::UnsupportedBlockType(other.to_string())),
        }
    }
}

/// Where a piece of key material came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    RawPublicKey,
    Certificate,
    PrivateKey,
}

/// Elliptic curves understood by the handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCurve {
    P256,
    Secp256k1,
    Sm2,
}

impl KeyCurve {
    /// Map a named-curve OID to a curve
    pub fn from_oid(oid: ObjectIdentifier) -> Result<Self, KeyLoadError> {
        if oid == p256::NistP256::OID {
            Ok(KeyCurve::P256)
        } else if oid == k256::Secp256k1::OID {
            Ok(KeyCurve::Secp256k1)
        } else if oid == sm2::Sm2::OID {
            Ok(KeyCurve::Sm2)
        } else {
            Err(KeyLoadError::UnsupportedAlgorithm(format!("named curve {}", oid)))
        }
    }

    pub const fn oid(&self) -> ObjectIdentifier {
        match self {
            KeyCurve::P256 => p256::NistP256::OID,
            KeyCurve::Secp256k1 => k256::Secp256k1::OID,
            KeyCurve::Sm2 => sm2::Sm2::OID,
        }
    }
}

// ============================================================================
// Key Material
// ============================================================================

/// Result of loading one PEM block
///
/// `der` holds SPKI DER for the public kinds and PKCS#8 DER for
/// [`MaterialKind::PrivateKey`].
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    kind: MaterialKind,
    der: Vec<u8>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("kind", &self.kind)
            .field("len", &self.der.len())
            .finish_non_exhaustive()
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        if self.kind == MaterialKind::PrivateKey {
            zeroize::Zeroize::zeroize(&mut self.der);
        }
    }
}

impl KeyMaterial {
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn is_private(&self) -> bool {
        self.kind == MaterialKind::PrivateKey
    }

    /// Curve named in the key's algorithm parameters
    pub fn curve(&self) -> Result<KeyCurve, KeyLoadError> {
        let (algorithm, params) = if self.is_private() {
            let info = PrivateKeyInfo::try_from(self.der.as_slice())
                .map_err(|e| KeyLoadError::PrivateKey(e.to_string()))?;
            (info.algorithm.oid, info.algorithm.parameters_oid())
        } else {
            let info = SubjectPublicKeyInfoRef::try_from(self.der.as_slice())
                .map_err(|e| KeyLoadError::PublicKey(e.to_string()))?;
            (info.algorithm.oid, info.algorithm.parameters_oid())
        };

        if algorithm != EC_PUBLIC_KEY_OID {
            return Err(KeyLoadError::UnsupportedAlgorithm(format!(
                "key algorithm {}",
                algorithm
            )));
        }
        let params = params
            .map_err(|e| KeyLoadError::UnsupportedAlgorithm(format!("curve parameters: {}", e)))?;
        KeyCurve::from_oid(params)
    }

    /// Decode into an algorithm-specific public key
    pub fn decode_public_key<K: DecodePublicKey>(&self) -> Result<K, KeyLoadError> {
        if self.is_private() {
            return Err(KeyLoadError::PublicKey(
                "material holds a private key".to_string(),
            ));
        }
        K::from_public_key_der(&self.der).map_err(|e| KeyLoadError::PublicKey(e.to_string()))
    }

    /// Decode into an algorithm-specific private key
    pub fn decode_private_key<K: DecodePrivateKey>(&self) -> Result<K, KeyLoadError> {
        if !self.is_private() {
            return Err(KeyLoadError::PrivateKey(
                "material holds a public key".to_string(),
            ));
        }
        K::from_pkcs8_der(&self.der).map_err(|e| KeyLoadError::PrivateKey(e.to_string()))
    }
}

// ============================================================================
// Loading
// ============================================================================

fn parse_block(pem_text: &str) -> Result<(PemLabel, Vec<u8>), ParseError> {
    let block = pem::parse(pem_text).map_err(|e| ParseError::NotPem(e.to_string()))?;
    let label = PemLabel::classify(block.tag())?;
    Ok((label, block.into_contents()))
}

/// Load public key material from a `PUBLIC KEY` or `CERTIFICATE` block
///
/// For certificates the embedded SubjectPublicKeyInfo is extracted.
pub fn load(pem_text: &str) -> Result<KeyMaterial, ParseError> {
    let (label, contents) = parse_block(pem_text)?;
    match label {
        PemLabel::PublicKey => Ok(KeyMaterial {
            kind: MaterialKind::RawPublicKey,
            der: contents,
        }),
        PemLabel::Certificate => {
            let cert = Certificate::from_der(&contents)
                .map_err(|e| ParseError::Certificate(e.to_string()))?;
            let der = cert
                .tbs_certificate
                .subject_public_key_info
                .to_der()
                .map_err(|e| ParseError::Certificate(e.to_string()))?;
            Ok(KeyMaterial {
                kind: MaterialKind::Certificate,
                der,
            })
        }
        PemLabel::PrivateKey => Err(ParseError::UnsupportedBlockType(
            label.as_str().to_string(),
        )),
    }
}

/// Load a PKCS#8 `PRIVATE KEY` block
pub fn load_private_key(pem_text: &str) -> Result<KeyMaterial, ParseError> {
    let (label, contents) = parse_block(pem_text)?;
    match label {
        PemLabel::PrivateKey => Ok(KeyMaterial {
            kind: MaterialKind::PrivateKey,
            der: contents,
        }),
        other => Err(ParseError::UnsupportedBlockType(other.as_str().to_string())),
    }
}

/// Wrap DER bytes in a PEM block
pub fn to_pem(der: &[u8], label: PemLabel) -> String {
    pem::encode(&pem::Pem::new(label.as_str(), der))
}

#[cfg(test)]
mod tests {
    use super::*;

    const P256_PUBLIC_PEM: &str = "-----BEGIN PUBLIC KEY-----
MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEEy4wBr/o5jSJHopiBfe9rhPhn//y
+Qf35AH4wwa92AjxLuhk28GlzOK7YiB5BitgttSlk+wLgTlEPF9m18cAvw==
-----END PUBLIC KEY-----
";

    const SM2_PUBLIC_PEM: &str = "-----BEGIN PUBLIC KEY-----
MFkwEwYHKoZIzj0CAQYIKoEcz1UBgi0DQgAECBTmBCyjjyg0h4F1f/PiLVNJyDM1
YRgctLay3FE5wWLqG0OH0p5fP8I5UT+pb1gkirIchlDxuwdVdVlUuQMrTQ==
-----END PUBLIC KEY-----
";

    #[test]
    fn test_classify_labels() {
        assert_eq!(PemLabel::classify("PUBLIC KEY"), Ok(PemLabel::PublicKey));
        assert_eq!(PemLabel::classify("CERTIFICATE"), Ok(PemLabel::Certificate));
        assert_eq!(
            PemLabel::classify("EC PRIVATE KEY"),
            Err(ParseError::UnsupportedBlockType("EC PRIVATE KEY".to_string()))
        );
    }

    #[test]
    fn test_load_raw_public_key() {
        let material = load(P256_PUBLIC_PEM).unwrap();
        assert_eq!(material.kind(), MaterialKind::RawPublicKey);
        assert_eq!(material.curve().unwrap(), KeyCurve::P256);
        let key: p256::PublicKey = material.decode_public_key().unwrap();
        assert_eq!(p256::PublicKey::from_public_key_der(material.der()).unwrap(), key);
    }

    #[test]
    fn test_load_sm2_public_key() {
        let material = load(SM2_PUBLIC_PEM).unwrap();
        assert_eq!(material.curve().unwrap(), KeyCurve::Sm2);
        assert!(material.decode_public_key::<sm2::PublicKey>().is_ok());
        // wrong curve for this material
        assert!(material.decode_public_key::<p256::PublicKey>().is_err());
    }

    #[test]
    fn test_not_pem() {
        assert!(matches!(load("hello"), Err(ParseError::NotPem(_))));
        assert!(matches!(load(""), Err(ParseError::NotPem(_))));
    }

    #[test]
    fn test_unsupported_label() {
        let text = to_pem(b"\x30\x00", PemLabel::PublicKey).replace("PUBLIC KEY", "RSA PUBLIC KEY");
        assert_eq!(
            load(&text),
            Err(ParseError::UnsupportedBlockType("RSA PUBLIC KEY".to_string()))
        );
    }

    #[test]
    fn test_private_label_rejected_by_public_loader() {
        let text = to_pem(b"\x30\x00", PemLabel::PrivateKey);
        assert_eq!(
            load(&text),
            Err(ParseError::UnsupportedBlockType("PRIVATE KEY".to_string()))
        );
        assert!(matches!(
            load_private_key(P256_PUBLIC_PEM),
            Err(ParseError::UnsupportedBlockType(_))
        ));
    }

    #[test]
    fn test_garbage_certificate() {
        let text = to_pem(b"not a certificate", PemLabel::Certificate);
        assert!(matches!(load(&text), Err(ParseError::Certificate(_))));
    }

    #[test]
    fn test_decode_kind_mismatch() {
        let material = load(P256_PUBLIC_PEM).unwrap();
        assert!(matches!(
            material.decode_private_key::<p256::SecretKey>(),
            Err(KeyLoadError::PrivateKey(_))
        ));
    }
}
