//! SM2 signature and encryption handle
//!
//! Signing hashes `Z_A || digest` with SM3, where `Z_A` binds the signer's
//! distinguishing identifier (uid) and public key. The uid comes from
//! [`Sm2Config`]; its default is the 16-byte [`DEFAULT_SM2_UID`].

use der::{
    asn1::UintRef,
    Decode, Encode, Sequence,
};
use pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sm2::{
    dsa::{
        signature::{Signer, Verifier},
        Signature, SigningKey, VerifyingKey,
    },
    FieldBytes, PublicKey, SecretKey,
};

use super::{
    explicit_public_pem, load_private, load_public, sm2_pke, EncryptionHandle, PemHandle,
    SignatureAlgorithm, SignatureHandle,
};
use crate::error::{ConstructionError, Error, PkeError, Result, SignError, VerifyError};

/// Default SM2 distinguishing identifier (GM/T 0009)
pub const DEFAULT_SM2_UID: &str = "1234567812345678";

/// SM2 handle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sm2Config {
    /// Distinguishing identifier mixed into `Z_A`
    pub uid: String,
}

impl Default for Sm2Config {
    fn default() -> Self {
        Self {
            uid: DEFAULT_SM2_UID.to_string(),
        }
    }
}

/// ASN.1 `SEQUENCE { r INTEGER, s INTEGER }`
#[derive(Sequence)]
struct SignatureValue<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

fn encode_signature(signature: &Signature) -> std::result::Result<Vec<u8>, SignError> {
    let r = signature.r_bytes();
    let s = signature.s_bytes();
    let value = SignatureValue {
        r: UintRef::new(&r).map_err(|e| SignError::Encoding(e.to_string()))?,
        s: UintRef::new(&s).map_err(|e| SignError::Encoding(e.to_string()))?,
    };
    value.to_der().map_err(|e| SignError::Encoding(e.to_string()))
}

fn field_bytes(integer: &UintRef<'_>) -> std::result::Result<FieldBytes, VerifyError> {
    let bytes = integer.as_bytes();
    let mut out = FieldBytes::default();
    if bytes.len() > out.len() {
        return Err(VerifyError::MalformedSignature(
            "SM2: integer wider than the field".to_string(),
        ));
    }
    let offset = out.len() - bytes.len();
    out[offset..].copy_from_slice(bytes);
    Ok(out)
}

/// `Ok(None)` when the DER parses but r or s lies outside `[1, n)`
fn decode_signature(der: &[u8]) -> std::result::Result<Option<Signature>, VerifyError> {
    let value = SignatureValue::from_der(der)
        .map_err(|e| VerifyError::MalformedSignature(format!("SM2: {}", e)))?;
    Ok(Signature::from_scalars(field_bytes(&value.r)?, field_bytes(&value.s)?).ok())
}

/// SM2 handle: SM3 digests, DER `(r, s)` signatures, `C1 || C3 || C2`
/// encryption
pub struct Sm2Handle {
    config: Sm2Config,
    public_key: PublicKey,
    verifying_key: VerifyingKey,
    secret_key: Option<SecretKey>,
    signing_key: Option<SigningKey>,
}

impl Sm2Handle {
    pub fn generate() -> std::result::Result<Self, ConstructionError> {
        Self::generate_with_config(&Sm2Config::default())
    }

    pub fn generate_with_config(
        config: &Sm2Config,
    ) -> std::result::Result<Self, ConstructionError> {
        Self::from_secret_key_with_config(SecretKey::random(&mut OsRng), None, config)
    }

    /// Bind an already decoded private key with the default uid
    pub fn from_secret_key(
        secret_key: SecretKey,
        public_key: Option<PublicKey>,
    ) -> std::result::Result<Self, ConstructionError> {
        Self::from_secret_key_with_config(secret_key, public_key, &Sm2Config::default())
    }

    /// Bind an already decoded private key. `public_key` is used verbatim
    /// when given, otherwise derived.
    pub fn from_secret_key_with_config(
        secret_key: SecretKey,
        public_key: Option<PublicKey>,
        config: &Sm2Config,
    ) -> std::result::Result<Self, ConstructionError> {
        let signing_key = SigningKey::new(&config.uid, &secret_key)
            .map_err(|e| ConstructionError::Config(format!("SM2 uid rejected: {}", e)))?;
        let public_key = public_key.unwrap_or_else(|| secret_key.public_key());
        let mut handle = Self::from_public_key_with_config(public_key, config)?;
        handle.secret_key = Some(secret_key);
        handle.signing_key = Some(signing_key);
        Ok(handle)
    }

    pub fn from_public_key(public_key: PublicKey) -> std::result::Result<Self, ConstructionError> {
        Self::from_public_key_with_config(public_key, &Sm2Config::default())
    }

    /// Verify-only handle
    pub fn from_public_key_with_config(
        public_key: PublicKey,
        config: &Sm2Config,
    ) -> std::result::Result<Self, ConstructionError> {
        let verifying_key = VerifyingKey::new(&config.uid, public_key)
            .map_err(|e| ConstructionError::Config(format!("SM2 uid rejected: {}", e)))?;
        Ok(Self {
            config: config.clone(),
            public_key,
            verifying_key,
            secret_key: None,
            signing_key: None,
        })
    }

    /// [`PemHandle::from_pem`] with an explicit configuration
    pub fn from_pem_with_config(
        public_key_pem: Option<&str>,
        private_key_pem: &str,
        config: &Sm2Config,
    ) -> std::result::Result<Self, ConstructionError> {
        let secret_key: SecretKey = load_private(private_key_pem)?;
        let public_key = explicit_public_pem(public_key_pem)
            .map(load_public::<PublicKey>)
            .transpose()?;
        tracing::debug!(
            explicit_public_key = public_key.is_some(),
            uid_len = config.uid.len(),
            "opened SM2 handle"
        );
        Self::from_secret_key_with_config(secret_key, public_key, config)
    }

    /// [`PemHandle::from_public_pem`] with an explicit configuration
    pub fn from_public_pem_with_config(
        public_key_pem: &str,
        config: &Sm2Config,
    ) -> std::result::Result<Self, ConstructionError> {
        Self::from_public_key_with_config(load_public(public_key_pem)?, config)
    }

    pub fn config(&self) -> &Sm2Config {
        &self.config
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key_pem(&self) -> Result<String> {
        let secret_key = self
            .secret_key
            .as_ref()
            .ok_or(SignError::MissingPrivateKey)?;
        let pem = secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::Encoding(format!("SM2 PKCS#8 export failed: {}", e)))?;
        Ok(pem.to_string())
    }

    pub fn public_key_pem(&self) -> Result<String> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::Encoding(format!("SM2 SPKI export failed: {}", e)))
    }
}

impl SignatureHandle for Sm2Handle {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Sm2
    }

    fn sign(&self, digest: &[u8]) -> std::result::Result<Vec<u8>, SignError> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or(SignError::MissingPrivateKey)?;
        // the raw signature and its DER encoding fail independently
        let signature: Signature = signing_key
            .try_sign(digest)
            .map_err(|e| SignError::Signing(format!("SM2: {}", e)))?;
        encode_signature(&signature)
    }

    fn verify(&self, signature: &[u8], digest: &[u8]) -> std::result::Result<bool, VerifyError> {
        let Some(signature) = decode_signature(signature)? else {
            return Ok(false);
        };
        Ok(self.verifying_key.verify(digest, &signature).is_ok())
    }

    fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }

    fn public_key_der(&self) -> Result<Vec<u8>> {
        let der = self
            .public_key
            .to_public_key_der()
            .map_err(|e| Error::Encoding(format!("SM2 SPKI export failed: {}", e)))?;
        Ok(der.as_bytes().to_vec())
    }
}

impl EncryptionHandle for Sm2Handle {
    fn encrypt(&self, plaintext: &[u8]) -> std::result::Result<Vec<u8>, PkeError> {
        sm2_pke::encrypt(&self.public_key, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> std::result::Result<Vec<u8>, PkeError> {
        let secret_key = self
            .secret_key
            .as_ref()
            .ok_or(PkeError::MissingPrivateKey)?;
        sm2_pke::decrypt(secret_key, ciphertext)
    }
}

impl PemHandle for Sm2Handle {
    fn from_pem(
        public_key_pem: Option<&str>,
        private_key_pem: &str,
    ) -> std::result::Result<Self, ConstructionError> {
        Self::from_pem_with_config(public_key_pem, private_key_pem, &Sm2Config::default())
    }

    fn from_public_pem(public_key_pem: &str) -> std::result::Result<Self, ConstructionError> {
        Self::from_public_pem_with_config(public_key_pem, &Sm2Config::default())
    }
}
