use p256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        DerSignature, Signature, SigningKey, VerifyingKey,
    },
    PublicKey, SecretKey,
};
use pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rand_core::OsRng;

use super::{
    explicit_public_pem, load_private, load_public, PemHandle, SignatureAlgorithm, SignatureHandle,
};
use crate::error::{ConstructionError, Error, Result, SignError, VerifyError};

/// ECDSA over NIST P-256 with SHA-256 digests
pub struct EcdsaP256Handle {
    public_key: PublicKey,
    signing_key: Option<SigningKey>,
}

impl EcdsaP256Handle {
    /// Generate a fresh key pair
    pub fn generate() -> Self {
        Self::from_secret_key(SecretKey::random(&mut OsRng), None)
    }

    /// Bind an already decoded private key. `public_key` is used verbatim
    /// when given, otherwise derived.
    pub fn from_secret_key(secret_key: SecretKey, public_key: Option<PublicKey>) -> Self {
        let public_key = public_key.unwrap_or_else(|| secret_key.public_key());
        Self {
            public_key,
            signing_key: Some(SigningKey::from(&secret_key)),
        }
    }

    /// Verify-only handle
    pub fn from_public_key(public_key: PublicKey) -> Self {
        Self {
            public_key,
            signing_key: None,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Export the private key as PKCS#8 PEM
    pub fn private_key_pem(&self) -> Result<String> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or(SignError::MissingPrivateKey)?;
        let pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::Encoding(format!("P-256 PKCS#8 export failed: {}", e)))?;
        Ok(pem.to_string())
    }

    /// Export the bound public key as SPKI PEM
    pub fn public_key_pem(&self) -> Result<String> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::Encoding(format!("P-256 SPKI export failed: {}", e)))
    }
}

impl SignatureHandle for EcdsaP256Handle {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaP256
    }

    fn sign(&self, digest: &[u8]) -> std::result::Result<Vec<u8>, SignError> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or(SignError::MissingPrivateKey)?;
        let signature: Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| SignError::MalformedDigest(format!("P-256: {}", e)))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify(&self, signature: &[u8], digest: &[u8]) -> std::result::Result<bool, VerifyError> {
        let der = DerSignature::from_bytes(signature)
            .map_err(|e| VerifyError::MalformedSignature(format!("P-256: {}", e)))?;
        // well-formed DER with r or s outside [1, n) cannot match any key
        let Ok(signature) = Signature::try_from(der) else {
            return Ok(false);
        };
        let verifying_key = VerifyingKey::from(&self.public_key);
        Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
    }

    fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }

    fn public_key_der(&self) -> Result<Vec<u8>> {
        let der = self
            .public_key
            .to_public_key_der()
            .map_err(|e| Error::Encoding(format!("P-256 SPKI export failed: {}", e)))?;
        Ok(der.as_bytes().to_vec())
    }
}

impl PemHandle for EcdsaP256Handle {
    fn from_pem(
        public_key_pem: Option<&str>,
        private_key_pem: &str,
    ) -> std::result::Result<Self, ConstructionError> {
        let secret_key: SecretKey = load_private(private_key_pem)?;
        let public_key = explicit_public_pem(public_key_pem)
            .map(load_public::<PublicKey>)
            .transpose()?;
        tracing::debug!(explicit_public_key = public_key.is_some(), "opened P-256 handle");
        Ok(Self::from_secret_key(secret_key, public_key))
    }

    fn from_public_pem(public_key_pem: &str) -> std::result::Result<Self, ConstructionError> {
        Ok(Self::from_public_key(load_public(public_key_pem)?))
    }
}
