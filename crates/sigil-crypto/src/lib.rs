//! Sigil Cryptography Library
//!
//! One signing contract over three algorithm families (ECDSA P-256, ECDSA
//! secp256k1 and SM2/SM3), a PEM and certificate aware key loader, and
//! AES-CBC with PKCS#7 padding.

pub mod error;

pub mod asymmetric;
pub mod encoding;
pub mod hash;
pub mod symmetric;

// Re-export commonly used types for convenience
pub use asymmetric::{
    open_handle, open_handle_with_config, open_verifier, open_verifier_with_config, sign_message,
    sign_message_base64, signature, signature_raw, verify_message, verify_message_base64,
    EcdsaK256Handle, EcdsaP256Handle, EncryptionHandle, PemHandle, SignatureAlgorithm,
    SignatureHandle, Sm2Config, Sm2Handle, DEFAULT_SM2_UID,
};
pub use encoding::{load, load_private_key, KeyCurve, KeyMaterial, MaterialKind, PemLabel};
pub use error::{
    CipherError, ConstructionError, Error, KeyLoadError, LoadError, ParseError, PkeError, Result,
    SignError, VerifyError,
};
pub use hash::{hash, hash_hex, sha256, sm3, HashAlgorithm};
pub use symmetric::{AesCbcPkcs7Opts, IvSource};
