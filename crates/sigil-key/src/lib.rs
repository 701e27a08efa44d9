//! Sigil key framework
//!
//! Opaque keys addressed by SKI, key generation, a pluggable [`KeyStore`],
//! signer adapters that bind a key to
//! [`SignatureHandle`](sigil_crypto::SignatureHandle), and key-based
//! encryption over a closed set of options.

pub mod cipher;
pub mod error;
pub mod key;
pub mod keygen;
pub mod provider;
pub mod signer;
pub mod store;

pub use cipher::{decrypt, encrypt, DecrypterOpts, EncrypterOpts};
pub use error::{Error, Result, StorageError};
pub use key::{
    decode_key, AesKey, EcPrivateKey, EcPublicKey, Key, KeyAlgorithm, KeyGenOpts, Ski,
};
pub use keygen::key_gen;
pub use provider::{request_key, request_key_with};
pub use signer::{build_signer, KeySigner, SignerBuilder, SignerRegistry};
pub use store::{KeyMetadata, KeyStore, MemoryKeyStore};
