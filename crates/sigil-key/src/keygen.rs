use sigil_crypto::KeyCurve;

use crate::error::Result;
use crate::key::{AesKey, EcPrivateKey, Key, KeyAlgorithm, KeyGenOpts};

/// Generate a new key for `opts.algorithm`
///
/// Randomness comes from the operating system. The returned key is not
/// stored anywhere.
pub fn key_gen(opts: KeyGenOpts) -> Result<Box<dyn Key>> {
    let key: Box<dyn Key> = match opts.algorithm {
        KeyAlgorithm::EcdsaP256 => Box::new(EcPrivateKey::generate(KeyCurve::P256)),
        KeyAlgorithm::EcdsaSecp256k1 => Box::new(EcPrivateKey::generate(KeyCurve::Secp256k1)),
        KeyAlgorithm::Sm2 => Box::new(EcPrivateKey::generate(KeyCurve::Sm2)),
        KeyAlgorithm::Aes128 | KeyAlgorithm::Aes192 | KeyAlgorithm::Aes256 => {
            Box::new(AesKey::generate(opts.algorithm)?)
        }
    };

    tracing::debug!(
        algorithm = %opts.algorithm,
        ski = %key.ski(),
        ephemeral = opts.ephemeral,
        "generated key"
    );
    Ok(key)
}
