//! Key-based encryption
//!
//! Picks the cipher from the key and the options together. AES keys take
//! [`EncrypterOpts::AesCbcPkcs7`]; SM2 keys take [`EncrypterOpts::Sm2`].
//! Any other pairing is rejected without touching the plaintext.

use sigil_crypto::asymmetric::sm2_pke;
use sigil_crypto::symmetric::cbc;
use sigil_crypto::{AesCbcPkcs7Opts, CipherError};

use crate::error::{Error, Result};
use crate::key::{AesKey, EcPrivateKey, EcPublicKey, Key, KeyAlgorithm};

/// Encryption options, one variant per supported scheme
#[derive(Debug)]
pub enum EncrypterOpts {
    AesCbcPkcs7(AesCbcPkcs7Opts),
    /// SM2 public-key encryption, `C1 || C3 || C2`
    Sm2,
}

impl EncrypterOpts {
    fn name(&self) -> &'static str {
        match self {
            EncrypterOpts::AesCbcPkcs7(_) => "AES-CBC-PKCS7",
            EncrypterOpts::Sm2 => "SM2",
        }
    }
}

impl From<AesCbcPkcs7Opts> for EncrypterOpts {
    fn from(opts: AesCbcPkcs7Opts) -> Self {
        EncrypterOpts::AesCbcPkcs7(opts)
    }
}

/// Decryption options
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecrypterOpts {
    AesCbcPkcs7,
    Sm2,
}

impl DecrypterOpts {
    fn name(&self) -> &'static str {
        match self {
            DecrypterOpts::AesCbcPkcs7 => "AES-CBC-PKCS7",
            DecrypterOpts::Sm2 => "SM2",
        }
    }
}

fn unrecognized(algorithm: KeyAlgorithm, opts: &str) -> Error {
    CipherError::UnrecognizedOptions(format!("{} options for a {} key", opts, algorithm)).into()
}

fn no_cipher(algorithm: KeyAlgorithm) -> Error {
    Error::UnsupportedAlgorithm(format!("no cipher for {} keys", algorithm))
}

fn sm2_public_key(key: &dyn Key) -> Option<sm2::PublicKey> {
    let any = key.as_any();
    if let Some(private) = any.downcast_ref::<EcPrivateKey>() {
        return private.public().as_sm2().copied();
    }
    any.downcast_ref::<EcPublicKey>()
        .and_then(|public| public.as_sm2().copied())
}

/// Encrypt `plaintext` under `key`
///
/// AES output is `IV || CBC(pad(plaintext))`. SM2 encrypts to the public
/// half, so either half of an SM2 key works here.
pub fn encrypt(key: &dyn Key, plaintext: &[u8], opts: EncrypterOpts) -> Result<Vec<u8>> {
    let algorithm = key.algorithm();
    match (algorithm, opts) {
        (
            KeyAlgorithm::Aes128 | KeyAlgorithm::Aes192 | KeyAlgorithm::Aes256,
            EncrypterOpts::AesCbcPkcs7(cbc_opts),
        ) => {
            let aes = key
                .as_any()
                .downcast_ref::<AesKey>()
                .ok_or_else(|| no_cipher(algorithm))?;
            Ok(cbc::encrypt(aes.as_bytes(), plaintext, cbc_opts)?)
        }
        (KeyAlgorithm::Sm2, EncrypterOpts::Sm2) => {
            let public = sm2_public_key(key).ok_or_else(|| no_cipher(algorithm))?;
            Ok(sm2_pke::encrypt(&public, plaintext)?)
        }
        (
            KeyAlgorithm::Aes128 | KeyAlgorithm::Aes192 | KeyAlgorithm::Aes256 | KeyAlgorithm::Sm2,
            opts,
        ) => Err(unrecognized(algorithm, opts.name())),
        (_, _) => Err(no_cipher(algorithm)),
    }
}

/// Decrypt `ciphertext` with `key`. SM2 needs the private half.
pub fn decrypt(key: &dyn Key, ciphertext: &[u8], opts: DecrypterOpts) -> Result<Vec<u8>> {
    let algorithm = key.algorithm();
    match (algorithm, opts) {
        (
            KeyAlgorithm::Aes128 | KeyAlgorithm::Aes192 | KeyAlgorithm::Aes256,
            DecrypterOpts::AesCbcPkcs7,
        ) => {
            let aes = key
                .as_any()
                .downcast_ref::<AesKey>()
                .ok_or_else(|| no_cipher(algorithm))?;
            Ok(cbc::decrypt(aes.as_bytes(), ciphertext)?)
        }
        (KeyAlgorithm::Sm2, DecrypterOpts::Sm2) => {
            let secret = key
                .as_any()
                .downcast_ref::<EcPrivateKey>()
                .and_then(EcPrivateKey::as_sm2)
                .ok_or(sigil_crypto::PkeError::MissingPrivateKey)?;
            Ok(sm2_pke::decrypt(secret, ciphertext)?)
        }
        (
            KeyAlgorithm::Aes128 | KeyAlgorithm::Aes192 | KeyAlgorithm::Aes256 | KeyAlgorithm::Sm2,
            opts,
        ) => Err(unrecognized(algorithm, opts.name())),
        (_, _) => Err(no_cipher(algorithm)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use sigil_crypto::{KeyCurve, PkeError};

    use super::*;

    #[test]
    fn test_aes_round_trip() {
        let key = AesKey::generate(KeyAlgorithm::Aes256).unwrap();
        let ciphertext = encrypt(&key, b"hello", AesCbcPkcs7Opts::default().into()).unwrap();
        assert_eq!(ciphertext.len(), 32);
        assert_eq!(
            decrypt(&key, &ciphertext, DecrypterOpts::AesCbcPkcs7).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_aes_with_prng() {
        let key = AesKey::from_bytes(&[4u8; 16]).unwrap();
        let opts = AesCbcPkcs7Opts::with_prng(Cursor::new([0x11u8; 16]));
        let ciphertext = encrypt(&key, b"prng iv", opts.into()).unwrap();
        assert_eq!(&ciphertext[..16], &[0x11u8; 16]);
    }

    #[test]
    fn test_aes_conflicting_options() {
        let key = AesKey::from_bytes(&[4u8; 16]).unwrap();
        let opts = AesCbcPkcs7Opts {
            iv: Some(vec![0u8; 16]),
            prng: Some(Box::new(Cursor::new([0u8; 16]))),
        };
        let err = encrypt(&key, b"x", opts.into()).unwrap_err();
        assert!(matches!(
            err,
            Error::CryptoError(sigil_crypto::Error::Cipher(CipherError::ConflictingOptions))
        ));
    }

    #[test]
    fn test_sm2_round_trip() {
        let key = EcPrivateKey::generate(KeyCurve::Sm2);
        let public = key.public_key().unwrap();

        let ciphertext = encrypt(public.as_ref(), b"sm2 message", EncrypterOpts::Sm2).unwrap();
        assert_eq!(ciphertext.len(), 65 + 32 + 11);
        assert_eq!(
            decrypt(&key, &ciphertext, DecrypterOpts::Sm2).unwrap(),
            b"sm2 message"
        );

        let err = decrypt(public.as_ref(), &ciphertext, DecrypterOpts::Sm2).unwrap_err();
        assert!(matches!(
            err,
            Error::CryptoError(sigil_crypto::Error::Pke(PkeError::MissingPrivateKey))
        ));
    }

    #[test]
    fn test_mismatched_options() {
        let aes = AesKey::from_bytes(&[4u8; 16]).unwrap();
        let err = encrypt(&aes, b"x", EncrypterOpts::Sm2).unwrap_err();
        assert!(matches!(
            err,
            Error::CryptoError(sigil_crypto::Error::Cipher(CipherError::UnrecognizedOptions(_)))
        ));

        let sm2 = EcPrivateKey::generate(KeyCurve::Sm2);
        let err = decrypt(&sm2, &[0u8; 120], DecrypterOpts::AesCbcPkcs7).unwrap_err();
        assert!(matches!(
            err,
            Error::CryptoError(sigil_crypto::Error::Cipher(CipherError::UnrecognizedOptions(_)))
        ));
    }

    #[test]
    fn test_ecdsa_keys_have_no_cipher() {
        let key = EcPrivateKey::generate(KeyCurve::P256);
        let err = encrypt(&key, b"x", EncrypterOpts::Sm2).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
