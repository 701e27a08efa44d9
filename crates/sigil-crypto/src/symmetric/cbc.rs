//! AES-CBC with PKCS#7 padding
//!
//! Ciphertext layout is `IV || CBC(pad(plaintext))`. The key length picks
//! AES-128, AES-192 or AES-256.

use std::{
    borrow::BorrowMut,
    fmt,
    io::Read,
};

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{
    block_padding::NoPadding, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit,
};

use crate::error::CipherError;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

// ============================================================================
// Options
// ============================================================================

/// Options for [`encrypt`]
///
/// At most one of `iv` and `prng` may be set. An empty `iv` counts as unset.
/// With neither set the IV comes from the operating system.
#[derive(Default)]
pub struct AesCbcPkcs7Opts {
    /// Explicit IV, must be exactly one block
    pub iv: Option<Vec<u8>>,
    /// Source the IV is read from
    pub prng: Option<Box<dyn Read + Send>>,
}

impl fmt::Debug for AesCbcPkcs7Opts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesCbcPkcs7Opts")
            .field("iv", &self.iv.as_ref().map(hex::encode))
            .field("prng", &self.prng.is_some())
            .finish()
    }
}

impl AesCbcPkcs7Opts {
    pub fn with_iv(iv: impl Into<Vec<u8>>) -> Self {
        Self {
            iv: Some(iv.into()),
            prng: None,
        }
    }

    pub fn with_prng(prng: impl Read + Send + 'static) -> Self {
        Self {
            iv: None,
            prng: Some(Box::new(prng)),
        }
    }

    /// Resolve to exactly one IV source
    pub fn resolve(&mut self) -> Result<IvSource<'_>, CipherError> {
        let iv = self.iv.as_deref().filter(|iv| !iv.is_empty());
        match (iv, self.prng.as_deref_mut()) {
            (Some(_), Some(_)) => Err(CipherError::ConflictingOptions),
            (Some(iv), None) => Ok(IvSource::Explicit(iv)),
            (None, Some(prng)) => Ok(IvSource::Randomness(prng)),
            (None, None) => Ok(IvSource::Default),
        }
    }
}

/// Where the IV of one encryption comes from
pub enum IvSource<'a> {
    Explicit(&'a [u8]),
    Randomness(&'a mut (dyn Read + Send)),
    Default,
}

impl IvSource<'_> {
    fn into_iv(self) -> Result<[u8; BLOCK_SIZE], CipherError> {
        let mut iv = [0u8; BLOCK_SIZE];
        match self {
            IvSource::Explicit(bytes) => {
                if bytes.len() != BLOCK_SIZE {
                    return Err(CipherError::InvalidIv {
                        expected: BLOCK_SIZE,
                        actual: bytes.len(),
                    });
                }
                iv.copy_from_slice(bytes);
            }
            IvSource::Randomness(prng) => {
                prng.read_exact(&mut iv)
                    .map_err(|e| CipherError::Randomness(format!("IV read failed: {}", e)))?;
            }
            IvSource::Default => {
                getrandom::fill(&mut iv)
                    .map_err(|e| CipherError::Randomness(format!("getrandom failed: {}", e)))?;
            }
        }
        Ok(iv)
    }
}

// ============================================================================
// Padding
// ============================================================================

/// PKCS#7 pad to a multiple of `block_size`. Aligned input gains a full
/// block.
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let pad = block_size - data.len() % block_size;
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    // pad <= block_size <= 255 for every block cipher we drive
    out.resize(data.len() + pad, pad as u8);
    out
}

/// Strip PKCS#7 padding, checking every pad byte
pub fn pkcs7_unpad(data: &[u8], block_size: usize) -> Result<&[u8], CipherError> {
    let last = *data.last().ok_or(CipherError::InvalidPadding)?;
    let pad = usize::from(last);
    if pad == 0 || pad > block_size || pad > data.len() {
        return Err(CipherError::InvalidPadding);
    }
    let (body, padding) = data.split_at(data.len() - pad);
    if padding.iter().any(|&b| b != last) {
        return Err(CipherError::InvalidPadding);
    }
    Ok(body)
}

// ============================================================================
// Block cipher dispatch
// ============================================================================

fn check_key(key: &[u8]) -> Result<(), CipherError> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        n => Err(CipherError::InvalidKeyLength(n)),
    }
}

fn encrypt_blocks<C>(key: &[u8], iv: &[u8], padded: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    Ok(encryptor.encrypt_padded_vec_mut::<NoPadding>(padded))
}

fn decrypt_blocks<C>(key: &[u8], iv: &[u8], body: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    decryptor
        .decrypt_padded_vec_mut::<NoPadding>(body)
        .map_err(|_| CipherError::InvalidCiphertext("body is not block aligned".to_string()))
}

fn cbc_encrypt(key: &[u8], iv: &[u8], padded: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => encrypt_blocks::<Aes128>(key, iv, padded),
        24 => encrypt_blocks::<Aes192>(key, iv, padded),
        32 => encrypt_blocks::<Aes256>(key, iv, padded),
        n => Err(CipherError::InvalidKeyLength(n)),
    }
}

fn cbc_decrypt(key: &[u8], iv: &[u8], body: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => decrypt_blocks::<Aes128>(key, iv, body),
        24 => decrypt_blocks::<Aes192>(key, iv, body),
        32 => decrypt_blocks::<Aes256>(key, iv, body),
        n => Err(CipherError::InvalidKeyLength(n)),
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Encrypt with the IV source chosen by `opts`
///
/// `opts` may be passed by value or as `&mut`; both behave the same.
///
/// ```
/// use sigil_crypto::symmetric::cbc::{decrypt, encrypt, AesCbcPkcs7Opts};
///
/// let key = [7u8; 16];
/// let ciphertext = encrypt(&key, b"hello", AesCbcPkcs7Opts::default()).unwrap();
/// assert_eq!(ciphertext.len(), 32);
/// assert_eq!(decrypt(&key, &ciphertext).unwrap(), b"hello");
/// ```
pub fn encrypt(
    key: &[u8],
    plaintext: &[u8],
    mut opts: impl BorrowMut<AesCbcPkcs7Opts>,
) -> Result<Vec<u8>, CipherError> {
    let source = opts.borrow_mut().resolve()?;
    check_key(key)?;
    let iv = source.into_iv()?;

    let padded = pkcs7_pad(plaintext, BLOCK_SIZE);
    let body = cbc_encrypt(key, &iv, &padded)?;

    let mut out = Vec::with_capacity(BLOCK_SIZE + body.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Encrypt with a caller-chosen IV
pub fn encrypt_with_iv(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_key(key)?;
    let iv = IvSource::Explicit(iv).into_iv()?;
    let body = cbc_encrypt(key, &iv, &pkcs7_pad(plaintext, BLOCK_SIZE))?;
    Ok([iv.as_slice(), body.as_slice()].concat())
}

/// Encrypt with an IV drawn from `prng`
pub fn encrypt_with_rand(
    key: &[u8],
    prng: &mut (dyn Read + Send),
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    check_key(key)?;
    let iv = IvSource::Randomness(prng).into_iv()?;
    let body = cbc_encrypt(key, &iv, &pkcs7_pad(plaintext, BLOCK_SIZE))?;
    Ok([iv.as_slice(), body.as_slice()].concat())
}

/// Decrypt `IV || body` and strip the padding
pub fn decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_key(key)?;
    if ciphertext.len() < BLOCK_SIZE {
        return Err(CipherError::InvalidCiphertext(format!(
            "{} bytes is shorter than one block",
            ciphertext.len()
        )));
    }
    let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
    if body.is_empty() || body.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::InvalidCiphertext(format!(
            "body of {} bytes is not a positive multiple of the block size",
            body.len()
        )));
    }

    let padded = cbc_decrypt(key, iv, body)?;
    Ok(pkcs7_unpad(&padded, BLOCK_SIZE)?.to_vec())
}

/// Draw `len` bytes from the operating system
pub fn random_bytes(len: usize) -> Result<Vec<u8>, CipherError> {
    let mut bytes = vec![0u8; len];
    getrandom::fill(&mut bytes)
        .map_err(|e| CipherError::Randomness(format!("getrandom failed: {}", e)))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const KEY: [u8; 16] = [0x2b; 16];

    fn expected_len(plaintext_len: usize) -> usize {
        BLOCK_SIZE + (plaintext_len / BLOCK_SIZE + 1) * BLOCK_SIZE
    }

    #[test]
    fn test_pad_unpad() {
        assert_eq!(pkcs7_pad(b"", 16), vec![16u8; 16]);
        assert_eq!(pkcs7_pad(b"abc", 4), b"abc\x01".to_vec());
        assert_eq!(pkcs7_pad(b"abcd", 4), b"abcd\x04\x04\x04\x04".to_vec());
        assert_eq!(pkcs7_unpad(b"abc\x01", 4).unwrap(), b"abc");
        assert_eq!(pkcs7_unpad(b"ab\x02\x02", 4).unwrap(), b"ab");
    }

    #[test]
    fn test_unpad_rejects() {
        assert_eq!(pkcs7_unpad(b"", 4), Err(CipherError::InvalidPadding));
        assert_eq!(pkcs7_unpad(b"abc\x00", 4), Err(CipherError::InvalidPadding));
        assert_eq!(pkcs7_unpad(b"abc\x05", 4), Err(CipherError::InvalidPadding));
        // last byte fine, earlier pad byte corrupted
        assert_eq!(pkcs7_unpad(b"a\x03\x02\x03", 4), Err(CipherError::InvalidPadding));
    }

    #[test]
    fn test_round_trip_all_sources() {
        for len in 0..=48 {
            let plaintext: Vec<u8> = (0..len as u8).collect();

            let by_default = encrypt(&KEY, &plaintext, AesCbcPkcs7Opts::default()).unwrap();
            let by_iv = encrypt(&KEY, &plaintext, AesCbcPkcs7Opts::with_iv([9u8; 16])).unwrap();
            let by_prng = encrypt(
                &KEY,
                &plaintext,
                AesCbcPkcs7Opts::with_prng(Cursor::new(vec![3u8; 16])),
            )
            .unwrap();

            for ciphertext in [by_default, by_iv, by_prng] {
                assert_eq!(ciphertext.len(), expected_len(len));
                assert_eq!(decrypt(&KEY, &ciphertext).unwrap(), plaintext);
            }
        }
    }

    #[test]
    fn test_key_sizes() {
        for size in [16, 24, 32] {
            let key = vec![0x42u8; size];
            let ciphertext = encrypt(&key, b"bsn", AesCbcPkcs7Opts::default()).unwrap();
            assert_eq!(decrypt(&key, &ciphertext).unwrap(), b"bsn");
        }
        assert_eq!(
            encrypt(&[0u8; 10], b"bsn", AesCbcPkcs7Opts::default()),
            Err(CipherError::InvalidKeyLength(10))
        );
    }

    #[test]
    fn test_explicit_iv_is_prefix() {
        let iv = [0x11u8; 16];
        let ciphertext = encrypt(&KEY, b"hello", AesCbcPkcs7Opts::with_iv(iv)).unwrap();
        assert_eq!(&ciphertext[..16], &iv);
        assert_eq!(encrypt_with_iv(&KEY, &iv, b"hello").unwrap(), ciphertext);
    }

    #[test]
    fn test_value_and_reference_options_agree() {
        let by_value = encrypt(&KEY, b"hello", AesCbcPkcs7Opts::with_iv([5u8; 16])).unwrap();
        let mut opts = AesCbcPkcs7Opts::with_iv([5u8; 16]);
        let by_ref = encrypt(&KEY, b"hello", &mut opts).unwrap();
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_prng_iv_is_read_from_source() {
        let ciphertext = encrypt(
            &KEY,
            b"hello",
            AesCbcPkcs7Opts::with_prng(Cursor::new(vec![0xaau8; 32])),
        )
        .unwrap();
        assert_eq!(&ciphertext[..16], &[0xaau8; 16]);

        let mut prng = Cursor::new(vec![0xbbu8; 16]);
        let ciphertext = encrypt_with_rand(&KEY, &mut prng, b"hello").unwrap();
        assert_eq!(&ciphertext[..16], &[0xbbu8; 16]);
    }

    #[test]
    fn test_short_iv() {
        assert_eq!(
            encrypt(&KEY, b"hello", AesCbcPkcs7Opts::with_iv([0u8; 15])),
            Err(CipherError::InvalidIv {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn test_empty_iv_counts_as_unset() {
        let opts = AesCbcPkcs7Opts {
            iv: Some(Vec::new()),
            prng: Some(Box::new(Cursor::new(vec![1u8; 16]))),
        };
        let ciphertext = encrypt(&KEY, b"hello", opts).unwrap();
        assert_eq!(&ciphertext[..16], &[1u8; 16]);
    }

    #[test]
    fn test_conflicting_options() {
        let opts = AesCbcPkcs7Opts {
            iv: Some(vec![0u8; 16]),
            prng: Some(Box::new(Cursor::new(vec![0u8; 16]))),
        };
        assert_eq!(
            encrypt(&KEY, b"hello", opts),
            Err(CipherError::ConflictingOptions)
        );

        // conflict wins over every other problem
        let opts = AesCbcPkcs7Opts {
            iv: Some(vec![0u8; 3]),
            prng: Some(Box::new(Cursor::new(Vec::new()))),
        };
        assert_eq!(
            encrypt(&[0u8; 5], b"hello", opts),
            Err(CipherError::ConflictingOptions)
        );
    }

    #[test]
    fn test_short_read() {
        let result = encrypt(
            &KEY,
            b"hello",
            AesCbcPkcs7Opts::with_prng(Cursor::new(vec![0u8; 7])),
        );
        assert!(matches!(result, Err(CipherError::Randomness(_))));
    }

    #[test]
    fn test_default_ivs_differ() {
        let a = encrypt(&KEY, b"hello", AesCbcPkcs7Opts::default()).unwrap();
        let b = encrypt(&KEY, b"hello", AesCbcPkcs7Opts::default()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_ciphertext_lengths() {
        assert!(matches!(decrypt(&KEY, &[0u8; 15]), Err(CipherError::InvalidCiphertext(_))));
        assert!(matches!(decrypt(&KEY, &[0u8; 16]), Err(CipherError::InvalidCiphertext(_))));
        assert!(matches!(decrypt(&KEY, &[0u8; 40]), Err(CipherError::InvalidCiphertext(_))));
    }

    #[test]
    fn test_every_padding_byte_is_checked() {
        let ciphertext = encrypt(&KEY, b"hello", AesCbcPkcs7Opts::with_iv([0u8; 16])).unwrap();
        // "hello" leaves 11 pad bytes at offsets 5..16 of the only block;
        // flipping an IV byte flips the same plaintext byte
        for offset in 5..16 {
            let mut tampered = ciphertext.clone();
            tampered[offset] ^= 0x01;
            assert_eq!(
                decrypt(&KEY, &tampered),
                Err(CipherError::InvalidPadding),
                "offset {}",
                offset
            );
        }
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_ne!(bytes, vec![0u8; 32]);
    }
}
