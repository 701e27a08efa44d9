//! SM2 public key encryption (GM/T 0003.4), ciphertext laid out as
//! `C1 || C3 || C2`
//!
//! - `C1`: ephemeral point `[k]G`, uncompressed (65 bytes)
//! - `C3`: `SM3(x2 || M || y2)` (32 bytes)
//! - `C2`: `M XOR KDF(x2 || y2, len(M))`

use rand_core::OsRng;
use sm2::{
    elliptic_curve::{sec1::ToEncodedPoint, subtle::ConstantTimeEq},
    NonZeroScalar, ProjectivePoint, PublicKey, SecretKey,
};
use sm3::{Digest, Sm3};
use zeroize::Zeroizing;

use crate::error::PkeError;

/// Uncompressed point length
const POINT_LEN: usize = 65;
/// SM3 output length
const HASH_LEN: usize = 32;

/// Fresh ephemeral keys drawn before giving up on a degenerate KDF output
const MAX_ATTEMPTS: usize = 16;

/// Shared point coordinates `(x2, y2)`
type SharedPoint = (Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>);

fn shared_point(point: &ProjectivePoint) -> Option<SharedPoint> {
    let encoded = point.to_affine().to_encoded_point(false);
    let x = encoded.x()?;
    let y = encoded.y()?;
    Some((Zeroizing::new(x.to_vec()), Zeroizing::new(y.to_vec())))
}

/// KDF from GM/T 0003.4 §5.4.3 over SM3
fn kdf(x2: &[u8], y2: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(len + HASH_LEN));
    let mut counter: u32 = 1;
    while out.len() < len {
        let block = Sm3::new()
            .chain_update(x2)
            .chain_update(y2)
            .chain_update(counter.to_be_bytes())
            .finalize();
        out.extend_from_slice(&block);
        counter = counter.wrapping_add(1);
    }
    out.truncate(len);
    out
}

fn tag(x2: &[u8], message: &[u8], y2: &[u8]) -> [u8; HASH_LEN] {
    Sm3::new()
        .chain_update(x2)
        .chain_update(message)
        .chain_update(y2)
        .finalize()
        .into()
}

/// Encrypt `plaintext` to `public_key`
pub fn encrypt(public_key: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, PkeError> {
    if plaintext.is_empty() {
        return Err(PkeError::Encryption("plaintext is empty".to_string()));
    }

    for _ in 0..MAX_ATTEMPTS {
        let k = NonZeroScalar::random(&mut OsRng);
        let c1 = PublicKey::from_secret_scalar(&k).to_encoded_point(false);

        let Some((x2, y2)) = shared_point(&(public_key.to_projective() * *k)) else {
            continue;
        };
        let t = kdf(&x2, &y2, plaintext.len());
        if t.iter().all(|&b| b == 0) {
            continue;
        }

        let mut out = Vec::with_capacity(POINT_LEN + HASH_LEN + plaintext.len());
        out.extend_from_slice(c1.as_bytes());
        out.extend_from_slice(&tag(&x2, plaintext, &y2));
        out.extend(plaintext.iter().zip(t.iter()).map(|(m, k)| m ^ k));
        return Ok(out);
    }

    Err(PkeError::Encryption(
        "could not derive a usable key stream".to_string(),
    ))
}

/// Decrypt a `C1 || C3 || C2` ciphertext with `secret_key`
pub fn decrypt(secret_key: &SecretKey, ciphertext: &[u8]) -> Result<Vec<u8>, PkeError> {
    if ciphertext.len() <= POINT_LEN + HASH_LEN {
        return Err(PkeError::Decryption(format!(
            "ciphertext too short: {} bytes",
            ciphertext.len()
        )));
    }
    let (c1, rest) = ciphertext.split_at(POINT_LEN);
    let (c3, c2) = rest.split_at(HASH_LEN);

    let c1 = PublicKey::from_sec1_bytes(c1)
        .map_err(|_| PkeError::Decryption("C1 is not a valid curve point".to_string()))?;
    let (x2, y2) = shared_point(&(c1.to_projective() * *secret_key.to_nonzero_scalar()))
        .ok_or_else(|| PkeError::Decryption("shared point is at infinity".to_string()))?;

    let t = kdf(&x2, &y2, c2.len());
    if t.iter().all(|&b| b == 0) {
        return Err(PkeError::Decryption("degenerate key stream".to_string()));
    }

    let message: Vec<u8> = c2.iter().zip(t.iter()).map(|(c, k)| c ^ k).collect();
    let expected = tag(&x2, &message, &y2);
    if !bool::from(expected[..].ct_eq(c3)) {
        return Err(PkeError::Decryption("integrity check failed".to_string()));
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let secret = SecretKey::random(&mut OsRng);
        let message = b"sm2 public key encryption";
        let ciphertext = encrypt(&secret.public_key(), message).unwrap();
        assert_eq!(ciphertext.len(), POINT_LEN + HASH_LEN + message.len());
        assert_eq!(ciphertext[0], 0x04);
        assert_eq!(decrypt(&secret, &ciphertext).unwrap(), message);
    }

    #[test]
    fn test_kdf_spans_blocks() {
        let t = kdf(b"x", b"y", 70);
        assert_eq!(t.len(), 70);
        assert_eq!(&t[..32], kdf(b"x", b"y", 32).as_slice());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let secret = SecretKey::random(&mut OsRng);
        let mut ciphertext = encrypt(&secret.public_key(), b"hello").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x80;
        assert!(matches!(decrypt(&secret, &ciphertext), Err(PkeError::Decryption(_))));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let secret = SecretKey::random(&mut OsRng);
        let other = SecretKey::random(&mut OsRng);
        let ciphertext = encrypt(&secret.public_key(), b"hello").unwrap();
        assert!(decrypt(&other, &ciphertext).is_err());
    }

    #[test]
    fn test_short_and_empty_inputs() {
        let secret = SecretKey::random(&mut OsRng);
        assert!(encrypt(&secret.public_key(), b"").is_err());
        assert!(decrypt(&secret, &[0x04; POINT_LEN + HASH_LEN]).is_err());
    }
}
