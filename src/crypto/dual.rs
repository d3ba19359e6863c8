//! Dual-layer authenticated encryption.
//!
//! Outer pass: AES-256-GCM. Inner pass: ChaCha20-Poly1305 over the outer
//! ciphertext. Each pass has its own independently derived key, so a
//! structural weakness in one primitive does not by itself expose the secret.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{AesGcm, aes::Aes256};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use zeroize::Zeroizing;

use super::{INNER_IV_LEN, KEY_LEN, OUTER_IV_LEN, TAG_LEN};
use crate::error::CryptoError;

/// AES-256-GCM parameterized over the 16-byte IV the envelope carries.
type OuterCipher = AesGcm<Aes256, U16>;
type OuterNonce = aes_gcm::Nonce<U16>;

/// Encrypts plaintext through both cipher layers.
///
/// Returns the inner ciphertext and the two authentication tags, detached.
/// Zero-length plaintext is valid; the ciphertext is then empty but both tags
/// are still produced.
pub fn encrypt(
    plaintext: &[u8],
    key_outer: &[u8; KEY_LEN],
    key_inner: &[u8; KEY_LEN],
    iv_outer: &[u8; OUTER_IV_LEN],
    iv_inner: &[u8; INNER_IV_LEN],
) -> Result<(Vec<u8>, [u8; TAG_LEN], [u8; TAG_LEN]), CryptoError> {
    let outer = OuterCipher::new(GenericArray::from_slice(key_outer));
    let mut middle = outer
        .encrypt(OuterNonce::from_slice(iv_outer), plaintext)
        .map_err(|_| CryptoError::Encryption("outer cipher failure".to_string()))?;
    let tag_outer = split_tag(&mut middle)?;

    let inner = ChaCha20Poly1305::new(Key::from_slice(key_inner));
    let mut ciphertext = inner
        .encrypt(Nonce::from_slice(iv_inner), middle.as_slice())
        .map_err(|_| CryptoError::Encryption("inner cipher failure".to_string()))?;
    let tag_inner = split_tag(&mut ciphertext)?;

    Ok((ciphertext, tag_outer, tag_inner))
}

/// Reverses [`encrypt`]: verifies and strips the inner layer, then the outer.
///
/// Both layers fail with the same [`CryptoError::Integrity`]; the caller must
/// not learn which tag was rejected.
pub fn decrypt(
    ciphertext: &[u8],
    key_outer: &[u8; KEY_LEN],
    key_inner: &[u8; KEY_LEN],
    iv_outer: &[u8; OUTER_IV_LEN],
    iv_inner: &[u8; INNER_IV_LEN],
    tag_outer: &[u8; TAG_LEN],
    tag_inner: &[u8; TAG_LEN],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let inner = ChaCha20Poly1305::new(Key::from_slice(key_inner));
    let middle = inner
        .decrypt(
            Nonce::from_slice(iv_inner),
            join_tag(ciphertext, tag_inner).as_slice(),
        )
        .map_err(|_| CryptoError::Integrity)?;

    let outer = OuterCipher::new(GenericArray::from_slice(key_outer));
    let plaintext = outer
        .decrypt(
            OuterNonce::from_slice(iv_outer),
            join_tag(&middle, tag_outer).as_slice(),
        )
        .map_err(|_| CryptoError::Integrity)?;

    Ok(Zeroizing::new(plaintext))
}

/// Detaches the trailing authentication tag the AEAD appended.
fn split_tag(buf: &mut Vec<u8>) -> Result<[u8; TAG_LEN], CryptoError> {
    if buf.len() < TAG_LEN {
        return Err(CryptoError::Encryption(
            "ciphertext shorter than authentication tag".to_string(),
        ));
    }

    let tag_bytes = buf.split_off(buf.len() - TAG_LEN);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&tag_bytes);

    Ok(tag)
}

/// Re-attaches a detached tag for verification.
fn join_tag(ciphertext: &[u8], tag: &[u8; TAG_LEN]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(tag);
    buf
}
