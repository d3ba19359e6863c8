//! Envelope encryption engine.
//!
//! A secret is encrypted in two sequential authenticated passes under keys
//! derived from the master key via a hash-chained salt sequence, then packed
//! together with all public materials into one base64 token. Decryption
//! re-derives the same keys from the token contents; nothing beyond the
//! master key is kept between calls.
//!
//! Every operation is a synchronous, CPU-bound pure function of its inputs
//! plus the immutable master key, so concurrent use needs no locking. The
//! two key derivations per call are deliberately slow.

pub mod dual;
pub mod envelope;
pub mod kdf;
pub mod salt_chain;

pub use envelope::Envelope;
pub use kdf::{KdfParams, derive_key};
pub use salt_chain::derive_chain;

use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::master_key::MasterKey;

/// Length of the random base salt the chain grows from (64 bytes).
pub const BASE_SALT_LEN: usize = 64;
/// Length of the outer-cipher IV (16 bytes for AES-256-GCM).
pub const OUTER_IV_LEN: usize = 16;
/// Length of the inner-cipher IV (12 bytes for ChaCha20-Poly1305).
pub const INNER_IV_LEN: usize = 12;
/// Length of each authentication tag (16 bytes).
pub const TAG_LEN: usize = 16;
/// Length of a derived encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Number of salts in the derivation chain.
pub const CHAIN_DEPTH: usize = 3;

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::fill(buf)
        .map_err(|_| CryptoError::Encryption("OS random generator unavailable".to_string()))
}

/// Derives the per-layer keys for one envelope.
///
/// Chain element 0 keys the outer cipher, element 1 the inner cipher.
fn layer_keys(
    master: &MasterKey,
    kdf: KdfParams,
    base_salt: &[u8; BASE_SALT_LEN],
) -> (Zeroizing<[u8; KEY_LEN]>, Zeroizing<[u8; KEY_LEN]>) {
    let salts = salt_chain::derive_chain(base_salt, CHAIN_DEPTH);

    let key_outer = kdf::derive_key(master.as_bytes(), &salts[0], kdf);
    let key_inner = kdf::derive_key(master.as_bytes(), &salts[1], kdf);

    (key_outer, key_inner)
}

/// Encrypts a secret into a self-contained envelope token.
///
/// The base salt and both IVs are freshly random on every call, so encrypting
/// the same plaintext twice yields two different tokens.
pub fn encrypt(master: &MasterKey, kdf: KdfParams, plaintext: &str) -> Result<String, CryptoError> {
    let mut base_salt = [0u8; BASE_SALT_LEN];
    secure_random(&mut base_salt)?;

    let mut iv_outer = [0u8; OUTER_IV_LEN];
    secure_random(&mut iv_outer)?;

    let mut iv_inner = [0u8; INNER_IV_LEN];
    secure_random(&mut iv_inner)?;

    let (key_outer, key_inner) = layer_keys(master, kdf, &base_salt);

    let (ciphertext, tag_outer, tag_inner) = dual::encrypt(
        plaintext.as_bytes(),
        &key_outer,
        &key_inner,
        &iv_outer,
        &iv_inner,
    )?;

    let envelope = Envelope::new(base_salt, iv_outer, iv_inner, tag_outer, tag_inner, ciphertext);

    Ok(envelope.pack())
}

/// Decrypts an envelope token produced by [`encrypt`].
///
/// The KDF parameters must match the ones used at encryption; they are engine
/// configuration, not envelope data.
pub fn decrypt(master: &MasterKey, kdf: KdfParams, token: &str) -> Result<String, CryptoError> {
    let envelope = Envelope::unpack(token)?;

    let (key_outer, key_inner) = layer_keys(master, kdf, envelope.base_salt());

    let plaintext = dual::decrypt(
        envelope.ciphertext(),
        &key_outer,
        &key_inner,
        envelope.iv_outer(),
        envelope.iv_inner(),
        envelope.tag_outer(),
        envelope.tag_inner(),
    )?;

    String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::MalformedEnvelope)
}
