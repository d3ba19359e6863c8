use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::Zeroizing;

use super::KEY_LEN;
use crate::error::CryptoError;

/// Default PBKDF2 iteration count.
///
/// Sized so one derivation costs on the order of 100-300 ms on commodity
/// hardware.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Floor below which [`KdfParams::new`] rejects the iteration count.
pub const MIN_ITERATIONS: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Result<Self, CryptoError> {
        if iterations < MIN_ITERATIONS {
            return Err(CryptoError::Configuration(format!(
                "kdf iterations must be at least {MIN_ITERATIONS}"
            )));
        }

        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

/// Stretches (master key, salt) into a 32-byte encryption key.
///
/// PBKDF2 with HMAC-SHA-512. Deterministic: decryption re-derives keys from
/// the envelope's salt material instead of storing them, so identical inputs
/// must always produce the identical key.
pub fn derive_key(master: &[u8], salt: &[u8], kdf: KdfParams) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha512>(master, salt, kdf.iterations(), &mut key);

    Zeroizing::new(key)
}
