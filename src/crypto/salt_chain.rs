use sha2::{Digest, Sha256};

use super::BASE_SALT_LEN;

/// Derives the ordered salt sequence used for layered key derivation.
///
/// Element 0 is the base salt itself; every later element is the SHA-256
/// digest of its predecessor. The chain is fully determined by the base salt,
/// so decryption rebuilds it from the 64 bytes recovered out of the envelope
/// and no per-layer salt is ever stored.
///
/// `depth` must be at least 1.
pub fn derive_chain(base_salt: &[u8; BASE_SALT_LEN], depth: usize) -> Vec<Vec<u8>> {
    let mut salts = Vec::with_capacity(depth);
    salts.push(base_salt.to_vec());

    for i in 1..depth {
        let digest = Sha256::digest(&salts[i - 1]);
        salts.push(digest.to_vec());
    }

    salts
}
