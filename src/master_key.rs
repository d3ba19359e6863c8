//! Master key resolution and validation.
//!
//! The master key is configured as a 64-character hex string, decoded once at
//! startup, and injected into the engine. There is no fallback derivation
//! from deployment metadata: a missing or malformed key fails closed.

use getrandom::fill;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Raw length of the decoded master key (32 bytes / 256 bits).
pub const MASTER_KEY_LEN: usize = 32;
/// Length of the configured hex form.
pub const MASTER_KEY_HEX_LEN: usize = 64;

/// Environment variable holding the configured master key.
pub const MASTER_KEY_ENV: &str = "ENVAULT_MASTER_KEY";

/// The long-lived key all derivations start from.
///
/// Resolved once per process and treated as immutable, read-only state
/// afterwards. Never persisted.
pub struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey").field("bytes", &"<redacted>").finish()
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl MasterKey {
    /// Validates and decodes a configured master key value.
    ///
    /// Only the canonical form is accepted: exactly 64 hex characters.
    /// Anything else fails with [`CryptoError::Configuration`]; short values
    /// are never padded and long values are never truncated.
    pub fn resolve(configured: &str) -> Result<Self, CryptoError> {
        let value = configured.trim();

        if value.is_empty() {
            return Err(CryptoError::Configuration(
                "master key is not set".to_string(),
            ));
        }

        if value.len() != MASTER_KEY_HEX_LEN {
            return Err(CryptoError::Configuration(format!(
                "master key must be {MASTER_KEY_HEX_LEN} hex characters, got {}",
                value.len()
            )));
        }

        let decoded = hex::decode(value).map_err(|_| {
            CryptoError::Configuration("master key must be hexadecimal".to_string())
        })?;

        let mut bytes = [0u8; MASTER_KEY_LEN];
        bytes.copy_from_slice(&decoded);

        Ok(Self { bytes })
    }

    /// Resolves the master key from the `ENVAULT_MASTER_KEY` environment
    /// variable.
    pub fn from_env() -> Result<Self, CryptoError> {
        let configured = std::env::var(MASTER_KEY_ENV).map_err(|_| {
            CryptoError::Configuration(format!("{MASTER_KEY_ENV} is not set"))
        })?;

        Self::resolve(&configured)
    }

    /// Generates a fresh random master key in its configured hex form.
    ///
    /// Intended for initial setup; the caller is responsible for storing the
    /// value in their configuration.
    pub fn generate() -> Result<String, CryptoError> {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        fill(&mut bytes)
            .map_err(|_| CryptoError::Encryption("OS random generator unavailable".to_string()))?;

        let encoded = hex::encode(bytes);
        bytes.zeroize();
        Ok(encoded)
    }

    /// Raw key material fed into key derivation.
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_hex_key_resolves() {
        let key = MasterKey::resolve(&"ab".repeat(32)).unwrap();
        assert_eq!(key.as_bytes(), &[0xabu8; 32]);
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let key = MasterKey::resolve(&"AB".repeat(32)).unwrap();
        assert_eq!(key.as_bytes(), &[0xabu8; 32]);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let configured = format!("  {}\n", "00".repeat(32));
        assert!(MasterKey::resolve(&configured).is_ok());
    }

    #[test]
    fn empty_key_fails() {
        let err = MasterKey::resolve("").unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn short_key_is_not_padded() {
        let err = MasterKey::resolve(&"ab".repeat(16)).unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn long_key_is_not_truncated() {
        let err = MasterKey::resolve(&"ab".repeat(40)).unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn non_hex_key_fails() {
        let err = MasterKey::resolve(&"zz".repeat(32)).unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn generated_key_is_canonical() {
        let generated = MasterKey::generate().unwrap();
        assert_eq!(generated.len(), MASTER_KEY_HEX_LEN);
        assert!(MasterKey::resolve(&generated).is_ok());
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(
            MasterKey::generate().unwrap(),
            MasterKey::generate().unwrap()
        );
    }
}
