//! Envelope packing for encrypted secrets.
//!
//! Decoded layout:
//! ```text
//! BASE_SALT (64) | IV_OUTER (16) | IV_INNER (12) | TAG_OUTER (16) | TAG_INNER (16) | CIPHERTEXT
//! ```
//!
//! The whole buffer travels as standard base64 text; everything after byte
//! 124 is ciphertext.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{BASE_SALT_LEN, INNER_IV_LEN, OUTER_IV_LEN, TAG_LEN};
use crate::error::CryptoError;

/// Decoded length of everything before the ciphertext.
pub const HEADER_LEN: usize = BASE_SALT_LEN + OUTER_IV_LEN + INNER_IV_LEN + TAG_LEN + TAG_LEN;

#[derive(Debug)]
pub struct Envelope {
    base_salt: [u8; BASE_SALT_LEN],
    iv_outer: [u8; OUTER_IV_LEN],
    iv_inner: [u8; INNER_IV_LEN],
    tag_outer: [u8; TAG_LEN],
    tag_inner: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn new(
        base_salt: [u8; BASE_SALT_LEN],
        iv_outer: [u8; OUTER_IV_LEN],
        iv_inner: [u8; INNER_IV_LEN],
        tag_outer: [u8; TAG_LEN],
        tag_inner: [u8; TAG_LEN],
        ciphertext: Vec<u8>,
    ) -> Self {
        Self {
            base_salt,
            iv_outer,
            iv_inner,
            tag_outer,
            tag_inner,
            ciphertext,
        }
    }

    pub fn base_salt(&self) -> &[u8; BASE_SALT_LEN] {
        &self.base_salt
    }

    pub fn iv_outer(&self) -> &[u8; OUTER_IV_LEN] {
        &self.iv_outer
    }

    pub fn iv_inner(&self) -> &[u8; INNER_IV_LEN] {
        &self.iv_inner
    }

    pub fn tag_outer(&self) -> &[u8; TAG_LEN] {
        &self.tag_outer
    }

    pub fn tag_inner(&self) -> &[u8; TAG_LEN] {
        &self.tag_inner
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes the envelope into its text token form.
    pub fn pack(&self) -> String {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());

        buf.extend_from_slice(&self.base_salt);
        buf.extend_from_slice(&self.iv_outer);
        buf.extend_from_slice(&self.iv_inner);
        buf.extend_from_slice(&self.tag_outer);
        buf.extend_from_slice(&self.tag_inner);
        buf.extend_from_slice(&self.ciphertext);

        STANDARD.encode(buf)
    }

    /// Parses a text token back into an envelope.
    ///
    /// # Errors
    ///
    /// [`CryptoError::MalformedEnvelope`] if the token is not valid base64 or
    /// decodes to fewer bytes than the fixed header.
    pub fn unpack(token: &str) -> Result<Self, CryptoError> {
        let data = STANDARD
            .decode(token.trim())
            .map_err(|_| CryptoError::MalformedEnvelope)?;

        if data.len() < HEADER_LEN {
            return Err(CryptoError::MalformedEnvelope);
        }

        let mut offset = 0;

        let base_salt: [u8; BASE_SALT_LEN] = data[offset..offset + BASE_SALT_LEN]
            .try_into()
            .map_err(|_| CryptoError::MalformedEnvelope)?;
        offset += BASE_SALT_LEN;

        let iv_outer: [u8; OUTER_IV_LEN] = data[offset..offset + OUTER_IV_LEN]
            .try_into()
            .map_err(|_| CryptoError::MalformedEnvelope)?;
        offset += OUTER_IV_LEN;

        let iv_inner: [u8; INNER_IV_LEN] = data[offset..offset + INNER_IV_LEN]
            .try_into()
            .map_err(|_| CryptoError::MalformedEnvelope)?;
        offset += INNER_IV_LEN;

        let tag_outer: [u8; TAG_LEN] = data[offset..offset + TAG_LEN]
            .try_into()
            .map_err(|_| CryptoError::MalformedEnvelope)?;
        offset += TAG_LEN;

        let tag_inner: [u8; TAG_LEN] = data[offset..offset + TAG_LEN]
            .try_into()
            .map_err(|_| CryptoError::MalformedEnvelope)?;
        offset += TAG_LEN;

        let ciphertext = data[offset..].to_vec();

        Ok(Self {
            base_salt,
            iv_outer,
            iv_inner,
            tag_outer,
            tag_inner,
            ciphertext,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ciphertext: Vec<u8>) -> Envelope {
        Envelope::new(
            [1u8; BASE_SALT_LEN],
            [2u8; OUTER_IV_LEN],
            [3u8; INNER_IV_LEN],
            [4u8; TAG_LEN],
            [5u8; TAG_LEN],
            ciphertext,
        )
    }

    #[test]
    fn header_len_is_124() {
        assert_eq!(HEADER_LEN, 124);
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let token = sample(vec![6u8; 10]).pack();
        let parsed = Envelope::unpack(&token).unwrap();

        assert_eq!(parsed.base_salt(), &[1u8; BASE_SALT_LEN]);
        assert_eq!(parsed.iv_outer(), &[2u8; OUTER_IV_LEN]);
        assert_eq!(parsed.iv_inner(), &[3u8; INNER_IV_LEN]);
        assert_eq!(parsed.tag_outer(), &[4u8; TAG_LEN]);
        assert_eq!(parsed.tag_inner(), &[5u8; TAG_LEN]);
        assert_eq!(parsed.ciphertext(), &[6u8; 10]);
    }

    #[test]
    fn decoded_length_is_header_plus_ciphertext() {
        for len in [0usize, 1, 17, 300] {
            let token = sample(vec![0u8; len]).pack();
            let decoded = STANDARD.decode(&token).unwrap();
            assert_eq!(decoded.len(), HEADER_LEN + len);
        }
    }

    #[test]
    fn empty_ciphertext_roundtrips() {
        let token = sample(Vec::new()).pack();
        let parsed = Envelope::unpack(&token).unwrap();

        assert!(parsed.ciphertext().is_empty());
    }

    #[test]
    fn short_token_fails() {
        let token = STANDARD.encode(vec![0u8; HEADER_LEN - 1]);

        assert!(matches!(
            Envelope::unpack(&token),
            Err(CryptoError::MalformedEnvelope)
        ));
    }

    #[test]
    fn invalid_base64_fails() {
        assert!(matches!(
            Envelope::unpack("***definitely not base64***"),
            Err(CryptoError::MalformedEnvelope)
        ));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let token = format!("  {}\n", sample(vec![6u8; 4]).pack());

        assert!(Envelope::unpack(&token).is_ok());
    }
}
