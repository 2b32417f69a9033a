//! Salt-obfuscated in-memory values.
//!
//! A `ProtectedValue` keeps two equal-length buffers, `value` and
//! `salt`, with `plaintext[i] == value[i] ^ salt[i]`.  Plaintext is
//! recomputed on every read and never stored.  Both buffers are
//! zeroed on drop.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::engine::CryptoEngine;
use crate::errors::{KdbxError, Result};

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ProtectedValue {
    value: Vec<u8>,
    salt: Vec<u8>,
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

impl ProtectedValue {
    /// Wrap bytes that are already obfuscated, together with the salt
    /// that was drawn for their position in the document.
    pub fn from_parsed_xml(value: Vec<u8>, salt: Vec<u8>) -> Result<Self> {
        if value.len() != salt.len() {
            return Err(KdbxError::InvalidState(format!(
                "salt length {} does not match value length {}",
                salt.len(),
                value.len()
            )));
        }
        Ok(Self { value, salt })
    }

    pub fn from_plain_text(text: &str, engine: &CryptoEngine) -> Result<Self> {
        Self::from_binary(text.as_bytes(), engine)
    }

    pub fn from_binary(data: &[u8], engine: &CryptoEngine) -> Result<Self> {
        Self::from_binary_with_salt(data, engine.secure_random(data.len())?)
    }

    /// Obfuscate plaintext `data` with a caller-drawn salt of the same
    /// length.
    pub fn from_binary_with_salt(data: &[u8], salt: Vec<u8>) -> Result<Self> {
        if data.len() != salt.len() {
            return Err(KdbxError::InvalidState(format!(
                "salt length {} does not match value length {}",
                salt.len(),
                data.len()
            )));
        }
        let value = xor(data, &salt);
        Ok(Self { value, salt })
    }

    /// Decoded text.  Invalid UTF-8 is replaced, not rejected.
    pub fn text(&self) -> String {
        let plain = self.binary();
        String::from_utf8_lossy(&plain).into_owned()
    }

    /// Decoded bytes, zeroed when the returned buffer is dropped.
    pub fn binary(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(xor(&self.value, &self.salt))
    }

    /// Re-key the obfuscation with `new_salt`.  The plaintext is
    /// unchanged; on error nothing is modified.
    pub fn set_salt(&mut self, new_salt: Vec<u8>) -> Result<()> {
        if new_salt.len() != self.value.len() {
            return Err(KdbxError::InvalidState(format!(
                "salt length {} does not match value length {}",
                new_salt.len(),
                self.value.len()
            )));
        }
        let plain = self.binary();
        let mut value = xor(&plain, &new_salt);
        let mut salt = new_salt;
        std::mem::swap(&mut self.value, &mut value);
        std::mem::swap(&mut self.salt, &mut salt);
        value.zeroize();
        salt.zeroize();
        Ok(())
    }

    pub fn byte_len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Base64 of the obfuscated bytes, as stored in the XML document.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.value)
    }

    /// Whether the decoded text contains `needle`.
    pub fn includes(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let plain = self.binary();
        plain
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    /// SHA-256 of the plaintext.
    pub fn sha256(&self, engine: &CryptoEngine) -> Vec<u8> {
        let plain = self.binary();
        engine.sha256(&plain)
    }

    /// Constant-time plaintext comparison.
    pub fn eq_plain(&self, other: &ProtectedValue) -> bool {
        let a = self.binary();
        let b = other.binary();
        a.as_slice().ct_eq(b.as_slice()).into()
    }
}

impl fmt::Debug for ProtectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectedValue")
            .field("len", &self.value.len())
            .finish_non_exhaustive()
    }
}
