//! 16-byte KDBX identifiers.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::crypto::CryptoEngine;
use crate::errors::{KdbxError, Result};

pub const UUID_LEN: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KdbxUuid([u8; UUID_LEN]);

impl KdbxUuid {
    /// Wrap exactly 16 bytes; any other length is a corrupt identifier.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; UUID_LEN] = bytes.try_into().map_err(|_| {
            KdbxError::corrupt(format!(
                "identifier must be {UUID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn random(engine: &CryptoEngine) -> Result<Self> {
        Self::from_bytes(&engine.secure_random(UUID_LEN)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// All-zero identifiers mean "none" in KDBX.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<[u8; UUID_LEN]> for KdbxUuid {
    fn from(raw: [u8; UUID_LEN]) -> Self {
        Self(raw)
    }
}

impl fmt::Display for KdbxUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE64.encode(self.0))
    }
}

impl fmt::Debug for KdbxUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KdbxUuid({self})")
    }
}
