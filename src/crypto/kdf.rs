//! Memory-hard key derivation (Argon2 family).
//!
//! The engine ships no KDF of its own.  A caller registers an
//! implementation of [`MemoryHardKdf`] once, before the first
//! derivation; until then every request fails with `NotImplemented`.
//! [`RustArgon2`] adapts the `argon2` crate for callers that want it.

use argon2::{Algorithm, Argon2, Params, Version};

use crate::errors::{KdbxError, Result};

/// Minimum memory cost in KiB accepted for newly configured databases (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Argon2 variant, numbered as in the KDBX KDF parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Argon2Type {
    Argon2d = 0,
    Argon2id = 2,
}

/// Argon2 algorithm version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Argon2Version {
    V10 = 0x10,
    V13 = 0x13,
}

/// Full parameter set for one derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
    /// Output key length in bytes (default: 32).
    pub output_len: usize,
    pub variant: Argon2Type,
    pub version: Argon2Version,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
            output_len: 32,
            variant: Argon2Type::Argon2id,
            version: Argon2Version::V13,
        }
    }
}

impl Argon2Params {
    /// Reject dangerously weak settings for new databases.
    ///
    /// Existing files are opened with whatever their header says, so
    /// this is only applied to configured defaults.
    pub fn check_minimums(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(KdbxError::Config(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.iterations < 1 {
            return Err(KdbxError::Config(
                "Argon2 iterations must be at least 1".into(),
            ));
        }
        if self.parallelism < 1 {
            return Err(KdbxError::Config(
                "Argon2 parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A pluggable memory-hard KDF.
pub trait MemoryHardKdf: Send + Sync {
    fn derive(&self, password: &[u8], salt: &[u8], params: &Argon2Params) -> Result<Vec<u8>>;
}

/// [`MemoryHardKdf`] backed by the `argon2` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustArgon2;

impl MemoryHardKdf for RustArgon2 {
    fn derive(&self, password: &[u8], salt: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
        let algorithm = match params.variant {
            Argon2Type::Argon2d => Algorithm::Argon2d,
            Argon2Type::Argon2id => Algorithm::Argon2id,
        };
        let version = match params.version {
            Argon2Version::V10 => Version::V0x10,
            Argon2Version::V13 => Version::V0x13,
        };

        let argon2_params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(params.output_len),
        )
        .map_err(|e| KdbxError::InvalidState(format!("invalid Argon2 params: {e}")))?;

        let mut key = vec![0u8; params.output_len];
        Argon2::new(algorithm, version, argon2_params)
            .hash_password_into(password, salt, &mut key)
            .map_err(|e| KdbxError::InvalidState(format!("Argon2 hashing failed: {e}")))?;
        Ok(key)
    }
}
