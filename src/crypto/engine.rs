//! `CryptoEngine`: the uniform primitive surface used by the container
//! layer and by the protected-value machinery.
//!
//! The engine wraps one [`CryptoBackend`] chosen at construction and an
//! optional, set-once memory-hard KDF.  Cloning an engine is cheap and
//! clones share both the backend and the KDF slot.

use std::fmt;
use std::sync::{Arc, OnceLock};

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use tracing::debug;

use super::backend::{self, AesCbcKey, BackendKind, BackendPreference, CryptoBackend};
use super::kdf::{Argon2Params, MemoryHardKdf};
use crate::config::Settings;
use crate::errors::{KdbxError, Result};

/// Largest number of random bytes requested from a backend in one call.
pub const MAX_RANDOM_QUOTA: usize = 65_536;

/// SHA-256 of the empty string.
#[rustfmt::skip]
pub const EMPTY_SHA256: [u8; 32] = [
    0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14,
    0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f, 0xb9, 0x24,
    0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c,
    0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52, 0xb8, 0x55,
];

/// SHA-512 of the empty string.
#[rustfmt::skip]
pub const EMPTY_SHA512: [u8; 64] = [
    0xcf, 0x83, 0xe1, 0x35, 0x7e, 0xef, 0xb8, 0xbd,
    0xf1, 0x54, 0x28, 0x50, 0xd6, 0x6d, 0x80, 0x07,
    0xd6, 0x20, 0xe4, 0x05, 0x0b, 0x57, 0x15, 0xdc,
    0x83, 0xf4, 0xa9, 0x21, 0xd3, 0x6c, 0xe9, 0xce,
    0x47, 0xd0, 0xd1, 0x3c, 0x5d, 0x85, 0xf2, 0xb0,
    0xff, 0x83, 0x18, 0xd2, 0x87, 0x7e, 0xec, 0x2f,
    0x63, 0xb9, 0x31, 0xbd, 0x47, 0x41, 0x7a, 0x81,
    0xa5, 0x38, 0x32, 0x7a, 0xf9, 0x27, 0xda, 0x3e,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

#[derive(Clone)]
pub struct CryptoEngine {
    backend: Arc<dyn CryptoBackend>,
    kdf: Arc<OnceLock<Arc<dyn MemoryHardKdf>>>,
}

impl fmt::Debug for CryptoEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoEngine")
            .field("backend", &self.backend.kind())
            .field("kdf_registered", &self.kdf.get().is_some())
            .finish()
    }
}

impl Default for CryptoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoEngine {
    /// Probe for the native backend and fall back transparently.
    pub fn new() -> Self {
        let backend = match backend::select(BackendPreference::Auto) {
            Ok(backend) => backend,
            // Auto never fails today; keep the pure-Rust path as the floor.
            Err(_) => Arc::new(super::fallback::FallbackBackend::new()),
        };
        Self::with_backend(backend)
    }

    /// Use an explicit backend (tests, cross-backend checks).
    pub fn with_backend(backend: Arc<dyn CryptoBackend>) -> Self {
        Self {
            backend,
            kdf: Arc::new(OnceLock::new()),
        }
    }

    /// Build an engine honoring the configured backend preference.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::with_backend(backend::select(settings.backend)?))
    }

    /// Register the KDF at construction time.
    pub fn with_kdf(self, kdf: Arc<dyn MemoryHardKdf>) -> Result<Self> {
        self.register_kdf(kdf)?;
        Ok(self)
    }

    /// Register the memory-hard KDF.  Allowed exactly once per engine
    /// (and its clones); a second registration is `InvalidState`.
    pub fn register_kdf(&self, kdf: Arc<dyn MemoryHardKdf>) -> Result<()> {
        self.kdf
            .set(kdf)
            .map_err(|_| KdbxError::InvalidState("KDF implementation already registered".into()))?;
        debug!("memory-hard KDF registered");
        Ok(())
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Digest `data`.  Empty input short-circuits to the well-known
    /// digest without touching the backend.
    pub fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
        match (algorithm, data.is_empty()) {
            (HashAlgorithm::Sha256, true) => EMPTY_SHA256.to_vec(),
            (HashAlgorithm::Sha512, true) => EMPTY_SHA512.to_vec(),
            (HashAlgorithm::Sha256, false) => self.backend.sha256(data),
            (HashAlgorithm::Sha512, false) => self.backend.sha512(data),
        }
    }

    pub fn sha256(&self, data: &[u8]) -> Vec<u8> {
        self.hash(HashAlgorithm::Sha256, data)
    }

    pub fn sha512(&self, data: &[u8]) -> Vec<u8> {
        self.hash(HashAlgorithm::Sha512, data)
    }

    /// HMAC-SHA256.
    pub fn keyed_hash(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.backend.hmac_sha256(key, data)
    }

    /// Open a new AES-256-CBC session.  It has no key until
    /// [`AesCbc::import_key`] is called.
    pub fn aes_cbc(&self) -> AesCbc {
        AesCbc {
            backend: Arc::clone(&self.backend),
            key: None,
        }
    }

    /// ChaCha20 (IETF, 96-bit nonce).  Encryption and decryption are the
    /// same operation.
    pub fn chacha20(&self, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let mut cipher = ChaCha20::new_from_slices(key, iv).map_err(|_| KdbxError::InvalidKey)?;
        let mut out = data.to_vec();
        cipher
            .try_apply_keystream(&mut out)
            .map_err(|_| KdbxError::InvalidState("ChaCha20 keystream exhausted".into()))?;
        Ok(out)
    }

    /// Exactly `len` bytes from the backend CSPRNG, requested in
    /// segments of at most [`MAX_RANDOM_QUOTA`].
    pub fn secure_random(&self, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; len];
        for segment in out.chunks_mut(MAX_RANDOM_QUOTA) {
            self.backend.fill_random(segment)?;
        }
        Ok(out)
    }

    /// Run the registered memory-hard KDF.
    pub fn argon2(&self, password: &[u8], salt: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
        let kdf = self
            .kdf
            .get()
            .ok_or_else(|| KdbxError::NotImplemented("argon2 not implemented".into()))?;
        kdf.derive(password, salt, params)
    }
}

/// A single-key AES-256-CBC session, reusable with different IVs.
pub struct AesCbc {
    backend: Arc<dyn CryptoBackend>,
    key: Option<Box<dyn AesCbcKey>>,
}

impl AesCbc {
    /// Import a raw 32-byte key.  Replaces any previously imported key.
    pub fn import_key(&mut self, key: &[u8]) -> Result<()> {
        self.key = Some(self.backend.aes_cbc_key(key)?);
        Ok(())
    }

    fn key(&self) -> Result<&dyn AesCbcKey> {
        self.key
            .as_deref()
            .ok_or_else(|| KdbxError::InvalidState("no key".into()))
    }

    pub fn encrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        self.key()?.encrypt(data, iv)
    }

    /// Padding failures surface as `InvalidKey`.
    pub fn decrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        self.key()?.decrypt(data, iv)
    }
}
