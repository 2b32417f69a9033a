//! Cryptographic primitives for kdbxcore.
//!
//! This module provides:
//! - Dual-backend primitive dispatch (`backend`, `native`, `fallback`)
//! - The `CryptoEngine` surface: hashing, HMAC, AES-CBC, ChaCha20,
//!   secure randomness and the pluggable Argon2 KDF (`engine`, `kdf`)
//! - Salt-obfuscated values and their salt stream (`protected`, `salt`)

pub mod backend;
pub mod engine;
pub mod fallback;
pub mod kdf;
#[cfg(feature = "native")]
pub mod native;
pub mod protected;
pub mod salt;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{CryptoEngine, ProtectedValue, SaltGenerator};
pub use backend::{BackendKind, BackendPreference, CryptoBackend};
pub use engine::{AesCbc, CryptoEngine, HashAlgorithm, EMPTY_SHA256, EMPTY_SHA512, MAX_RANDOM_QUOTA};
pub use kdf::{Argon2Params, Argon2Type, Argon2Version, MemoryHardKdf, RustArgon2};
pub use protected::ProtectedValue;
pub use salt::SaltGenerator;
