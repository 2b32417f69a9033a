//! Backend selection for the crypto primitives.
//!
//! Every primitive except the memory-hard KDF has two implementations:
//! a native one (ring + the `cbc` mode crate) and a pure-Rust fallback
//! (`sha2`, `hmac`, `rand`, AES-CBC chained by hand over the `aes`
//! block primitive).  The backend is picked once by [`select`] and
//! never re-evaluated per call.  Both produce identical bytes for
//! identical inputs.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{KdbxError, Result};

/// Which implementation is serving the primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Native,
    Fallback,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Backend choice as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Probe for the native backend, fall back if it is unavailable.
    #[default]
    Auto,
    Native,
    Fallback,
}

/// A keyed AES-256-CBC instance with PKCS#7 padding.
pub trait AesCbcKey: Send + Sync {
    fn encrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>>;

    /// Must fail with [`KdbxError::InvalidKey`] on any padding or
    /// length inconsistency.
    fn decrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>>;
}

/// The capability surface both backends implement.
pub trait CryptoBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn sha256(&self, data: &[u8]) -> Vec<u8>;

    fn sha512(&self, data: &[u8]) -> Vec<u8>;

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// Fill `buf` from the backend's CSPRNG.  Callers never pass more
    /// than [`crate::crypto::engine::MAX_RANDOM_QUOTA`] bytes at once.
    fn fill_random(&self, buf: &mut [u8]) -> Result<()>;

    /// Import a raw AES key.  Wrong key sizes fail with `InvalidKey`.
    fn aes_cbc_key(&self, key: &[u8]) -> Result<Box<dyn AesCbcKey>>;
}

/// Build a specific backend.  Asking for `Native` when the crate was
/// built without the `native` feature, or when the platform RNG does
/// not answer, is a `Config` error.
pub fn create(kind: BackendKind) -> Result<Arc<dyn CryptoBackend>> {
    match kind {
        BackendKind::Fallback => Ok(Arc::new(super::fallback::FallbackBackend::new())),
        BackendKind::Native => native_backend().ok_or_else(|| {
            KdbxError::Config("native crypto backend is not available".into())
        }),
    }
}

/// Resolve a preference into a backend, probing once.
pub fn select(preference: BackendPreference) -> Result<Arc<dyn CryptoBackend>> {
    let backend = match preference {
        BackendPreference::Native => create(BackendKind::Native)?,
        BackendPreference::Fallback => create(BackendKind::Fallback)?,
        BackendPreference::Auto => match native_backend() {
            Some(backend) => backend,
            None => {
                warn!("native crypto backend unavailable, using pure-Rust fallback");
                create(BackendKind::Fallback)?
            }
        },
    };
    debug!(backend = %backend.kind(), "crypto backend selected");
    Ok(backend)
}

#[cfg(feature = "native")]
fn native_backend() -> Option<Arc<dyn CryptoBackend>> {
    super::native::NativeBackend::probe().map(|b| Arc::new(b) as Arc<dyn CryptoBackend>)
}

#[cfg(not(feature = "native"))]
fn native_backend() -> Option<Arc<dyn CryptoBackend>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_always_available() {
        let backend = select(BackendPreference::Fallback).unwrap();
        assert_eq!(backend.kind(), BackendKind::Fallback);
    }

    #[cfg(feature = "native")]
    #[test]
    fn auto_prefers_native_when_compiled_in() {
        let backend = select(BackendPreference::Auto).unwrap();
        assert_eq!(backend.kind(), BackendKind::Native);
    }

    #[cfg(not(feature = "native"))]
    #[test]
    fn native_request_without_feature_is_config_error() {
        assert!(matches!(
            select(BackendPreference::Native),
            Err(KdbxError::Config(_))
        ));
    }
}
