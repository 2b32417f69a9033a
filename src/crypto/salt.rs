//! Document-scoped salt stream for protected values.
//!
//! Every `ProtectedValue` created while loading a document draws its
//! salt from one `SaltGenerator`, in document order.  Ranges handed out
//! by one generator never overlap.  A new generator is created for
//! each save so an unchanged database still produces fresh ciphertext.

use std::fmt;

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use tracing::debug;
use zeroize::Zeroizing;

use super::engine::CryptoEngine;
use crate::errors::{KdbxError, Result};

/// Default number of bytes pulled from the CSPRNG per refill.
pub const DEFAULT_REFILL_BYTES: usize = 4096;

/// Smallest refill size accepted from settings.
pub const MIN_REFILL_BYTES: usize = 64;

/// Length of a KDBX inner random stream key.
pub const STREAM_KEY_LEN: usize = 64;

enum SaltSource {
    /// Pooled bytes from `CryptoEngine::secure_random`.
    Random {
        engine: CryptoEngine,
        pool: Zeroizing<Vec<u8>>,
        pos: usize,
        refill: usize,
    },
    /// KDBX 4 inner random stream (ChaCha20 keyed from SHA-512 of the key).
    ChaCha20(Box<ChaCha20>),
}

pub struct SaltGenerator {
    source: SaltSource,
    issued: u64,
}

impl fmt::Debug for SaltGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            SaltSource::Random { .. } => "random",
            SaltSource::ChaCha20(_) => "chacha20",
        };
        f.debug_struct("SaltGenerator")
            .field("source", &source)
            .field("issued", &self.issued)
            .finish()
    }
}

impl SaltGenerator {
    /// A fresh generator backed by the engine's CSPRNG.
    pub fn random(engine: &CryptoEngine) -> Self {
        Self::random_with_refill(engine, DEFAULT_REFILL_BYTES)
    }

    pub fn random_with_refill(engine: &CryptoEngine, refill_bytes: usize) -> Self {
        Self {
            source: SaltSource::Random {
                engine: engine.clone(),
                pool: Zeroizing::new(Vec::new()),
                pos: 0,
                refill: refill_bytes.max(MIN_REFILL_BYTES),
            },
            issued: 0,
        }
    }

    /// The salt stream of a KDBX 4 document, derived from its inner
    /// random stream key: `h = SHA-512(key)`, ChaCha20 with key
    /// `h[0..32]` and nonce `h[32..44]`.
    pub fn from_stream_key(engine: &CryptoEngine, key: &[u8]) -> Result<Self> {
        let hash = Zeroizing::new(engine.sha512(key));
        let cipher =
            ChaCha20::new_from_slices(&hash[..32], &hash[32..44]).map_err(|_| KdbxError::InvalidKey)?;
        Ok(Self {
            source: SaltSource::ChaCha20(Box::new(cipher)),
            issued: 0,
        })
    }

    /// A generator seeded with a freshly drawn stream key.  Returns the
    /// key too, since the container layer must store it in the header.
    pub fn fresh_stream(engine: &CryptoEngine) -> Result<(Self, Zeroizing<Vec<u8>>)> {
        let key = Zeroizing::new(engine.secure_random(STREAM_KEY_LEN)?);
        let generator = Self::from_stream_key(engine, &key)?;
        Ok((generator, key))
    }

    /// The next `len` bytes of the stream.
    pub fn get_salt(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        match &mut self.source {
            SaltSource::Random {
                engine,
                pool,
                pos,
                refill,
            } => {
                while out.len() < len {
                    if *pos == pool.len() {
                        *pool = Zeroizing::new(engine.secure_random(*refill)?);
                        *pos = 0;
                        debug!(bytes = *refill, "salt pool refilled");
                    }
                    let take = (len - out.len()).min(pool.len() - *pos);
                    out.extend_from_slice(&pool[*pos..*pos + take]);
                    // Spent bytes are wiped so they cannot be handed out again.
                    pool[*pos..*pos + take].fill(0);
                    *pos += take;
                }
            }
            SaltSource::ChaCha20(cipher) => {
                out.resize(len, 0);
                cipher
                    .try_apply_keystream(&mut out)
                    .map_err(|_| KdbxError::InvalidState("salt stream exhausted".into()))?;
            }
        }
        self.issued += len as u64;
        Ok(out)
    }

    /// Total bytes handed out so far.
    pub fn bytes_issued(&self) -> u64 {
        self.issued
    }
}
