use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::crypto::salt::{DEFAULT_REFILL_BYTES, MIN_REFILL_BYTES};
use crate::crypto::{BackendPreference, CryptoEngine, SaltGenerator};
use crate::errors::{KdbxError, Result};

/// Tool and library configuration, loaded from a TOML file.
///
/// Every field has a default so no config file is needed at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Which crypto backend to use: `auto`, `native` or `fallback`.
    #[serde(default)]
    pub backend: BackendPreference,

    /// Indent serialized XML.
    #[serde(default)]
    pub pretty_print: bool,

    /// Bytes pulled from the CSPRNG per salt-pool refill.
    #[serde(default = "default_salt_refill_bytes")]
    pub salt_refill_bytes: usize,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_salt_refill_bytes() -> usize {
    DEFAULT_REFILL_BYTES
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(),
            pretty_print: false,
            salt_refill_bytes: default_salt_refill_bytes(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Load settings from `path`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed or holds values below
    /// the enforced minimums, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KdbxError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.salt_refill_bytes < MIN_REFILL_BYTES {
            return Err(KdbxError::Config(format!(
                "salt_refill_bytes must be at least {MIN_REFILL_BYTES}, got {}",
                self.salt_refill_bytes
            )));
        }
        self.argon2_params().check_minimums()
    }

    /// A random-backed salt generator using the configured refill size.
    pub fn salt_generator(&self, engine: &CryptoEngine) -> SaltGenerator {
        SaltGenerator::random_with_refill(engine, self.salt_refill_bytes)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
            ..Argon2Params::default()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
