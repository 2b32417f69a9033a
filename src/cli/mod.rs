//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::{CryptoEngine, SaltGenerator};
use crate::errors::{KdbxError, Result};
use crate::xml::{self, Document};

/// Environment variable holding the tracing filter for the binary.
pub const LOG_ENV: &str = "KDBXCORE_LOG";

/// Environment variable `derive` reads the password from.
pub const PASSWORD_ENV: &str = "KDBXCORE_PASSWORD";

/// kdbxcore: inspect and re-salt decrypted KDBX XML payloads.
#[derive(Parser)]
#[command(
    name = "kdbxcore",
    about = "KDBX crypto and XML codec developer tool",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML settings file
    #[arg(long, global = true, env = "KDBXCORE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Print the hex digest of a file
    Hash {
        /// File to hash
        file: PathBuf,
        /// Use SHA-512 instead of SHA-256
        #[arg(long)]
        sha512: bool,
    },

    /// Print a document with its protected values in plaintext
    Reveal {
        /// Decrypted XML payload
        xml: PathBuf,
        /// Inner random stream key (base64)
        #[arg(long)]
        stream_key: String,
    },

    /// Re-salt every protected value under a fresh stream key
    Resalt {
        /// Decrypted XML payload
        xml: PathBuf,
        /// Current inner random stream key (base64)
        #[arg(long)]
        stream_key: String,
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Protect plain ProtectInMemory values under a fresh stream key
    Protect {
        /// XML payload with plaintext values
        xml: PathBuf,
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Derive a key with Argon2 using the configured costs
    Derive {
        /// KDF salt (base64)
        #[arg(long)]
        salt: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from `--config`, or defaults when none was given.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        Some(path) => Settings::load(path),
        None => Ok(Settings::default()),
    }
}

/// Decode a base64 stream key from the command line.
pub fn decode_stream_key(encoded: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = BASE64
        .decode(encoded.trim())
        .map_err(|e| KdbxError::Config(format!("--stream-key is not valid base64: {e}")))?;
    if key.is_empty() {
        return Err(KdbxError::Config("--stream-key is empty".into()));
    }
    Ok(Zeroizing::new(key))
}

/// Parse an XML file and install protection using the salt stream
/// derived from `stream_key`.
pub fn open_document(path: &Path, engine: &CryptoEngine, stream_key: &[u8]) -> Result<Document> {
    let contents = std::fs::read_to_string(path)?;
    let mut doc = Document::parse(&contents)?;
    let mut salt = SaltGenerator::from_stream_key(engine, stream_key)?;
    xml::install_protection(doc.root_mut(), &mut salt)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_key_must_be_base64() {
        assert!(decode_stream_key("AAEC").is_ok());
        assert!(decode_stream_key("not base64!").is_err());
        assert!(decode_stream_key("").is_err());
    }

    #[test]
    fn cli_parses_resalt() {
        let cli = Cli::try_parse_from([
            "kdbxcore",
            "resalt",
            "db.xml",
            "--stream-key",
            "AAEC",
            "-o",
            "out.xml",
        ])
        .unwrap();
        match cli.command {
            Commands::Resalt { output, .. } => assert_eq!(output, Some(PathBuf::from("out.xml"))),
            _ => panic!("expected resalt"),
        }
    }

    #[test]
    fn cli_parses_derive_and_protect() {
        let cli = Cli::try_parse_from(["kdbxcore", "derive", "--salt", "AAEC"]).unwrap();
        assert!(matches!(cli.command, Commands::Derive { ref salt } if salt == "AAEC"));

        let cli = Cli::try_parse_from(["kdbxcore", "protect", "plain.xml"]).unwrap();
        assert!(matches!(cli.command, Commands::Protect { output: None, .. }));
    }
}
