//! `kdbxcore derive`: run the Argon2 KDF with the configured costs.

use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroizing;

use crate::cli::commands::hash::to_hex;
use crate::cli::{load_settings, Cli, PASSWORD_ENV};
use crate::crypto::kdf::RustArgon2;
use crate::crypto::CryptoEngine;
use crate::errors::{KdbxError, Result};

/// Execute the `derive` command.
pub fn execute(cli: &Cli, salt: &str) -> Result<()> {
    let settings = load_settings(cli)?;
    let engine = CryptoEngine::from_settings(&settings)?.with_kdf(Arc::new(RustArgon2))?;

    let salt = BASE64
        .decode(salt.trim())
        .map_err(|e| KdbxError::Config(format!("--salt is not valid base64: {e}")))?;
    let password = read_password()?;

    let key = Zeroizing::new(engine.argon2(
        password.as_bytes(),
        &salt,
        &settings.argon2_params(),
    )?);
    println!("{}", to_hex(&key));
    Ok(())
}

/// Password from `KDBXCORE_PASSWORD`, else from piped stdin.
fn read_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    if io::stdin().is_terminal() {
        return Err(KdbxError::Config(format!(
            "no password: set {PASSWORD_ENV} or pipe it on stdin"
        )));
    }
    let mut buf = Zeroizing::new(String::new());
    io::stdin().read_to_string(&mut buf)?;
    let trimmed = buf.trim_end_matches(['\r', '\n']).len();
    buf.truncate(trimmed);
    Ok(buf)
}
