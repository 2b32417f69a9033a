//! `kdbxcore hash`: print the SHA-256 or SHA-512 digest of a file.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::cli::{load_settings, Cli};
use crate::crypto::{CryptoEngine, HashAlgorithm};
use crate::errors::Result;

/// Execute the `hash` command.
pub fn execute(cli: &Cli, file: &Path, sha512: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let engine = CryptoEngine::from_settings(&settings)?;

    let data = fs::read(file)?;
    let algorithm = if sha512 {
        HashAlgorithm::Sha512
    } else {
        HashAlgorithm::Sha256
    };
    let digest = engine.hash(algorithm, &data);

    println!("{}  {}", to_hex(&digest), file.display());
    Ok(())
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(to_hex(&[0x00, 0x0f, 0xab]), "000fab");
    }
}
