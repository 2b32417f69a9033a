//! `kdbxcore protect`: protect plain `ProtectInMemory` values and save
//! them under a fresh inner random stream key.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::cli::output;
use crate::cli::{load_settings, Cli};
use crate::crypto::{CryptoEngine, SaltGenerator};
use crate::errors::Result;
use crate::xml::{self, Document};

/// Execute the `protect` command.
///
/// Values are first salted from the configured random pool, then
/// re-salted from the new stream before writing.
pub fn execute(cli: &Cli, path: &Path, output_path: Option<&Path>) -> Result<()> {
    let settings = load_settings(cli)?;
    let engine = CryptoEngine::from_settings(&settings)?;

    let contents = fs::read_to_string(path)?;
    let mut doc = Document::parse(&contents)?;
    let mut pool = settings.salt_generator(&engine);
    let count = xml::protect_plain_values(doc.root_mut(), &mut pool)?;

    let (mut stream, new_key) = SaltGenerator::fresh_stream(&engine)?;
    xml::resalt(doc.root_mut(), &mut stream)?;
    let content = doc.serialize(settings.pretty_print)?;

    match output_path {
        Some(dest) => {
            fs::write(dest, &content)?;
            output::success(&format!(
                "Protected {count} values into {}",
                dest.display()
            ));
        }
        None => print!("{content}"),
    }

    output::info(&format!("new stream key: {}", BASE64.encode(new_key.as_slice())));
    Ok(())
}
