//! `kdbxcore resalt`: re-salt every protected value under a new
//! inner random stream key.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::cli::output;
use crate::cli::{decode_stream_key, load_settings, open_document, Cli};
use crate::crypto::{CryptoEngine, SaltGenerator};
use crate::errors::Result;
use crate::xml;

/// Execute the `resalt` command.
///
/// The new stream key is printed to stderr; without it the output
/// cannot be opened again.
pub fn execute(
    cli: &Cli,
    path: &Path,
    stream_key: &str,
    output_path: Option<&Path>,
) -> Result<()> {
    let settings = load_settings(cli)?;
    let engine = CryptoEngine::from_settings(&settings)?;
    let key = decode_stream_key(stream_key)?;

    let mut doc = open_document(path, &engine, &key)?;
    let (mut salt, new_key) = SaltGenerator::fresh_stream(&engine)?;
    let count = xml::resalt(doc.root_mut(), &mut salt)?;
    let content = doc.serialize(settings.pretty_print)?;

    match output_path {
        Some(dest) => {
            fs::write(dest, &content)?;
            output::success(&format!(
                "Re-salted {count} protected values into {}",
                dest.display()
            ));
        }
        None => {
            // Write to stdout (no success message, just raw output).
            print!("{content}");
        }
    }

    output::info(&format!("new stream key: {}", BASE64.encode(new_key.as_slice())));
    output::tip("Pass this key as --stream-key to open the re-salted output.");
    Ok(())
}
