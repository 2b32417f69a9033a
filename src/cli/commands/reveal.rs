//! `kdbxcore reveal`: print a document with protected values in plaintext.

use std::path::Path;

use crate::cli::output;
use crate::cli::{decode_stream_key, load_settings, open_document, Cli};
use crate::crypto::CryptoEngine;
use crate::errors::Result;
use crate::xml;

/// Execute the `reveal` command.
pub fn execute(cli: &Cli, path: &Path, stream_key: &str) -> Result<()> {
    let settings = load_settings(cli)?;
    let engine = CryptoEngine::from_settings(&settings)?;
    let key = decode_stream_key(stream_key)?;

    let mut doc = open_document(path, &engine, &key)?;
    let count = xml::reveal(doc.root_mut());

    print!("{}", doc.serialize(settings.pretty_print)?);
    output::info(&format!("{count} protected values revealed"));
    Ok(())
}
