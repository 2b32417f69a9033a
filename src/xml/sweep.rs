//! Tree-wide protection sweeps.
//!
//! Each sweep is one pre-order traversal of the element tree.  The
//! salt generator is passed explicitly so document order determines
//! which salt bytes each value receives.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;
use zeroize::Zeroizing;

use super::codec::attribute_is_true;
use super::dom::{Element, Protection};
use super::names::{ATTR_PROTECTED, ATTR_PROTECTED_IN_MEM_PLAIN_XML, VAL_TRUE};
use crate::crypto::{ProtectedValue, SaltGenerator};
use crate::errors::{KdbxError, Result};

/// Visit `el` and all descendant elements, parents first.
pub fn traverse<F>(el: &mut Element, visit: &mut F) -> Result<()>
where
    F: FnMut(&mut Element) -> Result<()>,
{
    visit(el)?;
    for child in el.elements_mut() {
        traverse(child, visit)?;
    }
    Ok(())
}

/// Infallible form of [`traverse`].
fn walk<F>(el: &mut Element, visit: &mut F)
where
    F: FnMut(&mut Element),
{
    visit(el);
    for child in el.elements_mut() {
        walk(child, visit);
    }
}

/// Run once after parsing: turn the text of every `Protected="True"`
/// element into a `ProtectedValue` salted from `salt`.  Empty
/// elements consume no salt.  Returns the number of values installed.
pub fn install_protection(root: &mut Element, salt: &mut SaltGenerator) -> Result<usize> {
    let mut count = 0;
    traverse(root, &mut |el| {
        if !attribute_is_true(el, ATTR_PROTECTED) || !matches!(el.protection(), Protection::Plain)
        {
            return Ok(());
        }
        let value = BASE64.decode(el.text_content().trim()).map_err(|e| {
            KdbxError::corrupt_at(format!("bad protected value: {e}"), el.line())
        })?;
        if value.is_empty() {
            return Ok(());
        }
        let salt_bytes = salt.get_salt(value.len())?;
        let pv = ProtectedValue::from_parsed_xml(value, salt_bytes)
            .map_err(|e| KdbxError::corrupt_at(format!("bad protected value: {e}"), el.line()))?;
        el.set_protection(Protection::Protected(pv));
        count += 1;
        Ok(())
    })?;
    debug!(count, "protected values installed");
    Ok(count)
}

/// Run once before saving with a new generator: re-salt every
/// protected value and rewrite its text.
pub fn resalt(root: &mut Element, salt: &mut SaltGenerator) -> Result<usize> {
    let mut count = 0;
    traverse(root, &mut |el| {
        if !attribute_is_true(el, ATTR_PROTECTED) {
            return Ok(());
        }
        let len = match el.protection() {
            Protection::Protected(pv) => pv.byte_len(),
            _ => return Ok(()),
        };
        let new_salt = salt.get_salt(len)?;
        if let Protection::Protected(pv) = el.protection_mut() {
            pv.set_salt(new_salt)?;
            let text = pv.to_base64();
            el.replace_text(&text);
        }
        count += 1;
        Ok(())
    })?;
    debug!(count, "protected values re-salted");
    Ok(count)
}

/// Expose plaintext in the tree: each protected element is marked
/// `ProtectInMemory="True"` and its text replaced by the plaintext.
/// The value is kept so [`rehide`] needs no new salt.
pub fn reveal(root: &mut Element) -> usize {
    let mut count = 0;
    walk(root, &mut |el| {
        if !attribute_is_true(el, ATTR_PROTECTED) {
            return;
        }
        match el.take_protection() {
            Protection::Protected(pv) => {
                el.remove_attribute(ATTR_PROTECTED);
                el.set_attribute(ATTR_PROTECTED_IN_MEM_PLAIN_XML, VAL_TRUE);
                el.replace_text(&pv.text());
                el.set_protection(Protection::Revealed(pv));
                count += 1;
            }
            other => el.set_protection(other),
        }
    });
    debug!(count, "protected values revealed");
    count
}

/// Undo [`reveal`], restoring the obfuscated text of the same values.
pub fn rehide(root: &mut Element) -> usize {
    let mut count = 0;
    walk(root, &mut |el| {
        if !attribute_is_true(el, ATTR_PROTECTED_IN_MEM_PLAIN_XML) {
            return;
        }
        match el.take_protection() {
            Protection::Revealed(pv) => {
                el.remove_attribute(ATTR_PROTECTED_IN_MEM_PLAIN_XML);
                el.set_attribute(ATTR_PROTECTED, VAL_TRUE);
                el.replace_text(&pv.to_base64());
                el.set_protection(Protection::Protected(pv));
                count += 1;
            }
            other => el.set_protection(other),
        }
    });
    debug!(count, "protected values hidden");
    count
}

/// Protect every `ProtectInMemory="True"` element from its current
/// plaintext, with salt drawn from `salt`.  Used after the plaintext
/// was edited while revealed, or for documents imported as plain XML.
pub fn protect_plain_values(root: &mut Element, salt: &mut SaltGenerator) -> Result<usize> {
    let mut count = 0;
    traverse(root, &mut |el| {
        if !attribute_is_true(el, ATTR_PROTECTED_IN_MEM_PLAIN_XML) {
            return Ok(());
        }
        let plain = Zeroizing::new(el.text_content().into_bytes());
        let pv = ProtectedValue::from_binary_with_salt(&plain, salt.get_salt(plain.len())?)?;
        el.remove_attribute(ATTR_PROTECTED_IN_MEM_PLAIN_XML);
        el.set_attribute(ATTR_PROTECTED, VAL_TRUE);
        el.replace_text(&pv.to_base64());
        el.set_protection(Protection::Protected(pv));
        count += 1;
        Ok(())
    })?;
    debug!(count, "plain values protected");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CryptoEngine;
    use crate::xml::dom::Document;

    #[test]
    fn traverse_is_pre_order() {
        let mut doc = Document::parse("<A><B><C/></B><D/></A>").unwrap();
        let mut seen = Vec::new();
        traverse(doc.root_mut(), &mut |el| {
            seen.push(el.name().to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn install_skips_empty_and_unmarked_elements() {
        let engine = CryptoEngine::new();
        let mut doc = Document::parse(
            "<R><P Protected=\"True\"></P><Q Protected=\"False\">AQID</Q><S Protected=\"true\">AQID</S></R>",
        )
        .unwrap();
        let mut salt = SaltGenerator::random(&engine);
        assert_eq!(install_protection(doc.root_mut(), &mut salt).unwrap(), 1);
        assert_eq!(salt.bytes_issued(), 3);
        assert!(doc.root().child("S").unwrap().protection().value().is_some());
        assert!(doc.root().child("Q").unwrap().protection().value().is_none());
    }

    #[test]
    fn bad_base64_reports_line() {
        let engine = CryptoEngine::new();
        let mut doc = Document::parse("<R>\n<P Protected=\"True\">!!!</P></R>").unwrap();
        let mut salt = SaltGenerator::random(&engine);
        match install_protection(doc.root_mut(), &mut salt) {
            Err(KdbxError::FileCorrupt { line, .. }) => assert_eq!(line, Some(2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reveal_and_rehide_reach_nested_values() {
        let engine = CryptoEngine::new();
        let mut doc = Document::parse(
            "<R><A><V Protected=\"True\">AQID</V></A><B><C><V Protected=\"True\">BAUG</V></C></B></R>",
        )
        .unwrap();
        let mut salt = SaltGenerator::random(&engine);
        install_protection(doc.root_mut(), &mut salt).unwrap();
        let hidden = doc.serialize(false).unwrap();

        assert_eq!(reveal(doc.root_mut()), 2);
        assert_eq!(reveal(doc.root_mut()), 0);
        assert_eq!(rehide(doc.root_mut()), 2);
        assert_eq!(rehide(doc.root_mut()), 0);
        assert_eq!(doc.serialize(false).unwrap(), hidden);
    }

    #[test]
    fn protect_plain_values_converts_marked_text() {
        let engine = CryptoEngine::new();
        let mut doc =
            Document::parse("<R><V ProtectInMemory=\"True\">secret</V></R>").unwrap();
        let mut salt = SaltGenerator::random(&engine);
        assert_eq!(protect_plain_values(doc.root_mut(), &mut salt).unwrap(), 1);
        assert_eq!(salt.bytes_issued(), 6);

        let v = doc.root().child("V").unwrap();
        assert_eq!(v.attribute(ATTR_PROTECTED), Some(VAL_TRUE));
        assert_eq!(v.attribute(ATTR_PROTECTED_IN_MEM_PLAIN_XML), None);
        assert_ne!(v.text_content(), "secret");
        assert_eq!(v.protection().value().unwrap().text(), "secret");
    }
}
