//! XML layer for KDBX documents.
//!
//! - `dom`: a small owned element tree over `quick-xml`
//! - `names`: element and attribute vocabulary
//! - `codec`: typed getters and setters for one element
//! - `sweep`: tree-wide protection passes

pub mod codec;
pub mod dom;
pub mod names;
pub mod sweep;

pub use codec::{BinaryOrRef, ProtectedText, XmlBool, EPOCH_SECONDS};
pub use dom::{Document, Element, Node, Protection};
pub use sweep::{install_protection, protect_plain_values, rehide, resalt, reveal, traverse};
