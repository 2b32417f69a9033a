//! Tombstones under `<DeletedObjects>`.

use chrono::{DateTime, Utc};

use super::context::KdbxContext;
use super::uuid::KdbxUuid;
use crate::errors::Result;
use crate::xml::codec;
use crate::xml::names::{ELEM_DELETED_OBJECT, ELEM_DELETED_OBJECTS, ELEM_DELETION_TIME, ELEM_UUID};
use crate::xml::Element;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedObject {
    pub uuid: Option<KdbxUuid>,
    pub deletion_time: Option<DateTime<Utc>>,
}

impl DeletedObject {
    pub fn new(uuid: KdbxUuid, deletion_time: DateTime<Utc>) -> Self {
        Self {
            uuid: Some(uuid),
            deletion_time: Some(deletion_time),
        }
    }

    /// Read one `<DeletedObject>` element.
    pub fn read(node: &Element) -> Result<Self> {
        let mut obj = Self::default();
        for child in node.elements() {
            match child.name() {
                ELEM_UUID => obj.uuid = codec::get_uuid(child)?,
                ELEM_DELETION_TIME => obj.deletion_time = codec::get_date(child)?,
                _ => {}
            }
        }
        Ok(obj)
    }

    /// Append a `<DeletedObject>` element to `parent`.
    pub fn write(&self, parent: &mut Element, ctx: &KdbxContext) {
        let node = parent.add_child(ELEM_DELETED_OBJECT);
        codec::set_uuid(node.add_child(ELEM_UUID), self.uuid.as_ref());
        ctx.set_xml_date(node.add_child(ELEM_DELETION_TIME), self.deletion_time);
    }

    /// Read every `<DeletedObject>` child of a `<DeletedObjects>` element.
    pub fn read_all(node: &Element) -> Result<Vec<Self>> {
        node.elements()
            .filter(|child| child.name() == ELEM_DELETED_OBJECT)
            .map(Self::read)
            .collect()
    }

    /// Append a `<DeletedObjects>` element holding `items` to `parent`.
    pub fn write_all(parent: &mut Element, ctx: &KdbxContext, items: &[Self]) {
        let node = parent.add_child(ELEM_DELETED_OBJECTS);
        for item in items {
            item.write(node, ctx);
        }
    }
}
