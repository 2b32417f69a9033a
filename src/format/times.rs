//! The `<Times>` block shared by entries and groups.

use chrono::{DateTime, Utc};

use super::context::KdbxContext;
use crate::errors::Result;
use crate::xml::codec::{self, XmlBool};
use crate::xml::names::{
    ELEM_CREATION_TIME, ELEM_EXPIRES, ELEM_EXPIRY_TIME, ELEM_LAST_ACCESS_TIME, ELEM_LAST_MOD_TIME,
    ELEM_LOCATION_CHANGED, ELEM_TIMES, ELEM_USAGE_COUNT,
};
use crate::xml::Element;

/// Timestamps are whole seconds once they have been through XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Times {
    pub creation_time: Option<DateTime<Utc>>,
    pub last_mod_time: Option<DateTime<Utc>>,
    pub last_access_time: Option<DateTime<Utc>>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub expires: Option<XmlBool>,
    pub usage_count: Option<u64>,
    pub location_changed: Option<DateTime<Utc>>,
}

impl Times {
    /// Every timestamp set to now, not expiring, never used.
    pub fn create() -> Self {
        let now = Utc::now();
        Self {
            creation_time: Some(now),
            last_mod_time: Some(now),
            last_access_time: Some(now),
            expiry_time: Some(now),
            expires: Some(XmlBool::False),
            usage_count: Some(0),
            location_changed: Some(now),
        }
    }

    /// Mark as modified and accessed now.
    pub fn update(&mut self) {
        let now = Utc::now();
        self.last_mod_time = Some(now);
        self.last_access_time = Some(now);
    }

    /// Read a `<Times>` element.  Unknown children are ignored.
    pub fn read(node: &Element) -> Result<Self> {
        let mut times = Self::default();
        for child in node.elements() {
            match child.name() {
                ELEM_CREATION_TIME => times.creation_time = codec::get_date(child)?,
                ELEM_LAST_MOD_TIME => times.last_mod_time = codec::get_date(child)?,
                ELEM_LAST_ACCESS_TIME => times.last_access_time = codec::get_date(child)?,
                ELEM_EXPIRY_TIME => times.expiry_time = codec::get_date(child)?,
                ELEM_EXPIRES => times.expires = codec::get_boolean(child),
                ELEM_USAGE_COUNT => times.usage_count = codec::get_number(child),
                ELEM_LOCATION_CHANGED => times.location_changed = codec::get_date(child)?,
                _ => {}
            }
        }
        Ok(times)
    }

    /// Append a `<Times>` element to `parent`.  Every field is written,
    /// unset ones as empty elements.
    pub fn write(&self, parent: &mut Element, ctx: &KdbxContext) {
        let node = parent.add_child(ELEM_TIMES);
        ctx.set_xml_date(node.add_child(ELEM_CREATION_TIME), self.creation_time);
        ctx.set_xml_date(node.add_child(ELEM_LAST_MOD_TIME), self.last_mod_time);
        ctx.set_xml_date(node.add_child(ELEM_LAST_ACCESS_TIME), self.last_access_time);
        ctx.set_xml_date(node.add_child(ELEM_EXPIRY_TIME), self.expiry_time);
        codec::set_boolean(node.add_child(ELEM_EXPIRES), self.expires);
        codec::set_number(node.add_child(ELEM_USAGE_COUNT), self.usage_count);
        ctx.set_xml_date(node.add_child(ELEM_LOCATION_CHANGED), self.location_changed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Document;
    use chrono::TimeZone;

    #[test]
    fn create_sets_everything() {
        let t = Times::create();
        assert!(t.creation_time.is_some());
        assert_eq!(t.creation_time, t.location_changed);
        assert_eq!(t.expires, Some(XmlBool::False));
        assert_eq!(t.usage_count, Some(0));
    }

    #[test]
    fn update_only_touches_modification_and_access() {
        let mut t = Times::default();
        t.update();
        assert!(t.last_mod_time.is_some());
        assert_eq!(t.last_mod_time, t.last_access_time);
        assert!(t.creation_time.is_none());
    }

    #[test]
    fn read_ignores_unknown_children() {
        let doc = Document::parse(
            "<Times><UsageCount>7</UsageCount><Future>x</Future><Expires>null</Expires></Times>",
        )
        .unwrap();
        let t = Times::read(doc.root()).unwrap();
        assert_eq!(t.usage_count, Some(7));
        assert_eq!(t.expires, Some(XmlBool::Null));
        assert!(t.creation_time.is_none());
    }

    #[test]
    fn unset_fields_are_written_empty() {
        let mut parent = Element::new("Entry");
        let t = Times {
            creation_time: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..Times::default()
        };
        t.write(&mut parent, &KdbxContext::new(4, 0));
        let node = parent.child(ELEM_TIMES).unwrap();
        assert_eq!(node.elements().count(), 7);
        assert_eq!(node.child(ELEM_USAGE_COUNT).unwrap().text_content(), "");
        assert_eq!(Times::read(node).unwrap(), t);
    }
}
