//! `<CustomData>` key/value dictionaries.

use chrono::{DateTime, Utc};

use super::context::KdbxContext;
use crate::errors::Result;
use crate::xml::codec;
use crate::xml::names::{
    ELEM_CUSTOM_DATA, ELEM_KEY, ELEM_LAST_MOD_TIME, ELEM_STRING_DICT_EX_ITEM, ELEM_VALUE,
};
use crate::xml::Element;

/// First format version that stores a per-item modification time.
const LAST_MOD_MIN_VERSION: (u16, u16) = (4, 1);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomDataItem {
    pub value: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl CustomDataItem {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            last_modified: None,
        }
    }
}

/// Keys are unique and keep their first insertion position; inserting
/// an existing key replaces its item in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomDataMap {
    items: Vec<(String, CustomDataItem)>,
}

impl CustomDataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, returning the previous item for `key`.
    pub fn insert(&mut self, key: impl Into<String>, item: CustomDataItem) -> Option<CustomDataItem> {
        let key = key.into();
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, item)),
            None => {
                self.items.push((key, item));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&CustomDataItem> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<CustomDataItem> {
        let idx = self.items.iter().position(|(k, _)| k == key)?;
        Some(self.items.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomDataItem)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }
}

pub struct CustomData;

impl CustomData {
    /// Read the `<Item>` children of a `<CustomData>` element.  Items
    /// without a key are dropped.
    pub fn read(node: &Element) -> Result<CustomDataMap> {
        let mut map = CustomDataMap::new();
        for item in node.elements() {
            if item.name() != ELEM_STRING_DICT_EX_ITEM {
                continue;
            }
            let mut key = String::new();
            let mut entry = CustomDataItem::default();
            for child in item.elements() {
                match child.name() {
                    ELEM_KEY => key = codec::get_text(child),
                    ELEM_VALUE => entry.value = Some(codec::get_text(child)),
                    ELEM_LAST_MOD_TIME => entry.last_modified = codec::get_date(child)?,
                    _ => {}
                }
            }
            if !key.is_empty() {
                map.insert(key, entry);
            }
        }
        Ok(map)
    }

    /// Append a `<CustomData>` element to `parent`.  Items with no value
    /// are skipped; modification times are written only for KDBX 4.1+.
    pub fn write(parent: &mut Element, ctx: &KdbxContext, data: Option<&CustomDataMap>) {
        let Some(data) = data else {
            return;
        };
        let (major, minor) = LAST_MOD_MIN_VERSION;
        let with_times = ctx.version_is_at_least(major, minor);

        let node = parent.add_child(ELEM_CUSTOM_DATA);
        for (key, item) in data.iter() {
            let Some(value) = item.value.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            let item_node = node.add_child(ELEM_STRING_DICT_EX_ITEM);
            codec::set_text(item_node.add_child(ELEM_KEY), Some(key));
            codec::set_text(item_node.add_child(ELEM_VALUE), Some(value));
            if with_times && item.last_modified.is_some() {
                ctx.set_xml_date(item_node.add_child(ELEM_LAST_MOD_TIME), item.last_modified);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Document;
    use chrono::TimeZone;

    fn sample() -> CustomDataMap {
        let mut map = CustomDataMap::new();
        map.insert(
            "plugin.a",
            CustomDataItem {
                value: Some("1".into()),
                last_modified: Some(Utc.with_ymd_and_hms(2023, 2, 3, 4, 5, 6).unwrap()),
            },
        );
        map.insert("plugin.b", CustomDataItem::new("2"));
        map
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = sample();
        let old = map.insert("plugin.a", CustomDataItem::new("9"));
        assert_eq!(old.unwrap().value.as_deref(), Some("1"));
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["plugin.a", "plugin.b"]);
        assert_eq!(map.get("plugin.a").unwrap().value.as_deref(), Some("9"));
    }

    #[test]
    fn absent_map_writes_nothing() {
        let mut parent = Element::new("Meta");
        CustomData::write(&mut parent, &KdbxContext::new(4, 1), None);
        assert!(parent.child(ELEM_CUSTOM_DATA).is_none());
    }

    #[test]
    fn empty_values_are_skipped() {
        let mut map = sample();
        map.insert("empty", CustomDataItem::new(""));
        map.insert("none", CustomDataItem::default());
        let mut parent = Element::new("Meta");
        CustomData::write(&mut parent, &KdbxContext::new(4, 0), Some(&map));
        let read = CustomData::read(parent.child(ELEM_CUSTOM_DATA).unwrap()).unwrap();
        assert_eq!(read.len(), 2);
        assert!(read.get("empty").is_none());
    }

    #[test]
    fn items_without_key_are_dropped() {
        let doc = Document::parse(
            "<CustomData><Item><Key></Key><Value>x</Value></Item>\
             <Item><Key>k</Key><Value>v</Value></Item></CustomData>",
        )
        .unwrap();
        let map = CustomData::read(doc.root()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("k").unwrap().value.as_deref(), Some("v"));
    }
}
