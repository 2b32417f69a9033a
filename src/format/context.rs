//! Per-document write context.

use chrono::{DateTime, Utc};

use crate::xml::codec;
use crate::xml::Element;

/// How dates are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePolicy {
    /// Binary for KDBX 4 and later, text before.
    ByVersion,
    /// Always base64 of 8 little-endian bytes.
    Binary,
    /// Always ISO-8601 text.
    Text,
}

/// The declared version of the document being written, plus the date
/// policy that follows from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdbxContext {
    pub major: u16,
    pub minor: u16,
    pub date_policy: DatePolicy,
}

impl KdbxContext {
    pub fn new(major: u16, minor: u16) -> Self {
        Self {
            major,
            minor,
            date_policy: DatePolicy::ByVersion,
        }
    }

    /// Override the version-derived date form, e.g. for XML export.
    pub fn with_date_policy(mut self, policy: DatePolicy) -> Self {
        self.date_policy = policy;
        self
    }

    pub fn version_is_at_least(&self, major: u16, minor: u16) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    pub fn binary_dates(&self) -> bool {
        match self.date_policy {
            DatePolicy::ByVersion => self.major >= 4,
            DatePolicy::Binary => true,
            DatePolicy::Text => false,
        }
    }

    /// Write `date` in the form this document uses.
    pub fn set_xml_date(&self, el: &mut Element, date: Option<DateTime<Utc>>) {
        codec::set_date(el, date, self.binary_dates());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn version_comparison_is_lexicographic() {
        let ctx = KdbxContext::new(4, 0);
        assert!(ctx.version_is_at_least(3, 1));
        assert!(ctx.version_is_at_least(4, 0));
        assert!(!ctx.version_is_at_least(4, 1));
        assert!(KdbxContext::new(5, 0).version_is_at_least(4, 1));
    }

    #[test]
    fn date_form_follows_version_unless_overridden() {
        assert!(KdbxContext::new(4, 0).binary_dates());
        assert!(!KdbxContext::new(3, 1).binary_dates());
        assert!(!KdbxContext::new(4, 1)
            .with_date_policy(DatePolicy::Text)
            .binary_dates());
        assert!(KdbxContext::new(3, 1)
            .with_date_policy(DatePolicy::Binary)
            .binary_dates());
    }

    #[test]
    fn set_xml_date_writes_text_for_kdbx3() {
        let mut el = Element::new("T");
        let dt = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        KdbxContext::new(3, 1).set_xml_date(&mut el, Some(dt));
        assert_eq!(el.text_content(), "2021-03-04T05:06:07Z");
    }
}
