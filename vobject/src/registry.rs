// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Property registry: maps property names to value kinds.
//!
//! Unregistered properties decode to [`Value::Raw`] and serialize back
//! verbatim, so unknown vendor extensions survive a round trip.

use std::collections::HashMap;

use crate::contentline::ContentLine;
use crate::value::{Value, ValueKind};

/// Resolves a kind from the full content line, so the decision can use
/// parameters (`VALUE=DATE`, `ENCODING=b`) or the raw value shape.
pub type KindResolver = fn(&ContentLine) -> ValueKind;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Static(ValueKind),
    Resolver(KindResolver),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    kind: Kind,
    multiple: bool,
}

/// Maps property names to value kinds for one document flavor.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
}

impl Registry {
    /// An empty registry. Everything decodes to [`Value::Raw`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fixed kind for a property name.
    pub fn register(&mut self, name: &str, kind: ValueKind, multiple: bool) -> &mut Self {
        self.entries.insert(
            name.to_ascii_lowercase(),
            Entry {
                kind: Kind::Static(kind),
                multiple,
            },
        );
        self
    }

    /// Registers a resolver that picks the kind per content line.
    pub fn register_with_resolver(
        &mut self,
        name: &str,
        resolver: KindResolver,
        multiple: bool,
    ) -> &mut Self {
        self.entries.insert(
            name.to_ascii_lowercase(),
            Entry {
                kind: Kind::Resolver(resolver),
                multiple,
            },
        );
        self
    }

    /// Removes a registration. Subsequent decodes yield [`Value::Raw`].
    pub fn unregister(&mut self, name: &str) -> &mut Self {
        self.entries.remove(&name.to_ascii_lowercase());
        self
    }

    /// Resolves the kind for a content line, or `None` when unregistered.
    #[must_use]
    pub fn resolve_kind(&self, line: &ContentLine) -> Option<ValueKind> {
        match self.entries.get(&line.name.to_ascii_lowercase())?.kind {
            Kind::Static(kind) => Some(kind),
            Kind::Resolver(resolver) => Some(resolver(line)),
        }
    }

    /// Whether values of this property may be comma-separated on one line.
    #[must_use]
    pub fn allows_multiple(&self, name: &str) -> bool {
        self.entries
            .get(&name.to_ascii_lowercase())
            .is_some_and(|e| e.multiple)
    }

    /// The vCard 3.0/4.0 property set.
    #[must_use]
    pub fn vcard() -> Self {
        let mut r = Self::new();
        for name in ["N", "ORG", "ADR"] {
            r.register(name, ValueKind::Structured, false);
        }
        for name in ["FN", "TEL", "EMAIL", "NOTE", "TITLE", "ROLE", "X-ABLabel"] {
            r.register(name, ValueKind::Text, false);
        }
        for name in ["NICKNAME", "CATEGORIES"] {
            r.register(name, ValueKind::Text, true);
        }
        for name in ["BDAY", "ANNIVERSARY", "REV"] {
            r.register_with_resolver(name, date_or_date_time, false);
        }
        for name in ["PHOTO", "LOGO", "KEY", "SOUND"] {
            r.register_with_resolver(name, binary_or_uri, false);
        }
        for name in ["URL", "SOURCE", "MEMBER", "X-ADDRESSBOOKSERVER-MEMBER"] {
            r.register(name, ValueKind::Uri, false);
        }
        for name in ["X-ABDATE", "X-ABRELATEDNAMES", "X-SOCIALPROFILE"] {
            r.register(name, ValueKind::Grouped, false);
        }
        r
    }

    /// The iCalendar (RFC 5545) property set.
    ///
    /// `RRULE` is deliberately unregistered: recurrence rules stay
    /// [`Value::Raw`] and round-trip untouched.
    #[must_use]
    pub fn icalendar() -> Self {
        let mut r = Self::new();
        for name in [
            "SUMMARY",
            "DESCRIPTION",
            "LOCATION",
            "COMMENT",
            "STATUS",
            "TRANSP",
            "CLASS",
            "UID",
            "PRODID",
            "VERSION",
            "CALSCALE",
            "METHOD",
            "TZID",
        ] {
            r.register(name, ValueKind::Text, false);
        }
        for name in [
            "DTSTART",
            "DTEND",
            "DUE",
            "DTSTAMP",
            "COMPLETED",
            "CREATED",
            "LAST-MODIFIED",
            "RECURRENCE-ID",
        ] {
            r.register_with_resolver(name, date_or_date_time, false);
        }
        // EXDATE/RDATE carry comma-separated occurrence lists.
        for name in ["EXDATE", "RDATE"] {
            r.register_with_resolver(name, date_or_date_time, true);
        }
        for name in ["SEQUENCE", "PRIORITY", "PERCENT-COMPLETE", "REPEAT"] {
            r.register(name, ValueKind::Integer, false);
        }
        for name in ["CATEGORIES", "RESOURCES"] {
            r.register(name, ValueKind::Text, true);
        }
        r.register_with_resolver("ATTACH", binary_or_uri, false);
        for name in ["URL", "ORGANIZER", "ATTENDEE"] {
            r.register(name, ValueKind::Uri, false);
        }
        r
    }
}

/// `VALUE=DATE` or a bare 8-digit value is a date; otherwise a date-time.
fn date_or_date_time(line: &ContentLine) -> ValueKind {
    if let Some(param) = line.parameter("VALUE")
        && param.values.iter().any(|v| v.eq_ignore_ascii_case("date"))
    {
        return ValueKind::Date;
    }
    match line.first_value() {
        Some(Value::Date(_)) => ValueKind::Date,
        Some(Value::DateTime(_)) => ValueKind::DateTime,
        _ => match line.raw_value() {
            Some(raw) if !raw.contains(['T', 't']) => ValueKind::Date,
            _ => ValueKind::DateTime,
        },
    }
}

/// `ENCODING=b`/`BASE64` (or an already-binary value) is inline binary;
/// otherwise the value is a URI reference.
fn binary_or_uri(line: &ContentLine) -> ValueKind {
    if let Some(param) = line.parameter("ENCODING")
        && param
            .values
            .iter()
            .any(|v| v.eq_ignore_ascii_case("b") || v.eq_ignore_ascii_case("base64"))
    {
        return ValueKind::Binary;
    }
    match line.first_value() {
        Some(Value::Binary(_)) => ValueKind::Binary,
        _ => ValueKind::Uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contentline::Parameter;

    #[test]
    fn lookup_is_case_insensitive() {
        let r = Registry::vcard();
        let line = ContentLine {
            name: "fn".to_string(),
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&line), Some(ValueKind::Text));
    }

    #[test]
    fn value_date_parameter_forces_date() {
        let r = Registry::icalendar();
        let line = ContentLine {
            name: "DTSTART".to_string(),
            parameters: vec![Parameter::new("VALUE", "DATE")],
            values: vec![Value::Raw("20240301T120000".to_string())],
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&line), Some(ValueKind::Date));
    }

    #[test]
    fn raw_shape_selects_date_or_date_time() {
        let r = Registry::icalendar();
        let date = ContentLine {
            name: "DTSTART".to_string(),
            values: vec![Value::Raw("20240301".to_string())],
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&date), Some(ValueKind::Date));

        let dt = ContentLine {
            name: "DTSTART".to_string(),
            values: vec![Value::Raw("20240301T120000Z".to_string())],
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&dt), Some(ValueKind::DateTime));
    }

    #[test]
    fn encoding_parameter_selects_binary() {
        let r = Registry::vcard();
        let inline = ContentLine {
            name: "PHOTO".to_string(),
            parameters: vec![Parameter::new("ENCODING", "b")],
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&inline), Some(ValueKind::Binary));

        let by_reference = ContentLine {
            name: "PHOTO".to_string(),
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&by_reference), Some(ValueKind::Uri));
    }

    #[test]
    fn unregister_makes_property_raw() {
        let mut r = Registry::icalendar();
        r.unregister("SUMMARY");
        let line = ContentLine {
            name: "SUMMARY".to_string(),
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&line), None);
    }

    #[test]
    fn rrule_is_unregistered_by_default() {
        let r = Registry::icalendar();
        let line = ContentLine {
            name: "RRULE".to_string(),
            ..ContentLine::default()
        };
        assert_eq!(r.resolve_kind(&line), None);
    }

    #[test]
    fn multi_valued_properties_are_flagged() {
        let r = Registry::vcard();
        assert!(r.allows_multiple("CATEGORIES"));
        assert!(!r.allows_multiple("FN"));
    }

    #[test]
    fn resolver_registrations_keep_the_multiple_flag() {
        let r = Registry::icalendar();
        assert!(r.allows_multiple("EXDATE"));
        assert!(r.allows_multiple("RDATE"));
        assert!(!r.allows_multiple("DTSTART"));

        let mut r = Registry::new();
        r.register_with_resolver("X-OCCURRENCES", date_or_date_time, true);
        assert!(r.allows_multiple("X-OCCURRENCES"));
    }
}
