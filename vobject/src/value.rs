// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Typed property values and their wire kinds.

use crate::contentline::ContentLine;

/// A decoded property value.
///
/// Every variant except [`Value::Raw`] corresponds to a [`ValueKind`].
/// `Raw` carries wire text for properties with no registered kind; it is
/// written back verbatim, which keeps unknown properties lossless.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Escaped free-form text.
    Text(String),
    /// Semicolon-separated fields, e.g. the `N` or `ADR` components.
    Structured(Vec<String>),
    /// Signed integer.
    Integer(i64),
    /// `TRUE` / `FALSE`.
    Boolean(bool),
    /// Calendar date without a time component.
    Date(ValueDate),
    /// Calendar date with a time component.
    DateTime(ValueDateTime),
    /// Unvalidated URI text.
    Uri(String),
    /// Base64-transported binary payload.
    Binary(Vec<u8>),
    /// An `itemN.`-grouped value with its sibling properties.
    Grouped(GroupedValue),
    /// Verbatim wire text for unregistered or undecodable properties.
    Raw(String),
}

impl Value {
    /// The wire kind of this value, or `None` for [`Value::Raw`].
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Text(_) => Some(ValueKind::Text),
            Self::Structured(_) => Some(ValueKind::Structured),
            Self::Integer(_) => Some(ValueKind::Integer),
            Self::Boolean(_) => Some(ValueKind::Boolean),
            Self::Date(_) => Some(ValueKind::Date),
            Self::DateTime(_) => Some(ValueKind::DateTime),
            Self::Uri(_) => Some(ValueKind::Uri),
            Self::Binary(_) => Some(ValueKind::Binary),
            Self::Grouped(_) => Some(ValueKind::Grouped),
            Self::Raw(_) => None,
        }
    }

    /// Returns the text payload for `Text` and `Raw` variants.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Raw(s) => Some(s),
            _ => None,
        }
    }
}

/// Wire kind a property's values decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Escaped free-form text.
    Text,
    /// Semicolon-separated fields.
    Structured,
    /// Signed integer.
    Integer,
    /// `TRUE` / `FALSE`.
    Boolean,
    /// Calendar date.
    Date,
    /// Calendar date and time.
    DateTime,
    /// URI text.
    Uri,
    /// Base64 binary.
    Binary,
    /// `itemN.`-grouped value.
    Grouped,
}

/// A calendar date, remembering whether it was written in extended form.
///
/// vCard 3.0 exports commonly use the extended `1996-04-15` form while
/// iCalendar uses the basic `19960415` form; the flag makes a serialize
/// round trip byte-faithful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDate {
    /// The civil date.
    pub date: jiff::civil::Date,
    /// Whether the source used `YYYY-MM-DD` rather than `YYYYMMDD`.
    pub extended: bool,
}

/// A calendar date-time, remembering whether it carried a `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDateTime {
    /// The civil date-time. Zone resolution is left to the caller (a
    /// `TZID` parameter, when present, stays on the content line).
    pub date_time: jiff::civil::DateTime,
    /// Whether the source was marked UTC with a trailing `Z`.
    pub utc: bool,
}

/// The payload of an `itemN.` group: a primary value plus the sibling
/// properties that shared the group prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedValue {
    /// The primary property's decoded value.
    pub value: Box<Value>,
    /// Sibling properties in source order, group prefix stripped.
    pub properties: Vec<ContentLine>,
}

impl GroupedValue {
    /// Wraps a primary value with no siblings yet.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value: Box::new(value),
            properties: Vec::new(),
        }
    }

    /// Finds a sibling property by name, case-insensitively.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ContentLine> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_every_typed_variant() {
        assert_eq!(Value::Integer(3).kind(), Some(ValueKind::Integer));
        assert_eq!(Value::Raw("x".to_string()).kind(), None);
    }

    #[test]
    fn grouped_sibling_lookup() {
        let mut grouped = GroupedValue::new(Value::Uri("https://example.com".to_string()));
        grouped.properties.push(ContentLine::new(
            "X-ABLabel",
            Value::Text("blog".to_string()),
        ));

        assert!(grouped.property("x-ablabel").is_some());
        assert!(grouped.property("X-ABDATE").is_none());
    }
}
