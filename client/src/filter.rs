// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Filter trees for `calendar-query` and `addressbook-query` reports.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::DavError;
use crate::xml::BodyWriter;

/// A component filter node, e.g. `VCALENDAR > VEVENT > time-range`.
#[derive(Debug, Clone)]
pub struct CompFilter {
    /// Component name (`VCALENDAR`, `VEVENT`, `VTODO`, ...).
    pub name: String,
    /// Nested filters, in document order.
    pub filters: Vec<Filter>,
}

/// One node inside a component filter.
#[derive(Debug, Clone)]
pub enum Filter {
    /// A nested component filter.
    Comp(CompFilter),
    /// A property filter.
    Prop(PropFilter),
    /// A time-range restriction.
    Time(TimeRange),
}

/// Restricts matches by a property's presence or text.
#[derive(Debug, Clone)]
pub struct PropFilter {
    /// Property name, e.g. `UID` or `FN`.
    pub name: String,
    /// Match resources where the property is absent.
    pub is_not_defined: bool,
    /// Text matches, all of which must hold.
    pub text_matches: Vec<TextMatch>,
}

/// Substring match against a property value.
#[derive(Debug, Clone)]
pub struct TextMatch {
    /// Collation, e.g. `i;unicode-casemap`. Server default when `None`.
    pub collation: Option<String>,
    /// Match type (`contains`, `equals`, ...). Server default when `None`.
    pub match_type: Option<String>,
    /// Invert the match.
    pub negate: bool,
    /// Text to match.
    pub text: String,
}

/// A UTC time window. An open end means "from `start` on".
#[derive(Debug, Clone)]
pub struct TimeRange {
    /// Window start, `YYYYMMDDTHHMMSSZ`.
    pub start: String,
    /// Window end, exclusive.
    pub end: Option<String>,
}

/// Caps the number of results a query report returns.
#[derive(Debug, Clone, Copy)]
pub struct Limit {
    /// Maximum number of responses.
    pub nresults: u32,
}

impl CompFilter {
    /// A component filter with no nested filters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
        }
    }

    /// Nests a filter under this component.
    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Writes `<C:comp-filter>` (or the given prefix) and its children.
    ///
    /// # Errors
    ///
    /// Returns an error if XML writing fails.
    pub fn write(&self, writer: &mut BodyWriter, prefix: &str) -> Result<(), DavError> {
        let tag = format!("{prefix}:comp-filter");
        let mut start = BytesStart::new(tag.as_str());
        start.push_attribute(("name", self.name.as_str()));

        if self.filters.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for filter in &self.filters {
            match filter {
                Filter::Comp(comp) => comp.write(writer, prefix)?,
                Filter::Prop(prop) => prop.write(writer, prefix)?,
                Filter::Time(time) => time.write(writer, prefix)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(())
    }
}

impl PropFilter {
    /// A property filter with no text matches.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_not_defined: false,
            text_matches: Vec::new(),
        }
    }

    /// Writes `<C:prop-filter>` and its children.
    ///
    /// # Errors
    ///
    /// Returns an error if XML writing fails.
    pub fn write(&self, writer: &mut BodyWriter, prefix: &str) -> Result<(), DavError> {
        let tag = format!("{prefix}:prop-filter");
        let mut start = BytesStart::new(tag.as_str());
        start.push_attribute(("name", self.name.as_str()));
        writer.write_event(Event::Start(start))?;

        if self.is_not_defined {
            let not_defined = format!("{prefix}:is-not-defined");
            writer.write_event(Event::Empty(BytesStart::new(not_defined.as_str())))?;
        }
        for text_match in &self.text_matches {
            text_match.write(writer, prefix)?;
        }

        writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(())
    }
}

impl TextMatch {
    /// A plain `contains`-style match with server-default collation.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            collation: None,
            match_type: None,
            negate: false,
            text: text.into(),
        }
    }

    /// Writes `<C:text-match>`.
    ///
    /// # Errors
    ///
    /// Returns an error if XML writing fails.
    pub fn write(&self, writer: &mut BodyWriter, prefix: &str) -> Result<(), DavError> {
        let tag = format!("{prefix}:text-match");
        let mut start = BytesStart::new(tag.as_str());
        if let Some(collation) = &self.collation {
            start.push_attribute(("collation", collation.as_str()));
        }
        if let Some(match_type) = &self.match_type {
            start.push_attribute(("match-type", match_type.as_str()));
        }
        if self.negate {
            start.push_attribute(("negate-condition", "yes"));
        }
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(&self.text)))?;
        writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(())
    }
}

impl TimeRange {
    /// Writes `<C:time-range start="..." [end="..."]/>`.
    ///
    /// # Errors
    ///
    /// Returns an error if XML writing fails.
    pub fn write(&self, writer: &mut BodyWriter, prefix: &str) -> Result<(), DavError> {
        let tag = format!("{prefix}:time-range");
        let mut start = BytesStart::new(tag.as_str());
        start.push_attribute(("start", self.start.as_str()));
        if let Some(end) = &self.end {
            start.push_attribute(("end", end.as_str()));
        }
        writer.write_event(Event::Empty(start))?;
        Ok(())
    }
}

impl Limit {
    /// Writes `<C:limit><C:nresults>N</C:nresults></C:limit>`.
    ///
    /// # Errors
    ///
    /// Returns an error if XML writing fails.
    pub fn write(&self, writer: &mut BodyWriter, prefix: &str) -> Result<(), DavError> {
        let limit = format!("{prefix}:limit");
        let nresults = format!("{prefix}:nresults");
        writer.write_event(Event::Start(BytesStart::new(limit.as_str())))?;
        writer.write_event(Event::Start(BytesStart::new(nresults.as_str())))?;
        writer.write_event(Event::Text(BytesText::new(&self.nresults.to_string())))?;
        writer.write_event(Event::End(BytesEnd::new(nresults.as_str())))?;
        writer.write_event(Event::End(BytesEnd::new(limit.as_str())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{body_writer, finish};

    #[test]
    fn nested_comp_filter_with_time_range() {
        let filter = CompFilter::new("VCALENDAR").with(Filter::Comp(
            CompFilter::new("VEVENT").with(Filter::Time(TimeRange {
                start: "20240301T000000Z".to_string(),
                end: Some("20240401T000000Z".to_string()),
            })),
        ));

        let mut writer = body_writer();
        filter.write(&mut writer, "C").unwrap();
        let xml = finish(writer).unwrap();

        assert!(xml.contains("<C:comp-filter name=\"VCALENDAR\">"));
        assert!(xml.contains("<C:comp-filter name=\"VEVENT\">"));
        assert!(xml.contains("start=\"20240301T000000Z\""));
        assert!(xml.contains("end=\"20240401T000000Z\""));
    }

    #[test]
    fn prop_filter_with_negated_text_match() {
        let mut prop = PropFilter::new("FN");
        prop.text_matches.push(TextMatch {
            collation: Some("i;unicode-casemap".to_string()),
            match_type: Some("contains".to_string()),
            negate: true,
            text: "lovelace".to_string(),
        });

        let mut writer = body_writer();
        prop.write(&mut writer, "C").unwrap();
        let xml = finish(writer).unwrap();

        assert!(xml.contains("<C:prop-filter name=\"FN\">"));
        assert!(xml.contains("collation=\"i;unicode-casemap\""));
        assert!(xml.contains("negate-condition=\"yes\""));
        assert!(xml.contains(">lovelace<"));
    }

    #[test]
    fn is_not_defined_is_an_empty_element() {
        let mut prop = PropFilter::new("X-PRIVATE");
        prop.is_not_defined = true;

        let mut writer = body_writer();
        prop.write(&mut writer, "C").unwrap();
        let xml = finish(writer).unwrap();

        assert!(xml.contains("<C:is-not-defined/>"));
    }
}
