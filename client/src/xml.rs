// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML utilities for WebDAV/CalDAV/CardDAV processing.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::DavError;

/// XML namespaces used across WebDAV reports.
pub mod ns {
    /// `WebDAV` namespace.
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace.
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

    /// `CardDAV` namespace.
    pub const CARDDAV: &str = "urn:ietf:params:xml:ns:carddav";

    /// Apple calendarserver extensions (`getctag`).
    pub const CALENDARSERVER: &str = "http://calendarserver.org/ns/";
}

/// The writer used by all request body builders.
pub type BodyWriter = Writer<Cursor<Vec<u8>>>;

/// A 2-space-indented writer over an in-memory buffer.
#[must_use]
pub fn body_writer() -> BodyWriter {
    Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2)
}

/// Writes `<name></name>`.
///
/// # Errors
///
/// Returns an error if XML writing fails.
pub fn write_empty(writer: &mut BodyWriter, name: &str) -> Result<(), DavError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Writes `<name>text</name>`.
///
/// # Errors
///
/// Returns an error if XML writing fails.
pub fn write_text_element(writer: &mut BodyWriter, name: &str, text: &str) -> Result<(), DavError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Finishes the writer and returns the body as a string.
///
/// # Errors
///
/// Returns [`DavError::Xml`] when the buffer is not valid UTF-8.
pub fn finish(writer: BodyWriter) -> Result<String, DavError> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))
}
