// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Parsers for WebDAV `207 Multi-Status` responses.

use quick_xml::events::Event;
use reqwest::StatusCode;

use crate::error::DavError;
use crate::types::{ETag, Href, SyncToken};

/// A parsed `multistatus` document.
#[derive(Debug, Clone, Default)]
pub struct MultiStatus {
    /// Per-resource responses.
    pub responses: Vec<DavResponse>,
    /// New collection sync token (`sync-collection` reports only).
    pub sync_token: Option<SyncToken>,
}

/// One `<D:response>` element.
#[derive(Debug, Clone)]
pub struct DavResponse {
    /// The resource this response describes.
    pub href: Href,
    /// Property results grouped by status.
    pub prop_stats: Vec<PropStat>,
    /// Resource-level status (`sync-collection` deletions carry one).
    pub status: Option<StatusLine>,
    /// Precondition/postcondition code from a `<D:error>` child.
    pub error: Option<String>,
}

/// One `<D:propstat>` element.
#[derive(Debug, Clone)]
pub struct PropStat {
    /// The property values reported under this status.
    pub prop: PropValues,
    /// The status these properties were returned with.
    pub status: StatusLine,
}

/// Property values a response can carry.
#[derive(Debug, Clone, Default)]
pub struct PropValues {
    /// `displayname`.
    pub display_name: Option<String>,
    /// `resourcetype` contained `<D:collection/>`.
    pub is_collection: bool,
    /// `resourcetype` contained `<C:calendar/>`.
    pub is_calendar: bool,
    /// `resourcetype` contained `<A:addressbook/>`.
    pub is_addressbook: bool,
    /// `getetag`.
    pub etag: Option<ETag>,
    /// `getctag` (calendarserver extension).
    pub ctag: Option<String>,
    /// Inline iCalendar payload.
    pub calendar_data: Option<String>,
    /// Inline vCard payload.
    pub address_data: Option<String>,
    /// `calendar-home-set` href.
    pub calendar_home_set: Option<Href>,
    /// `addressbook-home-set` href.
    pub addressbook_home_set: Option<Href>,
    /// Supported calendar components (`VEVENT`, `VTODO`, ...).
    pub supported_components: Vec<String>,
    /// `current-user-principal` href.
    pub current_user_principal: Option<Href>,
    /// Per-resource `sync-token`.
    pub sync_token: Option<SyncToken>,
    /// `calendar-description`.
    pub calendar_description: Option<String>,
}

/// A parsed status line like `HTTP/1.1 200 OK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine(pub StatusCode);

impl StatusLine {
    /// Parses the middle token of the status line.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::InvalidResponse`] for anything that is not
    /// `HTTP/<v> <code> <reason>`.
    pub fn parse(line: &str) -> Result<Self, DavError> {
        let code = line
            .split_whitespace()
            .nth(1)
            .and_then(|token| token.parse::<u16>().ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| DavError::InvalidResponse(format!("bad status line: {line:?}")))?;
        Ok(Self(code))
    }

    /// Whether this status is 2xx.
    #[must_use]
    pub fn is_success(self) -> bool {
        self.0.is_success()
    }
}

impl MultiStatus {
    /// Parses a `207 Multi-Status` body.
    ///
    /// Elements are matched by local name, so servers may use any
    /// namespace prefixes.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails or a status line is
    /// malformed.
    #[expect(clippy::too_many_lines)]
    pub fn from_xml(xml: &str) -> Result<Self, DavError> {
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        reader.config_mut().check_end_names = true;

        let mut multistatus = Self::default();
        let mut current_response: Option<DavResponse> = None;
        let mut current_prop = PropValues::default();
        let mut in_response = false;
        let mut in_propstat = false;
        let mut in_prop = false;

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::End(ref e) if e.name().local_name().into_inner() == b"multistatus" => break,
                Event::Eof => break,

                Event::Start(ref e) => match e.name().local_name().into_inner() {
                    b"response" => {
                        in_response = true;
                        current_response = Some(DavResponse {
                            href: Href::new(String::new()),
                            prop_stats: Vec::new(),
                            status: None,
                            error: None,
                        });
                    }
                    b"href" if in_response && !in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)?
                            && let Some(response) = &mut current_response
                        {
                            response.href = Href::new(text.decode()?.to_string());
                        }
                    }
                    b"propstat" if in_response => {
                        in_propstat = true;
                        current_prop = PropValues::default();
                    }
                    b"prop" => in_prop = true,

                    b"displayname" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_prop.display_name = Some(text.decode()?.to_string());
                        }
                    }
                    b"resourcetype" if in_prop => {
                        read_resource_type(&mut reader, &mut buf, &mut current_prop)?;
                    }
                    b"getetag" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_prop.etag = Some(ETag::new(text.decode()?.to_string()));
                        }
                    }
                    b"getctag" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_prop.ctag = Some(text.decode()?.to_string());
                        }
                    }
                    b"calendar-data" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_prop.calendar_data = Some(text.decode()?.to_string());
                        }
                    }
                    b"address-data" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_prop.address_data = Some(text.decode()?.to_string());
                        }
                    }
                    b"calendar-home-set" if in_prop => {
                        current_prop.calendar_home_set =
                            read_nested_href(&mut reader, &mut buf, b"calendar-home-set")?;
                    }
                    b"addressbook-home-set" if in_prop => {
                        current_prop.addressbook_home_set =
                            read_nested_href(&mut reader, &mut buf, b"addressbook-home-set")?;
                    }
                    b"current-user-principal" if in_prop => {
                        current_prop.current_user_principal =
                            read_nested_href(&mut reader, &mut buf, b"current-user-principal")?;
                    }
                    b"supported-calendar-component-set" if in_prop => {
                        read_supported_components(&mut reader, &mut buf, &mut current_prop)?;
                    }
                    b"calendar-description" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_prop.calendar_description = Some(text.decode()?.to_string());
                        }
                    }
                    b"sync-token" if in_prop => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            current_prop.sync_token =
                                Some(SyncToken::new(text.decode()?.to_string()));
                        }
                    }
                    b"sync-token" => {
                        // Document-level token from a sync-collection report.
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            multistatus.sync_token =
                                Some(SyncToken::new(text.decode()?.to_string()));
                        }
                    }
                    b"error" if in_response && !in_prop => {
                        if let Some(response) = &mut current_response {
                            response.error = read_error_condition(&mut reader, &mut buf)?;
                        }
                    }
                    b"status" => {
                        if let Event::Text(text) = reader.read_event_into(&mut buf)? {
                            let status = StatusLine::parse(&text.decode()?)?;
                            if in_propstat {
                                if let Some(response) = &mut current_response {
                                    response.prop_stats.push(PropStat {
                                        prop: std::mem::take(&mut current_prop),
                                        status,
                                    });
                                }
                            } else if in_response
                                && let Some(response) = &mut current_response
                            {
                                response.status = Some(status);
                            }
                        }
                    }
                    _ => {}
                },

                Event::End(ref e) => match e.name().local_name().into_inner() {
                    b"response" if in_response => {
                        in_response = false;
                        if let Some(response) = current_response.take() {
                            multistatus.responses.push(response);
                        }
                    }
                    b"propstat" => in_propstat = false,
                    b"prop" => in_prop = false,
                    _ => {}
                },
                _ => {}
            }
            buf.clear();
        }

        Ok(multistatus)
    }

    /// Iterates over responses whose first successful propstat carries
    /// the given predicate's data.
    pub fn successes(&self) -> impl Iterator<Item = (&DavResponse, &PropValues)> {
        self.responses.iter().filter_map(|response| {
            response
                .prop_stats
                .iter()
                .find(|ps| ps.status.is_success())
                .map(|ps| (response, &ps.prop))
        })
    }
}

fn read_resource_type(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
    prop: &mut PropValues,
) -> Result<(), DavError> {
    loop {
        match reader.read_event_into(buf)? {
            Event::End(ref e) if e.name().local_name().into_inner() == b"resourcetype" => break,
            Event::Start(ref e) | Event::Empty(ref e) => {
                match e.name().local_name().into_inner() {
                    b"collection" => prop.is_collection = true,
                    b"calendar" => prop.is_calendar = true,
                    b"addressbook" => prop.is_addressbook = true,
                    _ => {}
                }
            }
            Event::Eof => return Err(DavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }
    Ok(())
}

fn read_nested_href(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
    end: &[u8],
) -> Result<Option<Href>, DavError> {
    let mut href = None;
    loop {
        match reader.read_event_into(buf)? {
            Event::End(ref e) if e.name().local_name().into_inner() == end => break,
            Event::Start(ref e) if e.name().local_name().into_inner() == b"href" => {
                if let Event::Text(text) = reader.read_event_into(buf)? {
                    href = Some(Href::new(text.decode()?.to_string()));
                }
            }
            Event::Eof => return Err(DavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }
    Ok(href)
}

/// Reads a `<D:error>` body. The condition is the local name of the
/// first child element (`no-uid-conflict`, `lock-token-submitted`, ...),
/// or bare text when the server sends one.
fn read_error_condition(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
) -> Result<Option<String>, DavError> {
    let mut condition = None;
    loop {
        match reader.read_event_into(buf)? {
            Event::End(ref e) if e.name().local_name().into_inner() == b"error" => break,
            Event::Start(ref e) | Event::Empty(ref e) => {
                if condition.is_none() {
                    let name = std::str::from_utf8(e.name().local_name().into_inner())
                        .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?
                        .to_string();
                    condition = Some(name);
                }
            }
            Event::Text(text) => {
                if condition.is_none() {
                    let text = text.decode()?.trim().to_string();
                    if !text.is_empty() {
                        condition = Some(text);
                    }
                }
            }
            Event::Eof => return Err(DavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }
    Ok(condition)
}

fn read_supported_components(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
    prop: &mut PropValues,
) -> Result<(), DavError> {
    loop {
        match reader.read_event_into(buf)? {
            Event::End(ref e)
                if e.name().local_name().into_inner() == b"supported-calendar-component-set" =>
            {
                break;
            }
            Event::Start(ref e) | Event::Empty(ref e)
                if e.name().local_name().into_inner() == b"comp" =>
            {
                if let Ok(Some(name_attr)) = e.try_get_attribute("name") {
                    let name = std::str::from_utf8(&name_attr.value)
                        .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?
                        .to_string();
                    prop.supported_components.push(name);
                }
            }
            Event::Eof => return Err(DavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }
    Ok(())
}
