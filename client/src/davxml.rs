// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request body builders for WebDAV methods and reports.

use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::DavError;
use crate::filter::{CompFilter, Limit, PropFilter};
use crate::types::SyncToken;
use crate::xml::{BodyWriter, body_writer, finish, ns, write_empty, write_text_element};

/// Properties a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// `ETag`.
    GetETag,
    /// Collection tag (calendarserver extension).
    GetCTag,
    /// Inline iCalendar data.
    CalendarData,
    /// Inline vCard data.
    AddressData,
    /// Calendar home set.
    CalendarHomeSet,
    /// Addressbook home set.
    AddressbookHomeSet,
    /// Supported calendar components.
    SupportedCalendarComponents,
    /// Current user principal.
    CurrentUserPrincipal,
    /// Collection sync token (RFC 6578).
    SyncToken,
    /// Calendar description.
    CalendarDescription,
}

/// The namespace a property element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Dav,
    CalDav,
    CardDav,
    CalendarServer,
}

impl Ns {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Dav => "D",
            Self::CalDav => "C",
            Self::CardDav => "A",
            Self::CalendarServer => "CS",
        }
    }

    const fn uri(self) -> &'static str {
        match self {
            Self::Dav => ns::DAV,
            Self::CalDav => ns::CALDAV,
            Self::CardDav => ns::CARDDAV,
            Self::CalendarServer => ns::CALENDARSERVER,
        }
    }
}

impl Prop {
    const fn name(self) -> &'static str {
        match self {
            Self::DisplayName => "displayname",
            Self::ResourceType => "resourcetype",
            Self::GetETag => "getetag",
            Self::GetCTag => "getctag",
            Self::CalendarData => "calendar-data",
            Self::AddressData => "address-data",
            Self::CalendarHomeSet => "calendar-home-set",
            Self::AddressbookHomeSet => "addressbook-home-set",
            Self::SupportedCalendarComponents => "supported-calendar-component-set",
            Self::CurrentUserPrincipal => "current-user-principal",
            Self::SyncToken => "sync-token",
            Self::CalendarDescription => "calendar-description",
        }
    }

    const fn namespace(self) -> Ns {
        match self {
            Self::DisplayName
            | Self::ResourceType
            | Self::GetETag
            | Self::CurrentUserPrincipal
            | Self::SyncToken => Ns::Dav,
            Self::GetCTag => Ns::CalendarServer,
            Self::CalendarData
            | Self::CalendarHomeSet
            | Self::SupportedCalendarComponents
            | Self::CalendarDescription => Ns::CalDav,
            Self::AddressData | Self::AddressbookHomeSet => Ns::CardDav,
        }
    }

    fn qualified(self) -> String {
        format!("{}:{}", self.namespace().prefix(), self.name())
    }
}

/// Declares `xmlns:D` plus whatever the props need on a root element.
fn declare_namespaces(root: &mut BytesStart, props: &[Prop], extra: &[Ns]) {
    root.push_attribute(("xmlns:D", ns::DAV));
    for namespace in [Ns::CalDav, Ns::CardDav, Ns::CalendarServer] {
        if extra.contains(&namespace) || props.iter().any(|p| p.namespace() == namespace) {
            let attr = format!("xmlns:{}", namespace.prefix());
            root.push_attribute((attr.as_str(), namespace.uri()));
        }
    }
}

fn write_prop_section(writer: &mut BodyWriter, props: &[Prop]) -> Result<(), DavError> {
    // <D:prop>
    writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
    for prop in props {
        write_empty(writer, &prop.qualified())?;
    }
    writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
    Ok(())
}

/// `PROPFIND` request body builder.
#[derive(Debug, Default)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

impl PropFindRequest {
    /// Creates a new `PROPFIND` request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property to the request.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        self.props.push(prop);
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = body_writer();

        // <D:propfind xmlns:D="DAV:" ...>
        let mut propfind = BytesStart::new("D:propfind");
        declare_namespaces(&mut propfind, &self.props, &[]);
        writer.write_event(Event::Start(propfind))?;

        write_prop_section(&mut writer, &self.props)?;

        // </D:propfind>
        writer.write_event(Event::End(BytesEnd::new("D:propfind")))?;
        finish(writer)
    }
}

/// `calendar-query` report body builder.
#[derive(Debug)]
pub struct CalendarQueryRequest {
    props: Vec<Prop>,
    filter: CompFilter,
    limit: Option<Limit>,
}

impl CalendarQueryRequest {
    /// A query rooted at `VCALENDAR` with the given inner filter.
    #[must_use]
    pub fn new(filter: CompFilter) -> Self {
        Self {
            props: vec![Prop::GetETag, Prop::CalendarData],
            filter,
            limit: None,
        }
    }

    /// Replaces the requested properties.
    #[must_use]
    pub fn props(mut self, props: Vec<Prop>) -> Self {
        self.props = props;
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub const fn limit(mut self, nresults: u32) -> Self {
        self.limit = Some(Limit { nresults });
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = body_writer();

        // <C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
        let mut query = BytesStart::new("C:calendar-query");
        declare_namespaces(&mut query, &self.props, &[Ns::CalDav]);
        writer.write_event(Event::Start(query))?;

        write_prop_section(&mut writer, &self.props)?;

        // <C:filter>
        writer.write_event(Event::Start(BytesStart::new("C:filter")))?;
        self.filter.write(&mut writer, "C")?;
        writer.write_event(Event::End(BytesEnd::new("C:filter")))?;

        if let Some(limit) = &self.limit {
            limit.write(&mut writer, "C")?;
        }

        // </C:calendar-query>
        writer.write_event(Event::End(BytesEnd::new("C:calendar-query")))?;
        finish(writer)
    }
}

/// `addressbook-query` report body builder.
#[derive(Debug, Default)]
pub struct AddressbookQueryRequest {
    props: Vec<Prop>,
    prop_filters: Vec<PropFilter>,
    limit: Option<Limit>,
}

impl AddressbookQueryRequest {
    /// A query returning etags and vCard data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            props: vec![Prop::GetETag, Prop::AddressData],
            prop_filters: Vec::new(),
            limit: None,
        }
    }

    /// Adds a property filter. All filters must match.
    #[must_use]
    pub fn filter(mut self, filter: PropFilter) -> Self {
        self.prop_filters.push(filter);
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub const fn limit(mut self, nresults: u32) -> Self {
        self.limit = Some(Limit { nresults });
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = body_writer();

        // <A:addressbook-query xmlns:D="DAV:" xmlns:A="urn:ietf:params:xml:ns:carddav">
        let mut query = BytesStart::new("A:addressbook-query");
        declare_namespaces(&mut query, &self.props, &[Ns::CardDav]);
        writer.write_event(Event::Start(query))?;

        write_prop_section(&mut writer, &self.props)?;

        // <A:filter test="allof">
        let mut filter = BytesStart::new("A:filter");
        filter.push_attribute(("test", "allof"));
        writer.write_event(Event::Start(filter))?;
        for prop_filter in &self.prop_filters {
            prop_filter.write(&mut writer, "A")?;
        }
        writer.write_event(Event::End(BytesEnd::new("A:filter")))?;

        if let Some(limit) = &self.limit {
            limit.write(&mut writer, "A")?;
        }

        // </A:addressbook-query>
        writer.write_event(Event::End(BytesEnd::new("A:addressbook-query")))?;
        finish(writer)
    }
}

/// `calendar-multiget` / `addressbook-multiget` report body builder.
#[derive(Debug)]
pub struct MultiGetRequest {
    root: &'static str,
    data_prop: Prop,
    hrefs: Vec<String>,
}

impl MultiGetRequest {
    /// A multiget for iCalendar resources.
    #[must_use]
    pub fn calendar() -> Self {
        Self {
            root: "C:calendar-multiget",
            data_prop: Prop::CalendarData,
            hrefs: Vec::new(),
        }
    }

    /// A multiget for vCard resources.
    #[must_use]
    pub fn addressbook() -> Self {
        Self {
            root: "A:addressbook-multiget",
            data_prop: Prop::AddressData,
            hrefs: Vec::new(),
        }
    }

    /// Adds a resource href to fetch.
    pub fn add_href(&mut self, href: impl Into<String>) -> &mut Self {
        self.hrefs.push(href.into());
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = body_writer();

        let props = [Prop::GetETag, self.data_prop];
        let mut multiget = BytesStart::new(self.root);
        declare_namespaces(&mut multiget, &props, &[]);
        writer.write_event(Event::Start(multiget))?;

        write_prop_section(&mut writer, &props)?;

        // <D:href> for each resource
        for href in &self.hrefs {
            write_text_element(&mut writer, "D:href", href)?;
        }

        writer.write_event(Event::End(BytesEnd::new(self.root)))?;
        finish(writer)
    }
}

/// `sync-collection` report body builder (RFC 6578).
#[derive(Debug)]
pub struct SyncCollectionRequest {
    sync_token: Option<SyncToken>,
    props: Vec<Prop>,
}

impl SyncCollectionRequest {
    /// A sync request. `None` for the token requests the initial sync.
    #[must_use]
    pub fn new(sync_token: Option<SyncToken>) -> Self {
        Self {
            sync_token,
            props: vec![Prop::GetETag],
        }
    }

    /// Replaces the requested properties.
    #[must_use]
    pub fn props(mut self, props: Vec<Prop>) -> Self {
        self.props = props;
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = body_writer();

        // <D:sync-collection xmlns:D="DAV:" ...>
        let mut sync = BytesStart::new("D:sync-collection");
        declare_namespaces(&mut sync, &self.props, &[]);
        writer.write_event(Event::Start(sync))?;

        // <D:sync-token> is empty on the initial sync
        match &self.sync_token {
            Some(token) => write_text_element(&mut writer, "D:sync-token", token.as_str())?,
            None => write_empty(&mut writer, "D:sync-token")?,
        }
        write_text_element(&mut writer, "D:sync-level", "1")?;

        write_prop_section(&mut writer, &self.props)?;

        // </D:sync-collection>
        writer.write_event(Event::End(BytesEnd::new("D:sync-collection")))?;
        finish(writer)
    }
}

/// `PROPPATCH` request body builder.
#[derive(Debug, Default)]
pub struct PropertyUpdate {
    set: Vec<(Prop, String)>,
    remove: Vec<Prop>,
}

impl PropertyUpdate {
    /// An empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property to a text value.
    pub fn set(&mut self, prop: Prop, value: impl Into<String>) -> &mut Self {
        self.set.push((prop, value.into()));
        self
    }

    /// Removes a property.
    pub fn remove(&mut self, prop: Prop) -> &mut Self {
        self.remove.push(prop);
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = body_writer();

        let all: Vec<Prop> = self
            .set
            .iter()
            .map(|(p, _)| *p)
            .chain(self.remove.iter().copied())
            .collect();

        // <D:propertyupdate xmlns:D="DAV:" ...>
        let mut update = BytesStart::new("D:propertyupdate");
        declare_namespaces(&mut update, &all, &[]);
        writer.write_event(Event::Start(update))?;

        if !self.set.is_empty() {
            // <D:set><D:prop>...</D:prop></D:set>
            writer.write_event(Event::Start(BytesStart::new("D:set")))?;
            writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
            for (prop, value) in &self.set {
                write_text_element(&mut writer, &prop.qualified(), value)?;
            }
            writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
            writer.write_event(Event::End(BytesEnd::new("D:set")))?;
        }

        if !self.remove.is_empty() {
            // <D:remove><D:prop>...</D:prop></D:remove>
            writer.write_event(Event::Start(BytesStart::new("D:remove")))?;
            writer.write_event(Event::Start(BytesStart::new("D:prop")))?;
            for prop in &self.remove {
                write_empty(&mut writer, &prop.qualified())?;
            }
            writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
            writer.write_event(Event::End(BytesEnd::new("D:remove")))?;
        }

        // </D:propertyupdate>
        writer.write_event(Event::End(BytesEnd::new("D:propertyupdate")))?;
        finish(writer)
    }
}

/// `MKCALENDAR` request body builder.
#[derive(Debug, Default)]
pub struct MkCalendarRequest {
    display_name: Option<String>,
    description: Option<String>,
    components: Vec<String>,
}

impl MkCalendarRequest {
    /// An empty request: the server picks all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the calendar description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restricts the component types the calendar stores.
    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.components.push(component.into());
        self
    }

    /// Builds the XML body.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut writer = body_writer();

        // <C:mkcalendar xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
        let mut mkcalendar = BytesStart::new("C:mkcalendar");
        declare_namespaces(&mut mkcalendar, &[], &[Ns::CalDav]);
        writer.write_event(Event::Start(mkcalendar))?;

        writer.write_event(Event::Start(BytesStart::new("D:set")))?;
        writer.write_event(Event::Start(BytesStart::new("D:prop")))?;

        if let Some(name) = &self.display_name {
            write_text_element(&mut writer, "D:displayname", name)?;
        }
        if let Some(description) = &self.description {
            write_text_element(&mut writer, "C:calendar-description", description)?;
        }
        if !self.components.is_empty() {
            // <C:supported-calendar-component-set>
            writer.write_event(Event::Start(BytesStart::new(
                "C:supported-calendar-component-set",
            )))?;
            for component in &self.components {
                let mut comp = BytesStart::new("C:comp");
                comp.push_attribute(("name", component.as_str()));
                writer.write_event(Event::Empty(comp))?;
            }
            writer.write_event(Event::End(BytesEnd::new(
                "C:supported-calendar-component-set",
            )))?;
        }

        writer.write_event(Event::End(BytesEnd::new("D:prop")))?;
        writer.write_event(Event::End(BytesEnd::new("D:set")))?;

        // </C:mkcalendar>
        writer.write_event(Event::End(BytesEnd::new("C:mkcalendar")))?;
        finish(writer)
    }
}
