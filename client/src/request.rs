// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::DavError;
use crate::method::DavMethod;
use crate::template::UriTemplate;

/// A fully resolved request, ready for the pipeline.
///
/// Requests are plain data so the pipeline can clone one per attempt
/// and rewrite it across redirects.
#[derive(Debug, Clone)]
pub struct DavRequest {
    /// Resolved HTTP method.
    pub method: reqwest::Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Optional request body.
    pub body: Option<String>,
}

/// Builds a [`DavRequest`] from a method, a URI template and headers.
#[derive(Debug)]
pub struct RequestBuilder {
    base_url: Url,
    method: DavMethod,
    template: UriTemplate,
    headers: HeaderMap,
    body: Option<String>,
}

impl RequestBuilder {
    /// Starts a request against a base URL.
    #[must_use]
    pub fn new(base_url: Url, method: DavMethod, template: UriTemplate) -> Self {
        Self {
            base_url,
            method,
            template,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Adds a header.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Config`] when the name or value is not a
    /// legal HTTP header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, DavError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DavError::Config(format!("invalid header name: {e}")))?;
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Expands the template and resolves it against the base URL.
    ///
    /// # Errors
    ///
    /// Returns template expansion errors, or [`DavError::Config`] when
    /// the expanded path does not resolve to a valid URL.
    pub fn build(self) -> Result<DavRequest, DavError> {
        let path = self.template.expand()?;
        let url = self
            .base_url
            .join(&path)
            .map_err(|e| DavError::Config(format!("cannot resolve {path:?}: {e}")))?;
        Ok(DavRequest {
            method: self.method.into(),
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://dav.example.com/").unwrap()
    }

    #[test]
    fn builds_an_expanded_url() {
        let request = RequestBuilder::new(
            base(),
            DavMethod::Get,
            UriTemplate::new("/calendars/{calendarId}/{eventId}.ics")
                .add_path("calendarId", "work")
                .add_path("eventId", "standup"),
        )
        .build()
        .unwrap();

        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(
            request.url.as_str(),
            "https://dav.example.com/calendars/work/standup.ics"
        );
    }

    #[test]
    fn carries_headers_and_body() {
        let request = RequestBuilder::new(
            base(),
            DavMethod::PropFind,
            UriTemplate::new("/calendars/"),
        )
        .header("Depth", "1")
        .unwrap()
        .body("<propfind/>")
        .build()
        .unwrap();

        assert_eq!(request.headers.get("Depth").unwrap(), "1");
        assert_eq!(request.body.as_deref(), Some("<propfind/>"));
    }

    #[test]
    fn rejects_bad_header_values() {
        let result = RequestBuilder::new(base(), DavMethod::Get, UriTemplate::new("/"))
            .header("X-Test", "line\nbreak");
        assert!(matches!(result, Err(DavError::Config(_))));
    }
}
