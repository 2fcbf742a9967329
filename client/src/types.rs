// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

/// Resource href (path) on a WebDAV server.
///
/// A `Href` represents the path to a resource, such as
/// `/calendars/user/work/event1.ics` or `/addressbooks/user/contacts/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// Entity tag for optimistic concurrency control.
///
/// Stored with the surrounding double quotes exactly as the server sent
/// it, so it can be echoed back in `If-Match` untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETag(String);

impl ETag {
    /// Creates a new `ETag` from a string.
    #[must_use]
    pub const fn new(etag: String) -> Self {
        Self(etag)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(etag: String) -> Self {
        Self(etag)
    }
}

impl From<&str> for ETag {
    fn from(etag: &str) -> Self {
        Self(etag.to_string())
    }
}

/// Opaque collection synchronization token (RFC 6578).
///
/// Echoed back to the server verbatim on the next `sync-collection`
/// report; never inspected client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncToken(String);

impl SyncToken {
    /// Creates a new `SyncToken` from a string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SyncToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SyncToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for SyncToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// `Depth` header values accepted by `PROPFIND` and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// The resource itself.
    Zero,
    /// The resource and its immediate members.
    #[default]
    One,
}

impl Depth {
    /// The wire form of the header value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
        }
    }
}

/// Concurrency policy for `PUT` requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePolicy {
    /// Update an existing resource: `If-Match` with the known `ETag`.
    /// The server rejects the write with 412 when someone else changed
    /// the resource in the meantime.
    Update(ETag),
    /// Create only: `If-None-Match: *`. Fails with 412 when the
    /// resource already exists.
    CreateOnly,
    /// Unconditional write, last writer wins.
    Overwrite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_keeps_quotes_verbatim() {
        let etag = ETag::from("\"abc-1\"");
        assert_eq!(etag.as_str(), "\"abc-1\"");
        assert_eq!(etag.to_string(), "\"abc-1\"");
    }

    #[test]
    fn depth_wire_forms() {
        assert_eq!(Depth::Zero.as_str(), "0");
        assert_eq!(Depth::One.as_str(), "1");
    }
}
