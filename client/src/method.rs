// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr as _;

use crate::error::DavError;

/// HTTP methods this client is allowed to send.
///
/// Everything else is rejected up front so a typo'd or injected method
/// name never reaches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum DavMethod {
    /// Fetch a resource body.
    Get,
    /// Create or replace a resource body.
    Put,
    /// Remove a resource.
    Delete,
    /// Read properties (`PROPFIND`).
    PropFind,
    /// Write properties (`PROPPATCH`).
    PropPatch,
    /// Run a `REPORT` query.
    Report,
    /// Create a calendar collection (`MKCALENDAR`).
    MkCalendar,
}

impl DavMethod {
    /// Parses a method name against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::UnsupportedMethod`] for any name outside the
    /// allow-list.
    pub fn parse(name: &str) -> Result<Self, DavError> {
        Self::from_str(name).map_err(|_| DavError::UnsupportedMethod(name.to_string()))
    }
}

impl From<DavMethod> for reqwest::Method {
    fn from(method: DavMethod) -> Self {
        match method {
            DavMethod::Get => Self::GET,
            DavMethod::Put => Self::PUT,
            DavMethod::Delete => Self::DELETE,
            DavMethod::PropFind | DavMethod::PropPatch | DavMethod::Report
            | DavMethod::MkCalendar => {
                // The extension methods are plain tokens; from_bytes only
                // fails on non-token bytes, which UPPERCASE names never are.
                Self::from_bytes(method.to_string().as_bytes()).unwrap_or(Self::GET)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(DavMethod::parse("propfind").unwrap(), DavMethod::PropFind);
        assert_eq!(DavMethod::parse("REPORT").unwrap(), DavMethod::Report);
    }

    #[test]
    fn unknown_methods_are_rejected() {
        assert!(matches!(
            DavMethod::parse("TRACE"),
            Err(DavError::UnsupportedMethod(name)) if name == "TRACE"
        ));
    }

    #[test]
    fn wire_names_are_uppercase() {
        assert_eq!(DavMethod::MkCalendar.to_string(), "MKCALENDAR");
        assert_eq!(reqwest::Method::from(DavMethod::PropFind).as_str(), "PROPFIND");
    }
}
