// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

use crate::types::{ETag, Href};

/// WebDAV client errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    /// A URI template value expression had no bound variable.
    #[error("template {template:?} is missing path parameter {name:?}")]
    MissingPathParameter {
        /// The template being expanded.
        template: String,
        /// The unbound variable name.
        name: String,
    },

    /// The HTTP method is not in the WebDAV allow-list.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Transport-level failure after the retry budget ran out.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// XML parsing/writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Protocol {
        /// HTTP status code.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The server rejected a conditional write (412). Never retried:
    /// the caller must re-read the resource and decide.
    #[error("precondition failed (stale ETag or resource exists)")]
    PreconditionFailed {
        /// The `ETag` the request carried, when known.
        etag: Option<ETag>,
    },

    /// Authentication failed and could not be recovered.
    #[error("authentication failed")]
    Auth,

    /// No credential is stored for the account.
    #[error("not signed in: {0}")]
    NotSignedIn(String),

    /// The response could not be interpreted.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    /// Resource not found.
    #[error("resource not found: {0}")]
    NotFound(Href),

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// vCard/iCalendar payload error.
    #[error("payload error: {0}")]
    Codec(#[from] vdav_vobject::ParseError),
}

impl From<quick_xml::Error> for DavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for DavError {
    fn from(e: quick_xml::encoding::EncodingError) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for DavError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(format!("IO error: {e}"))
    }
}

impl From<reqwest::header::InvalidHeaderValue> for DavError {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        Self::Config(format!("invalid header value: {e}"))
    }
}
