// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! CalDAV/CardDAV client plumbing: URI templates, a retrying HTTP
//! pipeline, WebDAV report bodies and multistatus parsing.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod auth;
mod backoff;
mod client;
mod config;
mod davxml;
mod error;
mod filter;
mod method;
mod pipeline;
mod request;
mod response;
mod template;
mod types;
mod xml;

pub use crate::auth::{BasicCredential, CredentialStore};
pub use crate::backoff::BackoffHandler;
pub use crate::client::DavClient;
pub use crate::config::DavConfig;
pub use crate::davxml::{
    AddressbookQueryRequest, CalendarQueryRequest, MkCalendarRequest, MultiGetRequest, Prop,
    PropFindRequest, PropertyUpdate, SyncCollectionRequest,
};
pub use crate::error::DavError;
pub use crate::filter::{CompFilter, Filter, Limit, PropFilter, TextMatch, TimeRange};
pub use crate::method::DavMethod;
pub use crate::pipeline::{
    ErrorHandlerArgs, ExecuteInterceptor, HttpPipeline, ResponseHandler, ResponseHandlerArgs,
    TransportErrorHandler,
};
pub use crate::request::{DavRequest, RequestBuilder};
pub use crate::response::{DavResponse, MultiStatus, PropStat, PropValues, StatusLine};
pub use crate::template::UriTemplate;
pub use crate::types::{Depth, ETag, Href, SyncToken, WritePolicy};
