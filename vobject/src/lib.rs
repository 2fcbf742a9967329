// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Parse and serialize vCard/iCalendar content lines and components.

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

pub mod codec;
mod contentline;
mod deserializer;
pub mod encoding;
mod error;
mod registry;
mod serializer;
mod value;

pub use crate::codec::{ValueCodec, codec_for, encode_value};
pub use crate::contentline::{Component, ContentLine, Parameter};
pub use crate::deserializer::deserialize;
pub use crate::encoding::{Encoding, escape_text, fold, unescape_text, unfold};
pub use crate::error::ParseError;
pub use crate::registry::{KindResolver, Registry};
pub use crate::serializer::serialize;
pub use crate::value::{GroupedValue, Value, ValueDate, ValueDateTime, ValueKind};
