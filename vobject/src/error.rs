// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// Errors produced while parsing or serializing vCard/iCalendar text.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// A physical line does not match the content-line grammar.
    #[error("malformed content line {line}: {reason}")]
    MalformedLine {
        /// 1-based line number of the offending unfolded line.
        line: usize,
        /// What the scanner choked on.
        reason: String,
    },

    /// An `END` line names a component other than the one currently open.
    #[error("mismatched END:{found}, expected END:{expected}")]
    MismatchedEnd {
        /// Name of the component currently open.
        expected: String,
        /// Name the `END` line carried.
        found: String,
    },

    /// An `END` line appeared with no component open.
    #[error("END:{name} without a matching BEGIN")]
    UnexpectedEnd {
        /// Name the `END` line carried.
        name: String,
    },

    /// Input ended while a component was still open.
    #[error("unterminated component {name}")]
    UnterminatedComponent {
        /// Name of the component left open.
        name: String,
    },

    /// A property appeared outside any `BEGIN`/`END` block.
    #[error("property {name} outside any component (line {line})")]
    PropertyOutsideComponent {
        /// Name of the orphaned property.
        name: String,
        /// 1-based line number.
        line: usize,
    },

    /// A value could not be encoded or decoded for the wire.
    #[error("invalid {name} value: {reason}")]
    InvalidValue {
        /// Wire name of the owning property.
        name: String,
        /// What made the value invalid.
        reason: String,
    },
}
