// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Shared escape, fold and transfer-encoding helpers.
//!
//! These free functions are composed by the value codecs; none of them
//! carries state. Folding follows RFC 5545 Section 3.1 / RFC 6350
//! Section 3.2: lines are hard-folded at 75 octets and continuation
//! lines start with a single SPACE.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::contentline::ContentLine;

/// Maximum physical line length in octets before folding.
pub const FOLD_WIDTH: usize = 75;

/// Escapes text for a content-line value: `\` `;` `,` and newline.
#[must_use]
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {} // bare CR never survives a round trip
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_text`]. Unknown escapes keep the escaped character.
#[must_use]
pub fn unescape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

/// Hard-folds one logical line at [`FOLD_WIDTH`] octets.
///
/// Continuation lines are prefixed with a single SPACE, which counts
/// toward the width of the continuation. Folding never splits a UTF-8
/// sequence. The result carries no trailing line terminator.
#[must_use]
pub fn fold(line: &str) -> String {
    if line.len() <= FOLD_WIDTH {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + (line.len() / FOLD_WIDTH) * 3);
    let mut remaining = line;
    let mut limit = FOLD_WIDTH;
    while remaining.len() > limit {
        let mut at = limit;
        while at > 0 && !remaining.is_char_boundary(at) {
            at -= 1;
        }
        let (head, tail) = remaining.split_at(at);
        out.push_str(head);
        out.push_str("\r\n ");
        remaining = tail;
        limit = FOLD_WIDTH - 1;
    }
    out.push_str(remaining);
    out
}

/// Unfolds physical lines into logical lines.
///
/// A line beginning with SPACE or TAB continues the previous line; the
/// one prefix character is stripped. Both CRLF and bare LF terminators
/// are accepted. A trailing empty line is dropped.
#[must_use]
pub fn unfold(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in input.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            match lines.last_mut() {
                Some(previous) => previous.push_str(rest),
                None => lines.push(rest.to_string()),
            }
        } else {
            lines.push(raw.to_string());
        }
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Splits on a separator, honoring backslash escapes.
#[must_use]
pub fn split_unescaped(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(input.get(start..i).unwrap_or_default());
            start = i + c.len_utf8();
        }
    }
    parts.push(input.get(start..).unwrap_or_default());
    parts
}

/// Transfer-encoding subtype of a text value.
///
/// Selected from the owning line's `ENCODING` parameter; plain text
/// values default to [`Encoding::Escaped`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Verbatim, no escaping.
    Plain,
    /// Backslash escaping per [`escape_text`]. The default.
    #[default]
    Escaped,
    /// Base64 (`ENCODING=b` / `ENCODING=BASE64`).
    Base64,
    /// Quoted-printable (`ENCODING=QUOTED-PRINTABLE`).
    QuotedPrintable,
}

impl Encoding {
    /// Selects the encoding subtype from the owning line's parameters.
    #[must_use]
    pub fn from_parameters(line: &ContentLine) -> Self {
        match line.parameter("ENCODING").and_then(|p| p.values.first()) {
            Some(v) if v.eq_ignore_ascii_case("b") || v.eq_ignore_ascii_case("base64") => {
                Self::Base64
            }
            Some(v) if v.eq_ignore_ascii_case("quoted-printable") => Self::QuotedPrintable,
            Some(v) if v.eq_ignore_ascii_case("8bit") => Self::Plain,
            _ => Self::Escaped,
        }
    }

    /// Encodes text under this subtype.
    #[must_use]
    pub fn encode(self, input: &str) -> String {
        match self {
            Self::Plain => input.to_string(),
            Self::Escaped => escape_text(input),
            Self::Base64 => BASE64.encode(input.as_bytes()),
            Self::QuotedPrintable => quoted_printable_encode(input),
        }
    }

    /// Decodes text under this subtype. Returns `None` when the input is
    /// not valid for the subtype (bad base64, non-UTF-8 payload).
    #[must_use]
    pub fn decode(self, input: &str) -> Option<String> {
        match self {
            Self::Plain => Some(input.to_string()),
            Self::Escaped => Some(unescape_text(input)),
            Self::Base64 => {
                let bytes = BASE64.decode(input.trim()).ok()?;
                String::from_utf8(bytes).ok()
            }
            Self::QuotedPrintable => Some(quoted_printable_decode(input)),
        }
    }
}

/// Quoted-printable encoding: `=XX` octets, printable ASCII verbatim.
#[must_use]
pub fn quoted_printable_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'=' => out.push_str("=3D"),
            b'\t' | 0x20..=0x7E => out.push(char::from(b)),
            _ => {
                out.push_str(&format!("={b:02X}"));
            }
        }
    }
    out
}

/// Quoted-printable decoding, including `=` soft line breaks.
#[must_use]
pub fn quoted_printable_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b != b'=' {
            out.push(b);
            i += 1;
            continue;
        }
        match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(&b'\r'), Some(&b'\n')) => i += 3, // soft break
            (Some(&b'\n'), _) => i += 2,            // soft break, bare LF
            (Some(&hi), Some(&lo)) => match (hex_value(hi), hex_value(lo)) {
                (Some(hi), Some(lo)) => {
                    out.push(hi * 16 + lo);
                    i += 3;
                }
                _ => {
                    out.push(b);
                    i += 1;
                }
            },
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_round_trip() {
        let cases = [
            "plain text",
            "semi;colon, comma",
            "back\\slash",
            "multi\nline",
            "Unicode 字符串 🎉",
        ];
        for case in cases {
            assert_eq!(unescape_text(&escape_text(case)), case);
        }
    }

    #[test]
    fn unescape_accepts_upper_n() {
        assert_eq!(unescape_text(r"a\Nb"), "a\nb");
        assert_eq!(unescape_text(r"a\nb"), "a\nb");
    }

    #[test]
    fn fold_short_line_unchanged() {
        let line = "SUMMARY:Team Meeting";
        assert_eq!(fold(line), line);
    }

    #[test]
    fn fold_unfold_is_idempotent() {
        let line = format!("DESCRIPTION:{}", "x".repeat(300));
        let folded = fold(&line);
        for physical in folded.split("\r\n") {
            assert!(physical.len() <= FOLD_WIDTH);
        }
        assert_eq!(unfold(&folded), vec![line]);
    }

    #[test]
    fn fold_never_splits_utf8() {
        let line = format!("NOTE:{}", "字".repeat(100));
        let folded = fold(&line);
        // Every physical segment must itself be valid UTF-8 text; the fold
        // points must land on char boundaries.
        assert_eq!(unfold(&folded), vec![line]);
    }

    #[test]
    fn unfold_joins_tab_continuations() {
        let input = "SUMMARY:Team\r\n\tMeeting\r\n";
        assert_eq!(unfold(input), vec!["SUMMARY:TeamMeeting"]);
    }

    #[test]
    fn split_unescaped_honors_escapes() {
        assert_eq!(split_unescaped(r"a\,b,c", ','), vec![r"a\,b", "c"]);
        assert_eq!(split_unescaped("a;b;c", ';'), vec!["a", "b", "c"]);
        assert_eq!(split_unescaped("", ','), vec![""]);
    }

    #[test]
    fn quoted_printable_round_trip() {
        let text = "héllo =world=\nnext";
        let encoded = quoted_printable_encode(text);
        assert!(!encoded.contains('\n'));
        assert_eq!(quoted_printable_decode(&encoded), text);
    }

    #[test]
    fn quoted_printable_soft_break() {
        assert_eq!(quoted_printable_decode("foo=\r\nbar"), "foobar");
        assert_eq!(quoted_printable_decode("foo=\nbar"), "foobar");
    }

    #[test]
    fn base64_encoding_round_trip() {
        let encoded = Encoding::Base64.encode("hello");
        assert_eq!(encoded, "aGVsbG8=");
        assert_eq!(Encoding::Base64.decode(&encoded).as_deref(), Some("hello"));
        assert_eq!(Encoding::Base64.decode("not base64!"), None);
    }
}
