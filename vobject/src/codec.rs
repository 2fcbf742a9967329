// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Per-kind value codecs.
//!
//! Each [`ValueKind`] has a codec that turns wire text into a typed
//! [`Value`] and back. Codecs receive the owning [`ContentLine`] so they
//! can consult parameters such as `ENCODING` and `VALUE`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::contentline::ContentLine;
use crate::encoding::{Encoding, escape_text, split_unescaped, unescape_text};
use crate::error::ParseError;
use crate::value::{GroupedValue, Value, ValueDate, ValueDateTime, ValueKind};

/// Encodes and decodes one value kind.
pub trait ValueCodec: Send + Sync {
    /// Encodes a typed value to wire text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidValue`] when the value cannot be
    /// represented on the wire.
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError>;

    /// Decodes wire text to a typed value. `Ok(None)` means the text is
    /// empty or whitespace and contributes no value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidValue`] when the text does not match
    /// this kind's grammar.
    fn decode(&self, input: &str, line: &ContentLine) -> Result<Option<Value>, ParseError>;
}

/// Returns the codec for a kind.
#[must_use]
pub fn codec_for(kind: ValueKind) -> &'static dyn ValueCodec {
    match kind {
        ValueKind::Text => &TextCodec,
        ValueKind::Structured => &StructuredCodec,
        ValueKind::Integer => &IntegerCodec,
        ValueKind::Boolean => &BooleanCodec,
        ValueKind::Date => &DateCodec,
        ValueKind::DateTime => &DateTimeCodec,
        ValueKind::Uri => &UriCodec,
        ValueKind::Binary => &BinaryCodec,
        ValueKind::Grouped => &GroupedCodec,
    }
}

/// Encodes a value by its own kind, regardless of the line's registration.
///
/// [`Value::Raw`] passes through verbatim.
///
/// # Errors
///
/// Returns [`ParseError::InvalidValue`] when the value cannot be
/// represented on the wire.
pub fn encode_value(value: &Value, line: &ContentLine) -> Result<String, ParseError> {
    match value.kind() {
        Some(kind) => codec_for(kind).encode(value, line),
        None => match value {
            Value::Raw(text) => Ok(text.clone()),
            _ => unreachable!("every non-Raw variant maps to a kind"),
        },
    }
}

fn invalid(line: &ContentLine, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidValue {
        name: line.name.clone(),
        reason: reason.into(),
    }
}

fn blank(input: &str) -> bool {
    input.trim().is_empty()
}

/// Escaped free-form text, honoring the `ENCODING` parameter.
#[derive(Debug, Clone, Copy)]
pub struct TextCodec;

impl ValueCodec for TextCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Text(text) => Ok(Encoding::from_parameters(line).encode(text)),
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, line: &ContentLine) -> Result<Option<Value>, ParseError> {
        if blank(input) {
            return Ok(None);
        }
        let encoding = Encoding::from_parameters(line);
        let text = encoding
            .decode(input)
            .ok_or_else(|| invalid(line, "undecodable text payload"))?;
        Ok(Some(Value::Text(text)))
    }
}

/// Semicolon-separated fields, each backslash-escaped.
#[derive(Debug, Clone, Copy)]
pub struct StructuredCodec;

impl ValueCodec for StructuredCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Structured(fields) => Ok(fields
                .iter()
                .map(|f| escape_text(f))
                .collect::<Vec<_>>()
                .join(";")),
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, _line: &ContentLine) -> Result<Option<Value>, ParseError> {
        if blank(input) {
            return Ok(None);
        }
        let fields = split_unescaped(input, ';')
            .into_iter()
            .map(unescape_text)
            .collect();
        Ok(Some(Value::Structured(fields)))
    }
}

/// Signed decimal integer.
#[derive(Debug, Clone, Copy)]
pub struct IntegerCodec;

impl ValueCodec for IntegerCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Integer(n) => Ok(n.to_string()),
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, line: &ContentLine) -> Result<Option<Value>, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let n = lexical::parse::<i64, _>(trimmed)
            .map_err(|e| invalid(line, format!("not an integer: {e}")))?;
        Ok(Some(Value::Integer(n)))
    }
}

/// `TRUE` / `FALSE`, case-insensitive on decode.
#[derive(Debug, Clone, Copy)]
pub struct BooleanCodec;

impl ValueCodec for BooleanCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Boolean(true) => Ok("TRUE".to_string()),
            Value::Boolean(false) => Ok("FALSE".to_string()),
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, line: &ContentLine) -> Result<Option<Value>, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(Some(Value::Boolean(true)))
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(Some(Value::Boolean(false)))
        } else {
            Err(invalid(line, format!("not a boolean: {trimmed}")))
        }
    }
}

/// `YYYYMMDD` basic form or `YYYY-MM-DD` extended form.
#[derive(Debug, Clone, Copy)]
pub struct DateCodec;

impl ValueCodec for DateCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Date(d) => {
                let (y, m, day) = (d.date.year(), d.date.month(), d.date.day());
                Ok(match d.extended {
                    true => format!("{y:04}-{m:02}-{day:02}"),
                    false => format!("{y:04}{m:02}{day:02}"),
                })
            }
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, line: &ContentLine) -> Result<Option<Value>, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let date = parse_date(trimmed).ok_or_else(|| invalid(line, "not a date"))?;
        Ok(Some(Value::Date(date)))
    }
}

/// `YYYYMMDDTHHMMSS` with an optional trailing `Z`.
#[derive(Debug, Clone, Copy)]
pub struct DateTimeCodec;

impl ValueCodec for DateTimeCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::DateTime(dt) => {
                let d = dt.date_time.date();
                let t = dt.date_time.time();
                let suffix = if dt.utc { "Z" } else { "" };
                Ok(format!(
                    "{:04}{:02}{:02}T{:02}{:02}{:02}{suffix}",
                    d.year(),
                    d.month(),
                    d.day(),
                    t.hour(),
                    t.minute(),
                    t.second(),
                ))
            }
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, line: &ContentLine) -> Result<Option<Value>, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let dt = parse_date_time(trimmed).ok_or_else(|| invalid(line, "not a date-time"))?;
        Ok(Some(Value::DateTime(dt)))
    }
}

/// Unvalidated URI text, passed through verbatim.
#[derive(Debug, Clone, Copy)]
pub struct UriCodec;

impl ValueCodec for UriCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Uri(uri) => Ok(uri.clone()),
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, _line: &ContentLine) -> Result<Option<Value>, ParseError> {
        if blank(input) {
            return Ok(None);
        }
        Ok(Some(Value::Uri(input.to_string())))
    }
}

/// Base64-transported binary payload.
#[derive(Debug, Clone, Copy)]
pub struct BinaryCodec;

impl ValueCodec for BinaryCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Binary(bytes) => Ok(BASE64.encode(bytes)),
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, line: &ContentLine) -> Result<Option<Value>, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let bytes = BASE64
            .decode(trimmed)
            .map_err(|e| invalid(line, format!("bad base64: {e}")))?;
        Ok(Some(Value::Binary(bytes)))
    }
}

/// Primary value of an `itemN.` group.
///
/// Decoding picks the inner type heuristically (date, date-time, URI,
/// else text); the deserializer attaches sibling properties afterwards.
#[derive(Debug, Clone, Copy)]
pub struct GroupedCodec;

impl ValueCodec for GroupedCodec {
    fn encode(&self, value: &Value, line: &ContentLine) -> Result<String, ParseError> {
        match value {
            Value::Grouped(grouped) => encode_value(&grouped.value, line),
            other => encode_value(other, line),
        }
    }

    fn decode(&self, input: &str, _line: &ContentLine) -> Result<Option<Value>, ParseError> {
        if blank(input) {
            return Ok(None);
        }
        let inner = if let Some(date) = parse_date(input.trim()) {
            Value::Date(date)
        } else if let Some(dt) = parse_date_time(input.trim()) {
            Value::DateTime(dt)
        } else if input.contains("://") {
            Value::Uri(input.to_string())
        } else {
            Value::Text(unescape_text(input))
        };
        Ok(Some(Value::Grouped(GroupedValue::new(inner))))
    }
}

fn parse_date(input: &str) -> Option<ValueDate> {
    let (digits, extended) = match input.len() {
        8 => (input.to_string(), false),
        10 => {
            let mut parts = input.split('-');
            let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
            if y.len() != 4 || m.len() != 2 || d.len() != 2 || parts.next().is_some() {
                return None;
            }
            (format!("{y}{m}{d}"), true)
        }
        _ => return None,
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = digits.get(0..4)?.parse::<i16>().ok()?;
    let month = digits.get(4..6)?.parse::<i8>().ok()?;
    let day = digits.get(6..8)?.parse::<i8>().ok()?;
    let date = jiff::civil::Date::new(year, month, day).ok()?;
    Some(ValueDate { date, extended })
}

fn parse_date_time(input: &str) -> Option<ValueDateTime> {
    let (body, utc) = match input.strip_suffix(['Z', 'z']) {
        Some(stripped) => (stripped, true),
        None => (input, false),
    };
    let (date_part, time_part) = body.split_once(['T', 't'])?;
    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }
    let date = parse_date(date_part)?.date;
    if !time_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour = time_part.get(0..2)?.parse::<i8>().ok()?;
    let minute = time_part.get(2..4)?.parse::<i8>().ok()?;
    let second = time_part.get(4..6)?.parse::<i8>().ok()?;
    let time = jiff::civil::Time::new(hour, minute, second, 0).ok()?;
    Some(ValueDateTime {
        date_time: date.to_datetime(time),
        utc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str) -> ContentLine {
        ContentLine {
            name: name.to_string(),
            ..ContentLine::default()
        }
    }

    #[test]
    fn integer_decode_and_encode() {
        let l = line("SEQUENCE");
        let v = IntegerCodec.decode("42", &l).unwrap().unwrap();
        assert_eq!(v, Value::Integer(42));
        assert_eq!(IntegerCodec.encode(&v, &l).unwrap(), "42");
        assert!(IntegerCodec.decode("forty-two", &l).is_err());
        assert!(IntegerCodec.decode("  ", &l).unwrap().is_none());
    }

    #[test]
    fn boolean_is_case_insensitive() {
        let l = line("X-FLAG");
        assert_eq!(
            BooleanCodec.decode("tRuE", &l).unwrap(),
            Some(Value::Boolean(true))
        );
        assert!(BooleanCodec.decode("yes", &l).is_err());
    }

    #[test]
    fn date_basic_and_extended_forms_round_trip() {
        let l = line("BDAY");
        let basic = DateCodec.decode("19960415", &l).unwrap().unwrap();
        assert_eq!(DateCodec.encode(&basic, &l).unwrap(), "19960415");

        let extended = DateCodec.decode("1996-04-15", &l).unwrap().unwrap();
        assert_eq!(DateCodec.encode(&extended, &l).unwrap(), "1996-04-15");

        match (basic, extended) {
            (Value::Date(b), Value::Date(e)) => assert_eq!(b.date, e.date),
            other => panic!("expected dates, got {other:?}"),
        }
    }

    #[test]
    fn date_rejects_out_of_range() {
        let l = line("BDAY");
        assert!(DateCodec.decode("19961345", &l).is_err());
        assert!(DateCodec.decode("1996-4-15", &l).is_err());
    }

    #[test]
    fn date_time_utc_flag_round_trips() {
        let l = line("DTSTART");
        let utc = DateTimeCodec.decode("20240301T120000Z", &l).unwrap().unwrap();
        assert_eq!(DateTimeCodec.encode(&utc, &l).unwrap(), "20240301T120000Z");

        let floating = DateTimeCodec.decode("20240301T120000", &l).unwrap().unwrap();
        assert_eq!(
            DateTimeCodec.encode(&floating, &l).unwrap(),
            "20240301T120000"
        );
    }

    #[test]
    fn binary_round_trips_base64() {
        let l = line("PHOTO");
        let v = BinaryCodec.decode("aGVsbG8=", &l).unwrap().unwrap();
        assert_eq!(v, Value::Binary(b"hello".to_vec()));
        assert_eq!(BinaryCodec.encode(&v, &l).unwrap(), "aGVsbG8=");
    }

    #[test]
    fn text_honors_encoding_parameter() {
        let qp = ContentLine {
            name: "NOTE".to_string(),
            parameters: vec![crate::contentline::Parameter::new(
                "ENCODING",
                "QUOTED-PRINTABLE",
            )],
            ..ContentLine::default()
        };
        let v = TextCodec.decode("caf=C3=A9", &qp).unwrap().unwrap();
        assert_eq!(v, Value::Text("café".to_string()));
    }

    #[test]
    fn grouped_decodes_inner_by_shape() {
        let l = line("X-ABDATE");
        match GroupedCodec.decode("2024-03-01", &l).unwrap().unwrap() {
            Value::Grouped(g) => assert!(matches!(*g.value, Value::Date(_))),
            other => panic!("expected grouped, got {other:?}"),
        }
        match GroupedCodec
            .decode("https://example.com/a", &l)
            .unwrap()
            .unwrap()
        {
            Value::Grouped(g) => assert!(matches!(*g.value, Value::Uri(_))),
            other => panic!("expected grouped, got {other:?}"),
        }
    }

    #[test]
    fn encode_value_handles_raw_verbatim() {
        let l = line("RRULE");
        let raw = Value::Raw("FREQ=WEEKLY;BYDAY=MO".to_string());
        assert_eq!(encode_value(&raw, &l).unwrap(), "FREQ=WEEKLY;BYDAY=MO");
    }

    #[test]
    fn mismatched_variant_falls_back_to_its_own_kind() {
        // A URI stored under a TEXT-registered name still encodes as a URI.
        let l = line("X-ANY");
        let v = Value::Uri("https://example.com".to_string());
        assert_eq!(TextCodec.encode(&v, &l).unwrap(), "https://example.com");
    }
}
