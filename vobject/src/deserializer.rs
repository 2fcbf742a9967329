// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Parses wire text into components.
//!
//! The scanner walks each unfolded line once, byte by byte: group prefix,
//! name, parameters, then the value text. Value decoding is tolerant:
//! text that fails its registered codec stays [`Value::Raw`] rather than
//! aborting the document.

use crate::codec::codec_for;
use crate::contentline::{Component, ContentLine, Parameter};
use crate::encoding::{split_unescaped, unfold};
use crate::error::ParseError;
use crate::registry::Registry;
use crate::value::{Value, ValueKind};

/// Parses a document into its top-level components.
///
/// # Errors
///
/// Returns [`ParseError`] on grammar violations: a line without `:`,
/// an unterminated quoted parameter, unbalanced `BEGIN`/`END`, or a
/// property outside any component.
pub fn deserialize(input: &str, registry: &Registry) -> Result<Vec<Component>, ParseError> {
    let mut roots = Vec::new();
    let mut stack: Vec<Component> = Vec::new();

    for (index, logical) in unfold(input).into_iter().enumerate() {
        if logical.trim().is_empty() {
            continue;
        }
        let number = index + 1;
        let parsed = parse_content_line(&logical, number)?;

        if parsed.name == "BEGIN" {
            stack.push(Component::new(parsed.value.trim().to_uppercase()));
            continue;
        }
        if parsed.name == "END" {
            let found = parsed.value.trim().to_uppercase();
            let Some(component) = stack.pop() else {
                return Err(ParseError::UnexpectedEnd { name: found });
            };
            if component.name != found {
                return Err(ParseError::MismatchedEnd {
                    expected: component.name,
                    found,
                });
            }
            match stack.last_mut() {
                Some(parent) => {
                    parent.push_child(component);
                }
                None => roots.push(component),
            }
            continue;
        }

        let Some(component) = stack.last_mut() else {
            return Err(ParseError::PropertyOutsideComponent {
                name: parsed.name,
                line: number,
            });
        };
        attach_line(component, parsed, registry);
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::UnterminatedComponent { name: open.name });
    }
    Ok(roots)
}

struct ParsedLine {
    group: Option<String>,
    name: String,
    parameters: Vec<Parameter>,
    value: String,
}

fn parse_content_line(line: &str, number: usize) -> Result<ParsedLine, ParseError> {
    let malformed = |reason: &str| ParseError::MalformedLine {
        line: number,
        reason: reason.to_string(),
    };

    let bytes = line.as_bytes();
    let mut i = 0;

    // [group "."] name
    let name_start = i;
    while bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'.')
    {
        i += 1;
    }
    let head = line.get(name_start..i).unwrap_or_default();
    if head.is_empty() {
        return Err(malformed("missing property name"));
    }
    let (group, name) = match head.split_once('.') {
        Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty() => {
            (Some(prefix.to_ascii_lowercase()), rest.to_uppercase())
        }
        Some(_) => return Err(malformed("empty group or property name")),
        None => (None, head.to_uppercase()),
    };

    // *(";" param)
    let mut parameters: Vec<Parameter> = Vec::new();
    while bytes.get(i) == Some(&b';') {
        i += 1;
        let param_start = i;
        while bytes
            .get(i)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-')
        {
            i += 1;
        }
        let param_name = line.get(param_start..i).unwrap_or_default();
        if param_name.is_empty() {
            return Err(malformed("missing parameter name"));
        }
        if bytes.get(i) != Some(&b'=') {
            return Err(malformed("missing '=' after parameter name"));
        }
        i += 1;

        let mut values = Vec::new();
        loop {
            if bytes.get(i) == Some(&b'"') {
                i += 1;
                let quoted_start = i;
                while bytes.get(i).is_some_and(|b| *b != b'"') {
                    i += 1;
                }
                if bytes.get(i) != Some(&b'"') {
                    return Err(malformed("unterminated quoted parameter value"));
                }
                values.push(line.get(quoted_start..i).unwrap_or_default().to_string());
                i += 1;
            } else {
                let bare_start = i;
                while bytes
                    .get(i)
                    .is_some_and(|b| *b != b',' && *b != b';' && *b != b':')
                {
                    i += 1;
                }
                values.push(line.get(bare_start..i).unwrap_or_default().to_string());
            }
            if bytes.get(i) == Some(&b',') {
                i += 1;
                continue;
            }
            break;
        }
        merge_parameter(&mut parameters, param_name.to_uppercase(), values);
    }

    // ":" value
    if bytes.get(i) != Some(&b':') {
        return Err(malformed("missing ':' before property value"));
    }
    let value = line.get(i + 1..).unwrap_or_default().to_string();

    Ok(ParsedLine {
        group,
        name,
        parameters,
        value,
    })
}

/// Repeated parameter names collapse into one multi-valued parameter.
fn merge_parameter(parameters: &mut Vec<Parameter>, name: String, values: Vec<String>) {
    match parameters
        .iter_mut()
        .find(|p| p.name.eq_ignore_ascii_case(&name))
    {
        Some(existing) => existing.values.extend(values),
        None => parameters.push(Parameter { name, values }),
    }
}

fn attach_line(component: &mut Component, parsed: ParsedLine, registry: &Registry) {
    // A line sharing the previous property's group joins that property's
    // grouped value instead of standing alone.
    if let Some(group) = &parsed.group
        && let Some(last) = component.properties.last_mut()
        && last.group.as_deref() == Some(group)
        && let Some(Value::Grouped(grouped)) = last.values.first_mut()
    {
        let values = decode_values(&parsed, registry);
        grouped.properties.push(ContentLine {
            name: parsed.name,
            group: None,
            parameters: parsed.parameters,
            values,
        });
        return;
    }

    let values = decode_values(&parsed, registry);
    component.push_property(ContentLine {
        name: parsed.name,
        group: parsed.group,
        parameters: parsed.parameters,
        values,
    });
}

fn decode_values(parsed: &ParsedLine, registry: &Registry) -> Vec<Value> {
    // The resolver sees the raw text so it can sniff date vs date-time.
    let probe = ContentLine {
        name: parsed.name.clone(),
        group: parsed.group.clone(),
        parameters: parsed.parameters.clone(),
        values: vec![Value::Raw(parsed.value.clone())],
    };
    let Some(kind) = registry.resolve_kind(&probe) else {
        return vec![Value::Raw(parsed.value.clone())];
    };
    let codec = codec_for(kind);

    let pieces: Vec<&str> = if registry.allows_multiple(&parsed.name) && kind != ValueKind::Grouped
    {
        split_unescaped(&parsed.value, ',')
    } else {
        vec![parsed.value.as_str()]
    };

    let mut values = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match codec.decode(piece, &probe) {
            Ok(Some(value)) => values.push(value),
            Ok(None) => {}
            Err(_) => values.push(Value::Raw(piece.to_string())),
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vcard(text: &str) -> Component {
        let mut roots = deserialize(text, &Registry::vcard()).unwrap();
        assert_eq!(roots.len(), 1);
        roots.remove(0)
    }

    #[test]
    fn parses_a_minimal_card() {
        let card = vcard("BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Ada Lovelace\r\nEND:VCARD\r\n");
        assert_eq!(card.name, "VCARD");
        let fn_ = card.property("FN").unwrap();
        assert_eq!(
            fn_.first_value(),
            Some(&Value::Text("Ada Lovelace".to_string()))
        );
    }

    #[test]
    fn folded_lines_are_one_property() {
        let card = vcard("BEGIN:VCARD\r\nNOTE:first part\r\n  second part\r\nEND:VCARD\r\n");
        let note = card.property("NOTE").unwrap();
        assert_eq!(
            note.first_value(),
            Some(&Value::Text("first part second part".to_string()))
        );
    }

    #[test]
    fn quoted_parameter_protects_delimiters() {
        let card = vcard("BEGIN:VCARD\r\nTEL;X-LABEL=\"home;main\":+1 555 0100\r\nEND:VCARD\r\n");
        let tel = card.property("TEL").unwrap();
        assert_eq!(tel.parameter("X-LABEL").unwrap().values, vec!["home;main"]);
    }

    #[test]
    fn repeated_type_parameters_merge() {
        let card = vcard("BEGIN:VCARD\r\nTEL;TYPE=HOME;TYPE=VOICE:+1\r\nEND:VCARD\r\n");
        let tel = card.property("TEL").unwrap();
        assert_eq!(tel.parameter("TYPE").unwrap().values, vec!["HOME", "VOICE"]);
    }

    #[test]
    fn comma_values_split_for_multi_valued_properties() {
        let card = vcard("BEGIN:VCARD\r\nCATEGORIES:work,friends\\, close\r\nEND:VCARD\r\n");
        let categories = card.property("CATEGORIES").unwrap();
        assert_eq!(
            categories.values,
            vec![
                Value::Text("work".to_string()),
                Value::Text("friends, close".to_string()),
            ]
        );
    }

    #[test]
    fn exdate_occurrence_lists_decode_per_value() {
        let input = "BEGIN:VCALENDAR\r\n\
                     BEGIN:VEVENT\r\n\
                     EXDATE:20240301,20240302\r\n\
                     RDATE:20240401T100000Z,20240402T100000Z\r\n\
                     END:VEVENT\r\n\
                     END:VCALENDAR\r\n";
        let mut roots = deserialize(input, &Registry::icalendar()).unwrap();
        let calendar = roots.remove(0);
        let event = &calendar.children[0];

        let exdate = event.property("EXDATE").unwrap();
        assert_eq!(exdate.values.len(), 2);
        assert!(exdate.values.iter().all(|v| matches!(v, Value::Date(_))));

        let rdate = event.property("RDATE").unwrap();
        assert_eq!(rdate.values.len(), 2);
        assert!(
            rdate
                .values
                .iter()
                .all(|v| matches!(v, Value::DateTime(dt) if dt.utc))
        );
    }

    #[test]
    fn structured_fields_split_on_semicolons() {
        let card = vcard("BEGIN:VCARD\r\nN:Lovelace;Ada;;;\r\nEND:VCARD\r\n");
        let n = card.property("N").unwrap();
        assert_eq!(
            n.first_value(),
            Some(&Value::Structured(vec![
                "Lovelace".to_string(),
                "Ada".to_string(),
                String::new(),
                String::new(),
                String::new(),
            ]))
        );
    }

    #[test]
    fn unknown_properties_stay_raw() {
        let card = vcard("BEGIN:VCARD\r\nX-VENDOR-BLOB:a;b;c,d\r\nEND:VCARD\r\n");
        let blob = card.property("X-VENDOR-BLOB").unwrap();
        assert_eq!(blob.raw_value(), Some("a;b;c,d"));
    }

    #[test]
    fn grouped_lines_collapse_into_one_property() {
        let card = vcard(
            "BEGIN:VCARD\r\n\
             item1.X-ABDATE;X-APPLE-OMIT-YEAR=1604:1604-05-11\r\n\
             item1.X-ABLabel:anniversary\r\n\
             END:VCARD\r\n",
        );
        assert_eq!(card.properties.len(), 1);
        let prop = card.property("X-ABDATE").unwrap();
        assert_eq!(prop.group.as_deref(), Some("item1"));
        let Some(Value::Grouped(grouped)) = prop.first_value() else {
            panic!("expected grouped value");
        };
        assert!(matches!(*grouped.value, Value::Date(_)));
        let label = grouped.property("X-ABLabel").unwrap();
        assert_eq!(
            label.first_value(),
            Some(&Value::Text("anniversary".to_string()))
        );
    }

    #[test]
    fn distinct_groups_stay_separate() {
        let card = vcard(
            "BEGIN:VCARD\r\n\
             item1.X-SOCIALPROFILE:https://a.example\r\n\
             item2.X-SOCIALPROFILE:https://b.example\r\n\
             END:VCARD\r\n",
        );
        assert_eq!(card.properties_named("X-SOCIALPROFILE").count(), 2);
    }

    #[test]
    fn nested_components_parse() {
        let input = "BEGIN:VCALENDAR\r\n\
                     VERSION:2.0\r\n\
                     BEGIN:VEVENT\r\n\
                     UID:1\r\n\
                     DTSTART;VALUE=DATE:20240301\r\n\
                     END:VEVENT\r\n\
                     END:VCALENDAR\r\n";
        let mut roots = deserialize(input, &Registry::icalendar()).unwrap();
        let calendar = roots.remove(0);
        assert_eq!(calendar.children.len(), 1);
        let event = &calendar.children[0];
        let dtstart = event.property("DTSTART").unwrap();
        assert!(matches!(dtstart.first_value(), Some(Value::Date(_))));
    }

    #[test]
    fn resolver_sees_raw_text_shape() {
        let input = "BEGIN:VCALENDAR\r\n\
                     BEGIN:VEVENT\r\n\
                     DTSTART:20240301T090000Z\r\n\
                     END:VEVENT\r\n\
                     END:VCALENDAR\r\n";
        let roots = deserialize(input, &Registry::icalendar()).unwrap();
        let dtstart = roots[0].children[0].property("DTSTART").unwrap();
        assert!(matches!(dtstart.first_value(), Some(Value::DateTime(_))));
    }

    #[test]
    fn missing_colon_is_malformed() {
        let err = deserialize("BEGIN:VCARD\r\nFN\r\nEND:VCARD\r\n", &Registry::vcard())
            .unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let err = deserialize(
            "BEGIN:VCARD\r\nTEL;X-L=\"oops:+1\r\nEND:VCARD\r\n",
            &Registry::vcard(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { .. }));
    }

    #[test]
    fn mismatched_end_is_rejected() {
        let err = deserialize("BEGIN:VCARD\r\nEND:VCALENDAR\r\n", &Registry::vcard())
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::MismatchedEnd { expected, found }
                if expected == "VCARD" && found == "VCALENDAR"
        ));
    }

    #[test]
    fn stray_end_is_rejected() {
        let err = deserialize("END:VCARD\r\n", &Registry::vcard()).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));
    }

    #[test]
    fn unterminated_component_is_rejected() {
        let err = deserialize("BEGIN:VCARD\r\nFN:Ada\r\n", &Registry::vcard()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnterminatedComponent { name } if name == "VCARD"
        ));
    }

    #[test]
    fn property_outside_component_is_rejected() {
        let err = deserialize("FN:Ada\r\n", &Registry::vcard()).unwrap_err();
        assert!(matches!(err, ParseError::PropertyOutsideComponent { .. }));
    }

    #[test]
    fn undecodable_value_falls_back_to_raw() {
        let input = "BEGIN:VCALENDAR\r\n\
                     BEGIN:VEVENT\r\n\
                     SEQUENCE:not-a-number\r\n\
                     END:VEVENT\r\n\
                     END:VCALENDAR\r\n";
        let roots = deserialize(input, &Registry::icalendar()).unwrap();
        let sequence = roots[0].children[0].property("SEQUENCE").unwrap();
        assert_eq!(sequence.raw_value(), Some("not-a-number"));
    }
}
