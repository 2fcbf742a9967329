// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Serializes components back to folded wire text.

use std::fmt::Write as _;

use crate::codec::{codec_for, encode_value};
use crate::contentline::{Component, ContentLine, Parameter};
use crate::encoding::fold;
use crate::error::ParseError;
use crate::registry::Registry;
use crate::value::Value;

/// Serializes a component to CRLF-terminated, 75-octet-folded text.
///
/// Properties are emitted in a stable case-insensitive name order so two
/// semantically equal components produce identical bytes. Grouped values
/// reuse their source `itemN` prefix when one is present and mint fresh
/// prefixes otherwise.
///
/// # Errors
///
/// Returns [`ParseError::InvalidValue`] when a value cannot be encoded.
pub fn serialize(component: &Component, registry: &Registry) -> Result<String, ParseError> {
    let mut out = String::new();
    let mut group_counter = next_group_index(component);
    write_component(&mut out, component, registry, &mut group_counter)?;
    Ok(out)
}

fn write_component(
    out: &mut String,
    component: &Component,
    registry: &Registry,
    group_counter: &mut usize,
) -> Result<(), ParseError> {
    push_line(out, &format!("BEGIN:{}", component.name.to_uppercase()));

    let mut ordered: Vec<&ContentLine> = component.properties.iter().collect();
    ordered.sort_by(|a, b| {
        a.name
            .to_ascii_lowercase()
            .cmp(&b.name.to_ascii_lowercase())
    });
    for property in ordered {
        write_property(out, property, registry, group_counter)?;
    }

    for child in &component.children {
        write_component(out, child, registry, group_counter)?;
    }

    push_line(out, &format!("END:{}", component.name.to_uppercase()));
    Ok(())
}

fn write_property(
    out: &mut String,
    line: &ContentLine,
    registry: &Registry,
    group_counter: &mut usize,
) -> Result<(), ParseError> {
    if let Some(Value::Grouped(grouped)) = line.values.first() {
        let prefix = match &line.group {
            Some(group) => group.clone(),
            None => {
                let minted = format!("item{}", *group_counter);
                *group_counter += 1;
                minted
            }
        };

        let mut head = format!("{prefix}.{}", line.name);
        for parameter in &line.parameters {
            write_parameter(&mut head, parameter);
        }
        let _ = write!(head, ":{}", encode_value(&grouped.value, line)?);
        push_line(out, &head);

        for sibling in &grouped.properties {
            let mut sub = format!("{prefix}.{}", sibling.name);
            for parameter in &sibling.parameters {
                write_parameter(&mut sub, parameter);
            }
            let _ = write!(sub, ":{}", encode_values(sibling, registry)?);
            push_line(out, &sub);
        }
        return Ok(());
    }

    let mut head = match &line.group {
        Some(group) => format!("{group}.{}", line.name),
        None => line.name.clone(),
    };
    for parameter in &line.parameters {
        write_parameter(&mut head, parameter);
    }
    let _ = write!(head, ":{}", encode_values(line, registry)?);
    push_line(out, &head);
    Ok(())
}

fn encode_values(line: &ContentLine, registry: &Registry) -> Result<String, ParseError> {
    let pieces = line
        .values
        .iter()
        .map(|value| encode_one(value, line, registry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pieces.join(","))
}

fn encode_one(
    value: &Value,
    line: &ContentLine,
    registry: &Registry,
) -> Result<String, ParseError> {
    // A registered kind wins; otherwise the value's own kind decides.
    match registry.resolve_kind(line).or_else(|| value.kind()) {
        Some(kind) => codec_for(kind).encode(value, line),
        None => encode_value(value, line),
    }
}

fn write_parameter(out: &mut String, parameter: &Parameter) {
    if parameter.name.eq_ignore_ascii_case("TYPE") {
        // Apple and older exporters expect TYPE repeated per value.
        for value in &parameter.values {
            let _ = write!(out, ";TYPE={value}");
        }
        return;
    }
    let joined = parameter.values.join(",");
    if joined.contains([';', ':', ',']) {
        let _ = write!(out, ";{}=\"{joined}\"", parameter.name);
    } else {
        let _ = write!(out, ";{}={joined}", parameter.name);
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(&fold(line));
    out.push_str("\r\n");
}

/// First `item{N}` index not already used by a source group, so minted
/// prefixes never collide with preserved ones.
fn next_group_index(component: &Component) -> usize {
    let mut max = 0;
    for property in &component.properties {
        if let Some(group) = &property.group
            && let Some(digits) = group.strip_prefix("item")
            && let Ok(n) = digits.parse::<usize>()
        {
            max = max.max(n);
        }
    }
    for child in &component.children {
        max = max.max(next_group_index(child).saturating_sub(1));
    }
    max + 1
}
