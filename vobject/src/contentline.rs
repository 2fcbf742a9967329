// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory model of content lines and components.
//!
//! A content line is one logical (possibly folded) line of the
//! vCard/iCalendar text grammar:
//!
//! ```text
//! contentline = [group "."] name *(";" param) ":" value CRLF
//! ```
//!
//! Components are `BEGIN:<NAME>` / `END:<NAME>` blocks holding properties
//! and, recursively, child components.

use crate::value::Value;

/// A single property parameter, e.g. `TYPE=HOME,VOICE`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name, upper-cased on parse.
    pub name: String,

    /// Parameter values. Never empty.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Creates a parameter with multiple values.
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// One logical content line: name, optional group, parameters and values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentLine {
    /// Property name, upper-cased on parse.
    pub name: String,

    /// Group prefix (`itemN`), lower-cased on parse.
    pub group: Option<String>,

    /// Property parameters, in source order.
    pub parameters: Vec<Parameter>,

    /// Decoded values. Multiple values share one name.
    pub values: Vec<Value>,
}

impl ContentLine {
    /// Creates a content line with a single value and no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            group: None,
            parameters: Vec::new(),
            values: vec![value],
        }
    }

    /// Sets the group prefix.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends a value.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.values.push(value);
        self
    }

    /// Looks up a parameter by name, case-insensitively.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first value, if any.
    #[must_use]
    pub fn first_value(&self) -> Option<&Value> {
        self.values.first()
    }

    /// Returns the raw text of the first value when it is still undecoded.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        match self.values.first() {
            Some(Value::Raw(s)) => Some(s),
            _ => None,
        }
    }
}

/// A `BEGIN`/`END` block: properties plus child components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    /// Component name (`VCARD`, `VCALENDAR`, `VEVENT`, ...), upper-cased.
    pub name: String,

    /// Properties in source order.
    pub properties: Vec<ContentLine>,

    /// Child components in source order.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends a property.
    pub fn push_property(&mut self, property: ContentLine) -> &mut Self {
        self.properties.push(property);
        self
    }

    /// Appends a child component.
    pub fn push_child(&mut self, child: Component) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Finds the first property with the given name, case-insensitively.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ContentLine> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Iterates over all properties with the given name, case-insensitively.
    pub fn properties_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ContentLine> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_lookup_is_case_insensitive() {
        let line = ContentLine::new("TEL", Value::Text("+1 555 0100".to_string()))
            .with_parameter(Parameter::new("TYPE", "HOME"));

        assert!(line.parameter("type").is_some());
        assert!(line.parameter("TYPE").is_some());
        assert!(line.parameter("VALUE").is_none());
    }

    #[test]
    fn component_property_lookup() {
        let mut component = Component::new("VCARD");
        component.push_property(ContentLine::new("FN", Value::Text("Ada".to_string())));
        component.push_property(ContentLine::new("TEL", Value::Text("1".to_string())));
        component.push_property(ContentLine::new("TEL", Value::Text("2".to_string())));

        assert!(component.property("fn").is_some());
        assert_eq!(component.properties_named("TEL").count(), 2);
    }
}
