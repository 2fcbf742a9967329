// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! RFC 6570 URI templates (levels 1-4), plus appended query pairs.
//!
//! Request paths are built from templates like
//! `/calendars/{calendarId}/{eventId}.ics` so hrefs never get spliced
//! into URLs by string concatenation.

use std::collections::HashMap;

use crate::error::DavError;

/// A URI template with bound path variables and extra query pairs.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    path: HashMap<String, Vec<String>>,
    query: Vec<(String, String)>,
}

/// Expansion behavior of one template operator.
struct Operator {
    first: &'static str,
    sep: &'static str,
    named: bool,
    ifemp: &'static str,
    reserved: bool,
}

const SIMPLE: Operator = Operator {
    first: "",
    sep: ",",
    named: false,
    ifemp: "",
    reserved: false,
};

impl UriTemplate {
    /// Wraps a template string. Text without expressions passes through
    /// verbatim, so a literal href is a valid template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            path: HashMap::new(),
            query: Vec::new(),
        }
    }

    /// Binds a path variable. Binding the same name again appends a
    /// value, which composite operators expand as a list.
    #[must_use]
    pub fn add_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Appends a query pair after expansion. `None` drops the pair.
    #[must_use]
    pub fn add_query(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        let name = name.into();
        match value {
            Some(value) => self.query.push((name, value.into())),
            None => tracing::warn!(%name, "dropping query pair without a value"),
        }
        self
    }

    /// Expands the template against the bound variables.
    ///
    /// Named operators (`;`, `?`, `&`) skip unbound variables; value
    /// operators treat them as an error since the path would silently
    /// lose a segment otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::MissingPathParameter`] for an unbound value
    /// expression and [`DavError::Config`] for template syntax errors.
    pub fn expand(&self) -> Result<String, DavError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            out.push_str(literal);
            let Some(close) = tail.find('}') else {
                return Err(DavError::Config(format!(
                    "unclosed expression in template {:?}",
                    self.template
                )));
            };
            let expression = tail.get(1..close).unwrap_or_default();
            self.expand_expression(&mut out, expression)?;
            rest = tail.get(close + 1..).unwrap_or_default();
        }
        out.push_str(rest);

        for (name, value) in &self.query {
            out.push(if out.contains('?') { '&' } else { '?' });
            out.push_str(&urlencoding::encode(name));
            if !value.is_empty() {
                out.push('=');
                out.push_str(&urlencoding::encode(value));
            }
        }
        Ok(out)
    }

    fn expand_expression(&self, out: &mut String, expression: &str) -> Result<(), DavError> {
        let (operator, variables) = match expression.chars().next() {
            // `|` is a legacy alias for simple expansion.
            Some('|') => (SIMPLE, expression.get(1..).unwrap_or_default()),
            Some('+') => (
                Operator {
                    reserved: true,
                    ..SIMPLE
                },
                expression.get(1..).unwrap_or_default(),
            ),
            Some('#') => (
                Operator {
                    first: "#",
                    reserved: true,
                    ..SIMPLE
                },
                expression.get(1..).unwrap_or_default(),
            ),
            Some('.') => (
                Operator {
                    first: ".",
                    sep: ".",
                    ..SIMPLE
                },
                expression.get(1..).unwrap_or_default(),
            ),
            Some('/') => (
                Operator {
                    first: "/",
                    sep: "/",
                    ..SIMPLE
                },
                expression.get(1..).unwrap_or_default(),
            ),
            Some(';') => (
                Operator {
                    first: ";",
                    sep: ";",
                    named: true,
                    ifemp: "",
                    reserved: false,
                },
                expression.get(1..).unwrap_or_default(),
            ),
            Some('?') => (
                Operator {
                    first: "?",
                    sep: "&",
                    named: true,
                    ifemp: "=",
                    reserved: false,
                },
                expression.get(1..).unwrap_or_default(),
            ),
            Some('&') => (
                Operator {
                    first: "&",
                    sep: "&",
                    named: true,
                    ifemp: "=",
                    reserved: false,
                },
                expression.get(1..).unwrap_or_default(),
            ),
            _ => (SIMPLE, expression),
        };

        let mut pieces = Vec::new();
        for varspec in variables.split(',') {
            let (name, prefix, explode) = parse_varspec(varspec);
            let Some(values) = self.path.get(name).filter(|v| !v.is_empty()) else {
                if operator.named {
                    continue;
                }
                return Err(DavError::MissingPathParameter {
                    template: self.template.clone(),
                    name: name.to_string(),
                });
            };

            let encode = |value: &str| -> String {
                let clipped = match prefix {
                    Some(n) => value.chars().take(n).collect::<String>(),
                    None => value.to_string(),
                };
                if operator.reserved {
                    encode_reserved(&clipped)
                } else {
                    urlencoding::encode(&clipped).into_owned()
                }
            };

            if operator.named {
                if explode {
                    for value in values {
                        pieces.push(named_pair(name, &encode(value), operator.ifemp));
                    }
                } else {
                    let joined = values.iter().map(|v| encode(v)).collect::<Vec<_>>();
                    pieces.push(named_pair(name, &joined.join(","), operator.ifemp));
                }
            } else if explode {
                for value in values {
                    pieces.push(encode(value));
                }
            } else {
                let joined = values.iter().map(|v| encode(v)).collect::<Vec<_>>();
                pieces.push(joined.join(","));
            }
        }

        if !pieces.is_empty() {
            out.push_str(operator.first);
            out.push_str(&pieces.join(operator.sep));
        }
        Ok(())
    }
}

fn parse_varspec(varspec: &str) -> (&str, Option<usize>, bool) {
    if let Some(name) = varspec.strip_suffix('*') {
        return (name, None, true);
    }
    if let Some((name, digits)) = varspec.split_once(':')
        && let Ok(n) = digits.parse::<usize>()
    {
        return (name, Some(n), false);
    }
    (varspec, None, false)
}

fn named_pair(name: &str, value: &str, ifemp: &str) -> String {
    if value.is_empty() {
        format!("{name}{ifemp}")
    } else {
        format!("{name}={value}")
    }
}

/// Percent-encodes everything outside the unreserved and reserved sets.
/// Existing percent-escapes pass through.
fn encode_reserved(input: &str) -> String {
    const RESERVED: &str = ":/?#[]@!$&'()*+,;=";
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric()
            || matches!(c, '-' | '.' | '_' | '~' | '%')
            || RESERVED.contains(c)
        {
            out.push(c);
        } else {
            out.push_str(&urlencoding::encode(&c.to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_expansion_encodes_values() {
        let url = UriTemplate::new("/calendars/{calendarId}/{eventId}.ics")
            .add_path("calendarId", "work")
            .add_path("eventId", "a b/c")
            .expand()
            .unwrap();
        assert_eq!(url, "/calendars/work/a%20b%2Fc.ics");
    }

    #[test]
    fn reserved_expansion_keeps_slashes() {
        let url = UriTemplate::new("{+href}")
            .add_path("href", "/cal/user/work/")
            .expand()
            .unwrap();
        assert_eq!(url, "/cal/user/work/");
    }

    #[test]
    fn fragment_expansion() {
        let url = UriTemplate::new("/doc{#section}")
            .add_path("section", "s/2")
            .expand()
            .unwrap();
        assert_eq!(url, "/doc#s/2");
    }

    #[test]
    fn dot_and_slash_operators() {
        let url = UriTemplate::new("/export{.format}")
            .add_path("format", "ics")
            .expand()
            .unwrap();
        assert_eq!(url, "/export.ics");

        let url = UriTemplate::new("/root{/segments*}")
            .add_path("segments", "a")
            .add_path("segments", "b")
            .expand()
            .unwrap();
        assert_eq!(url, "/root/a/b");
    }

    #[test]
    fn pipe_operator_expands_like_simple() {
        let url = UriTemplate::new("/tags/{|tag}")
            .add_path("tag", "a b")
            .expand()
            .unwrap();
        assert_eq!(url, "/tags/a%20b");
    }

    #[test]
    fn named_operators_skip_unbound_variables() {
        let with = UriTemplate::new("/cals{;color}")
            .add_path("color", "red")
            .expand()
            .unwrap();
        assert_eq!(with, "/cals;color=red");

        let without = UriTemplate::new("/cals{;color}").expand().unwrap();
        assert_eq!(without, "/cals");
    }

    #[test]
    fn form_style_query_expansion() {
        let url = UriTemplate::new("/search{?q,lang}")
            .add_path("q", "a b")
            .add_path("lang", "en")
            .expand()
            .unwrap();
        assert_eq!(url, "/search?q=a%20b&lang=en");

        let url = UriTemplate::new("/search?fixed=1{&page}")
            .add_path("page", "2")
            .expand()
            .unwrap();
        assert_eq!(url, "/search?fixed=1&page=2");
    }

    #[test]
    fn prefix_modifier_clips_by_characters() {
        let url = UriTemplate::new("/{name:3}")
            .add_path("name", "lovelace")
            .expand()
            .unwrap();
        assert_eq!(url, "/lov");
    }

    #[test]
    fn unbound_value_expression_is_an_error() {
        let err = UriTemplate::new("/calendars/{calendarId}/")
            .expand()
            .unwrap_err();
        assert!(matches!(
            err,
            DavError::MissingPathParameter { name, .. } if name == "calendarId"
        ));
    }

    #[test]
    fn query_pairs_append_after_expansion() {
        let url = UriTemplate::new("/report")
            .add_query("depth", Some("1"))
            .add_query("flag", Some(""))
            .add_query("skipped", None::<String>)
            .expand()
            .unwrap();
        assert_eq!(url, "/report?depth=1&flag");
    }

    #[test]
    fn query_separator_respects_existing_question_mark() {
        let url = UriTemplate::new("/search{?q}")
            .add_path("q", "x")
            .add_query("page", Some("2"))
            .expand()
            .unwrap();
        assert_eq!(url, "/search?q=x&page=2");
    }

    #[test]
    fn literal_templates_pass_through() {
        let url = UriTemplate::new("/principals/current/").expand().unwrap();
        assert_eq!(url, "/principals/current/");
    }

    #[test]
    fn unclosed_expression_is_rejected() {
        let err = UriTemplate::new("/broken/{oops").expand().unwrap_err();
        assert!(matches!(err, DavError::Config(_)));
    }
}
