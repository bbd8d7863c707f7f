//! Endpoint path templates.
//!
//! A template is a path such as `/buckets/{bucket}/objects/{key+}`. `{name}`
//! is replaced by the percent-encoded parameter value; `{name+}` is greedy
//! and keeps `/` separators so a single parameter can span several segments.
//! Anything after a `?` is a literal query string that is appended to the
//! request as-is.

use relay_core::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, greedy: bool },
}

/// A parsed endpoint path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
    query: Vec<(String, String)>,
}

impl PathTemplate {
    /// Parses a template.
    ///
    /// Fails with [`ClientError::InvalidRequest`] on unbalanced braces or an
    /// empty parameter name.
    pub fn parse(template: &str) -> ClientResult<Self> {
        let (path, query) = match template.split_once('?') {
            Some((path, query)) => (path, parse_literal_query(query)),
            None => (template, Vec::new()),
        };

        let mut segments = Vec::new();
        let mut rest = path;
        while let Some(open) = rest.find('{') {
            if rest[..open].contains('}') {
                return Err(unbalanced(template));
            }
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| unbalanced(template))?;
            let token = &after[..close];
            if token.contains('{') {
                return Err(unbalanced(template));
            }

            let (name, greedy) = match token.strip_suffix('+') {
                Some(name) => (name, true),
                None => (token, false),
            };
            if name.is_empty() {
                return Err(ClientError::invalid_request(format!(
                    "path template '{template}' has an empty parameter name"
                )));
            }
            segments.push(Segment::Param {
                name: name.to_string(),
                greedy,
            });
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(unbalanced(template));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments, query })
    }

    /// Returns the parameter names in template order.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns the literal query pairs that followed `?` in the template.
    pub fn literal_query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Substitutes `params` into the template.
    ///
    /// Every parameter named by the template must be supplied; extra
    /// parameters are ignored.
    pub fn render(&self, params: &[(&str, String)]) -> ClientResult<String> {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param { name, greedy } => {
                    let value = params
                        .iter()
                        .find(|(param, _)| param == name)
                        .map(|(_, value)| value.as_str())
                        .ok_or_else(|| {
                            ClientError::invalid_request(format!(
                                "no value supplied for path parameter '{name}'"
                            ))
                        })?;
                    if *greedy {
                        let encoded = value
                            .split('/')
                            .map(|part| urlencoding::encode(part).into_owned())
                            .collect::<Vec<_>>()
                            .join("/");
                        path.push_str(&encoded);
                    } else {
                        path.push_str(&urlencoding::encode(value));
                    }
                }
            }
        }
        Ok(path)
    }
}

fn unbalanced(template: &str) -> ClientError {
    ClientError::invalid_request(format!("path template '{template}' has unbalanced braces"))
}

fn parse_literal_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
