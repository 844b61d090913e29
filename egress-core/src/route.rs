//! Route templates such as `/v1/unit/{unitId}/users/{userId}`.
//!
//! Supported parameter syntax:
//!
//! | Form          | Meaning                                   |
//! |---------------|-------------------------------------------|
//! | `{id}`        | required parameter, one path segment      |
//! | `{id?}`       | optional parameter                        |
//! | `{id=5}`      | parameter with a default value            |
//! | `{id:int}`    | constrained parameter (constraint ignored)|
//! | `{*rest}`     | catch-all, consumes the rest of the path  |

use crate::error::EgressError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParameter {
    pub name: String,
    pub default: Option<String>,
    pub optional: bool,
    pub catch_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSegment {
    Literal(String),
    Parameter(RouteParameter),
}

/// One piece of an outgoing path, matched against a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPiece<'t, 'p> {
    Literal(&'t str),
    Parameter(&'t RouteParameter, &'p str),
}

/// A parsed route template. Leading `/` is not part of the segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<RouteSegment>,
}

impl RouteTemplate {
    pub fn parse(template: &str) -> Result<Self, EgressError> {
        let body = template.trim_start_matches('/');
        let mut segments = Vec::new();
        let mut rest = body;

        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                Some(idx) if rest.as_bytes()[idx] == b'}' => {
                    return Err(EgressError::config(format!(
                        "route template '{template}': unexpected '}}'"
                    )));
                }
                Some(idx) => {
                    if idx > 0 {
                        segments.push(RouteSegment::Literal(rest[..idx].to_string()));
                    }
                    let after = &rest[idx + 1..];
                    let close = after.find('}').ok_or_else(|| {
                        EgressError::config(format!("route template '{template}': unclosed '{{'"))
                    })?;
                    segments.push(RouteSegment::Parameter(parse_parameter(
                        &after[..close],
                        template,
                    )?));
                    rest = &after[close + 1..];
                }
                None => {
                    segments.push(RouteSegment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    pub fn parameters(&self) -> impl Iterator<Item = &RouteParameter> {
        self.segments.iter().filter_map(|s| match s {
            RouteSegment::Parameter(p) => Some(p),
            RouteSegment::Literal(_) => None,
        })
    }

    /// Walk `path` alongside the template, reporting literal text and the
    /// value found for each parameter. Missing values fall back to the
    /// parameter default, or to an empty string.
    pub fn walk<'t, 'p>(&'t self, path: &'p str, mut visit: impl FnMut(PathPiece<'t, 'p>))
    where
        't: 'p,
    {
        let path = path.trim_start_matches('/');
        let mut pos = 0usize;

        for segment in &self.segments {
            match segment {
                RouteSegment::Literal(lit) => {
                    visit(PathPiece::Literal(lit));
                    pos = advance(path, pos, lit.len());
                }
                RouteSegment::Parameter(param) => {
                    let end = if param.catch_all {
                        path.len()
                    } else {
                        path[pos..].find('/').map_or(path.len(), |i| pos + i)
                    };
                    let value = &path[pos..end];
                    pos = end;
                    let value = match (value.is_empty(), param.default.as_deref()) {
                        (true, Some(default)) => default,
                        _ => value,
                    };
                    visit(PathPiece::Parameter(param, value));
                }
            }
        }
    }
}

fn parse_parameter(inner: &str, template: &str) -> Result<RouteParameter, EgressError> {
    let (catch_all, inner) = match inner.strip_prefix("**").or_else(|| inner.strip_prefix('*')) {
        Some(stripped) => (true, stripped),
        None => (false, inner),
    };

    let name_end = inner.find([':', '=', '?']).unwrap_or(inner.len());
    let name = &inner[..name_end];
    if name.is_empty() {
        return Err(EgressError::config(format!(
            "route template '{template}': empty parameter name"
        )));
    }

    let tail = &inner[name_end..];
    let optional = tail.ends_with('?');
    let default = tail
        .find('=')
        .map(|i| tail[i + 1..].trim_end_matches('?').to_string());

    Ok(RouteParameter {
        name: name.to_string(),
        default,
        optional,
        catch_all,
    })
}

fn advance(path: &str, pos: usize, by: usize) -> usize {
    let mut next = (pos + by).min(path.len());
    while !path.is_char_boundary(next) {
        next += 1;
    }
    next
}
