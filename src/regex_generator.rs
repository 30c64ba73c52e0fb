use crate::types::RouteParams;
use crate::Error;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};

lazy_static! {
    static ref PARAM_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid param name regex");
}

const WILDCARD_PARAM: &str = "wild";

/// A route path, either a path template or a regular expression.
///
/// Path templates are made of `/`-separated segments:
///
/// * `users` matches the literal segment, case-sensitively.
/// * `:id` captures one non-empty segment as the `id` parameter.
/// * `:id?` captures an optional trailing segment. Only allowed as the last segment.
/// * `*` captures everything after it, as the `wild` parameter. `*rest` names the capture `rest`.
///   Only allowed as the last segment. The capture may be empty.
///
/// A [`Regex`] is used as given: its named capture groups become parameters and unnamed groups are ignored.
#[derive(Debug, Clone)]
pub enum Pattern {
    Path(String),
    Regex(Regex),
}

impl From<&str> for Pattern {
    fn from(path: &str) -> Self {
        Pattern::Path(path.to_owned())
    }
}

impl From<String> for Pattern {
    fn from(path: String) -> Self {
        Pattern::Path(path)
    }
}

impl From<&String> for Pattern {
    fn from(path: &String) -> Self {
        Pattern::Path(path.clone())
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

impl Pattern {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Pattern::Path(path) => path.as_str(),
            Pattern::Regex(re) => re.as_str(),
        }
    }
}

#[derive(Clone)]
enum Kind {
    Literal(String),
    Regex {
        regex: Regex,
        // (capture group index, parameter name)
        params: Vec<(usize, String)>,
    },
}

/// A compiled route pattern: the predicate plus the ordered parameter names it captures.
#[derive(Clone)]
pub(crate) struct Matcher {
    source: String,
    kind: Kind,
}

impl Matcher {
    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    /// Names of the parameters this matcher captures, in pattern order.
    pub(crate) fn param_names(&self) -> Vec<&str> {
        match &self.kind {
            Kind::Literal(_) => Vec::new(),
            Kind::Regex { params, .. } => params.iter().map(|(_, name)| name.as_str()).collect(),
        }
    }

    /// Matches a whole normalized path.
    pub(crate) fn captures(&self, path: &str) -> Option<RouteParams> {
        match &self.kind {
            Kind::Literal(lit) => (lit == path).then(RouteParams::new),
            Kind::Regex { regex, params } => regex.captures(path).map(|caps| extract(&caps, params)),
        }
    }

    /// Matches the start of a normalized path.
    ///
    /// Returns how many bytes of `path` the prefix consumed along with the captured parameters.
    pub(crate) fn prefix_captures(&self, path: &str) -> Option<(usize, RouteParams)> {
        match &self.kind {
            Kind::Literal(lit) => {
                let rest = path.strip_prefix(lit.as_str())?;
                (rest.is_empty() || rest.starts_with('/') || lit == "/").then(|| (lit.len(), RouteParams::new()))
            }
            Kind::Regex { regex, params } => {
                let caps = regex.captures(path)?;
                let m = caps.get(0)?;
                if m.start() != 0 {
                    return None;
                }

                let rest = &path[m.end()..];
                let on_boundary = m.as_str().ends_with('/') || rest.is_empty() || rest.starts_with('/');
                if !on_boundary {
                    return None;
                }

                let mut consumed = m.end();
                if consumed > 1 && m.as_str().ends_with('/') {
                    consumed -= 1;
                }

                Some((consumed, extract(&caps, params)))
            }
        }
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Literal(lit) => write!(f, "{{ source: {:?}, literal: {:?} }}", self.source, lit),
            Kind::Regex { regex, params } => write!(
                f,
                "{{ source: {:?}, regex: {:?}, params: {:?} }}",
                self.source,
                regex.as_str(),
                params.iter().map(|(_, name)| name).collect::<Vec<_>>()
            ),
        }
    }
}

fn extract(caps: &Captures<'_>, params: &[(usize, String)]) -> RouteParams {
    let mut route_params = RouteParams::with_capacity(params.len());
    for (idx, name) in params {
        if let Some(g) = caps.get(*idx) {
            route_params.set(name.clone(), g.as_str());
        }
    }
    route_params
}

enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Optional(&'a str),
    Wildcard(&'a str),
}

fn parse_segments(path: &str) -> crate::Result<Vec<Segment<'_>>> {
    if !path.starts_with('/') {
        return Err(Error::invalid_pattern(path, "must start with '/'").into());
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<&str> = trimmed[1..].split('/').collect();
    let last = raw.len() - 1;
    let mut seen = HashSet::new();
    let mut segments = Vec::with_capacity(raw.len());

    for (idx, seg) in raw.into_iter().enumerate() {
        let segment = if seg.is_empty() {
            return Err(Error::invalid_pattern(path, "empty path segment").into());
        } else if let Some(name) = seg.strip_prefix('*') {
            if idx != last {
                return Err(Error::invalid_pattern(path, "wildcard must be the last segment").into());
            }
            Segment::Wildcard(if name.is_empty() { WILDCARD_PARAM } else { name })
        } else if let Some(name) = seg.strip_prefix(':') {
            match name.strip_suffix('?') {
                Some(name) if idx != last => {
                    return Err(Error::invalid_pattern(
                        path,
                        format!("optional parameter {:?} must be the last segment", name),
                    )
                    .into())
                }
                Some(name) => Segment::Optional(name),
                None => Segment::Param(name),
            }
        } else {
            Segment::Literal(seg)
        };

        if let Segment::Param(name) | Segment::Optional(name) | Segment::Wildcard(name) = segment {
            if !PARAM_NAME_RE.is_match(name) {
                return Err(Error::invalid_pattern(path, format!("invalid parameter name {:?}", name)).into());
            }
            if !seen.insert(name) {
                return Err(Error::DuplicateParam {
                    pattern: path.to_owned(),
                    name: name.to_owned(),
                }
                .into());
            }
        }

        segments.push(segment);
    }

    Ok(segments)
}

/// Builds the regex body for a parsed path, without anchors.
fn segments_to_regex(segments: &[Segment<'_>]) -> (String, Vec<(usize, String)>) {
    let mut re = String::new();
    let mut params = Vec::new();

    for seg in segments {
        match seg {
            Segment::Literal(lit) => {
                re.push('/');
                re.push_str(&regex::escape(lit));
            }
            Segment::Param(name) => {
                re.push_str("/([^/]+)");
                params.push((params.len() + 1, (*name).to_owned()));
            }
            Segment::Optional(name) => {
                re.push_str("(?:/([^/]+))?");
                params.push((params.len() + 1, (*name).to_owned()));
            }
            Segment::Wildcard(name) => {
                // `(?s)` so encoded newlines in the tail still match.
                re.push_str("(?:/|$)((?s:.*))");
                params.push((params.len() + 1, (*name).to_owned()));
            }
        }
    }

    (re, params)
}

fn named_groups(re: &Regex) -> Vec<(usize, String)> {
    re.capture_names()
        .enumerate()
        .filter_map(|(idx, name)| name.map(|name| (idx, name.to_owned())))
        .collect()
}

fn compile_regex(path: &str, re: &str) -> crate::Result<Regex> {
    Regex::new(re).map_err(|e| Error::invalid_pattern(path, format!("could not build regex: {}", e)).into())
}

/// Compiles a route pattern into a matcher for whole request paths.
pub(crate) fn generate_exact_match_regex(pattern: &Pattern) -> crate::Result<Matcher> {
    let kind = match pattern {
        Pattern::Regex(re) => Kind::Regex {
            params: named_groups(re),
            regex: re.clone(),
        },
        Pattern::Path(path) => {
            let segments = parse_segments(path)?;
            if segments.iter().all(|seg| matches!(seg, Segment::Literal(_))) {
                Kind::Literal(crate::helpers::normalize_path(path))
            } else {
                let (body, params) = segments_to_regex(&segments);
                let regex = compile_regex(path, &format!("^{}$", body))?;
                Kind::Regex { regex, params }
            }
        }
    };

    Ok(Matcher {
        source: pattern.as_str().to_owned(),
        kind,
    })
}

/// Compiles a mount prefix. Only literal and `:name` segments are allowed.
pub(crate) fn generate_prefix_match_regex(pattern: &Pattern) -> crate::Result<Matcher> {
    let kind = match pattern {
        Pattern::Regex(re) => Kind::Regex {
            params: named_groups(re),
            regex: re.clone(),
        },
        Pattern::Path(path) => {
            let segments = parse_segments(path)?;
            if segments
                .iter()
                .any(|seg| matches!(seg, Segment::Optional(_) | Segment::Wildcard(_)))
            {
                return Err(Error::invalid_pattern(path, "mount prefixes can't have optional or wildcard segments").into());
            }

            if segments.iter().all(|seg| matches!(seg, Segment::Literal(_))) {
                Kind::Literal(crate::helpers::normalize_path(path))
            } else {
                let (body, params) = segments_to_regex(&segments);
                let regex = compile_regex(path, &format!("^{}(?:/|$)", body))?;
                Kind::Regex { regex, params }
            }
        }
    };

    Ok(Matcher {
        source: pattern.as_str().to_owned(),
        kind,
    })
}
