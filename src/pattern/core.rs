use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::RouterError;
use crate::params::Params;

/// Constraint applied to a parameter written without one: a single non-empty segment.
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

#[allow(clippy::expect_used)]
static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid parameter-name regex"));

/// One `/`-delimited component of an expanded pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Matched by string equality (an empty literal is a trailing slash)
    Literal(String),
    /// A whole segment bound to one parameter: `{id}` or `{id:\d+}`
    Parameter {
        name: Arc<str>,
        /// The constraint as written, `None` for the default
        constraint: Option<String>,
        regex: Regex,
    },
    /// Literal text and parameters sharing one segment: `file-{name}.{ext}`
    Mixed {
        source: String,
        names: Vec<Arc<str>>,
        regex: Regex,
    },
}

impl Segment {
    fn matches(&self, value: &str, params: &mut Params) -> bool {
        match self {
            Segment::Literal(text) => text == value,
            Segment::Parameter { name, regex, .. } => match regex.captures(value) {
                Some(caps) => {
                    let captured = caps.name(name).map_or("", |m| m.as_str());
                    params.push(Arc::clone(name), captured.to_string());
                    true
                }
                None => false,
            },
            Segment::Mixed { names, regex, .. } => match regex.captures(value) {
                Some(caps) => {
                    for name in names {
                        let captured = caps.name(name).map_or("", |m| m.as_str());
                        params.push(Arc::clone(name), captured.to_string());
                    }
                    true
                }
                None => false,
            },
        }
    }

    /// True when this segment binds no parameters.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }
}

/// One fully expanded form of a pattern: the required part plus zero or more
/// of its optional suffixes.
#[derive(Debug, Clone)]
pub struct Alternative {
    segments: Vec<Segment>,
    param_names: Vec<Arc<str>>,
}

impl Alternative {
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameters present in this alternative, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.param_names.iter().map(|n| n.as_ref())
    }

    fn match_segments(&self, path_segments: &[&str]) -> Option<Params> {
        if self.segments.len() != path_segments.len() {
            return None;
        }
        let mut params = Params::new();
        for (segment, value) in self.segments.iter().zip(path_segments) {
            if !segment.matches(value, &mut params) {
                return None;
            }
        }
        Some(params)
    }
}

/// Immutable compiled form of a route pattern.
///
/// Optional suffixes are expanded at compile time into [`Alternative`]s,
/// shortest first, so matching is a flat per-segment test with no backtracking.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    alternatives: Vec<Alternative>,
    param_names: Vec<Arc<str>>,
}

impl RoutePattern {
    /// Compile a pattern string. See [`compile`].
    pub fn compile(pattern: &str) -> Result<Self, RouterError> {
        compile(pattern)
    }

    /// The pattern exactly as registered.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    /// Every parameter the pattern declares, optional ones included.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.param_names.iter().map(|n| n.as_ref())
    }

    /// True when no alternative binds a parameter.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.param_names.is_empty()
    }

    /// Segment counts of the alternatives, shortest first.
    pub fn segment_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.alternatives.iter().map(|a| a.segments.len())
    }

    /// Match an already split, already decoded path.
    ///
    /// Alternatives are tried shortest first; the first that matches wins.
    #[must_use]
    pub fn match_segments(&self, path_segments: &[&str]) -> Option<Params> {
        self.alternatives
            .iter()
            .find_map(|alt| alt.match_segments(path_segments))
    }

    /// Split a decoded path on `/` and match it.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let segments: Vec<&str> = path.split('/').collect();
        self.match_segments(&segments)
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn syntax_error(pattern: &str, reason: impl Into<String>) -> RouterError {
    RouterError::PatternSyntax {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

/// Compile a route pattern into its matchable form.
///
/// Grammar: `/`-delimited segments; a segment is literal text, a parameter
/// `{name}` / `{name:constraint}`, or a mix of both. The pattern may end in a
/// bracketed optional suffix `[...]`, which may itself end in a nested one.
///
/// # Errors
///
/// [`RouterError::PatternSyntax`] when an optional marker is not well nested
/// or not at the end, a parameter lacks its closing `}`, a parameter name is
/// empty, malformed or duplicated, or a constraint is not a valid regex.
pub fn compile(pattern: &str) -> Result<RoutePattern, RouterError> {
    let parts = split_optional_parts(pattern)?;

    // Every alternative is a prefix of the longest, so the longest one
    // declares every parameter the pattern has.
    let full: String = parts.concat();
    let mut seen = HashSet::new();
    let mut param_names = Vec::new();
    for segment in split_segments(&full) {
        for piece in parse_segment(pattern, segment)? {
            if let Piece::Param { name, .. } = piece {
                if !seen.insert(name) {
                    return Err(syntax_error(
                        pattern,
                        format!("parameter '{name}' is declared more than once"),
                    ));
                }
                param_names.push(Arc::<str>::from(name));
            }
        }
    }

    let mut alternatives = Vec::with_capacity(parts.len());
    let mut text = String::with_capacity(full.len());
    for part in &parts {
        text.push_str(part);
        alternatives.push(build_alternative(pattern, &text, &param_names)?);
    }

    Ok(RoutePattern {
        source: pattern.to_string(),
        alternatives,
        param_names,
    })
}

/// Split `/a[/b[/c]]` into `["/a", "/b", "/c"]`, validating bracket placement.
///
/// Brackets inside `{...}` belong to a constraint regex and are ignored here.
fn split_optional_parts(pattern: &str) -> Result<Vec<&str>, RouterError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut opened = 0usize;
    let mut closed = 0usize;
    let mut start = 0usize;
    let mut closing = false;

    for (i, ch) in pattern.char_indices() {
        if closing && !(depth == 0 && ch == ']') {
            return Err(syntax_error(
                pattern,
                "optional segments can only occur at the end of a route",
            ));
        }
        match ch {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Err(syntax_error(pattern, format!("unmatched '}}' at offset {i}")));
                }
                depth -= 1;
            }
            '[' if depth == 0 => {
                parts.push(&pattern[start..i]);
                start = i + 1;
                opened += 1;
            }
            ']' if depth == 0 => {
                if closed == opened {
                    return Err(syntax_error(pattern, format!("unmatched ']' at offset {i}")));
                }
                if !closing {
                    parts.push(&pattern[start..i]);
                    closing = true;
                }
                closed += 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(syntax_error(pattern, "parameter is missing its closing '}'"));
    }
    if opened != closed {
        return Err(syntax_error(pattern, "optional segment is missing its closing ']'"));
    }
    if !closing {
        parts.push(&pattern[start..]);
    }
    if parts.iter().skip(1).any(|p| p.is_empty()) {
        return Err(syntax_error(pattern, "empty optional segment"));
    }
    Ok(parts)
}

/// Split on `/` outside of `{...}`.
fn split_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&text[start..]);
    segments
}

enum Piece<'a> {
    Literal(&'a str),
    Param {
        name: &'a str,
        constraint: Option<&'a str>,
    },
}

fn parse_segment<'a>(pattern: &str, segment: &'a str) -> Result<Vec<Piece<'a>>, RouterError> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in segment.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    if i > start {
                        pieces.push(Piece::Literal(&segment[start..i]));
                    }
                    start = i + 1;
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    pieces.push(parse_param(pattern, &segment[start..i])?);
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(syntax_error(pattern, "parameter is missing its closing '}'"));
    }
    if start < segment.len() {
        pieces.push(Piece::Literal(&segment[start..]));
    }
    Ok(pieces)
}

fn parse_param<'a>(pattern: &str, body: &'a str) -> Result<Piece<'a>, RouterError> {
    let (name, constraint) = match body.split_once(':') {
        Some((name, constraint)) => (name.trim(), Some(constraint.trim())),
        None => (body.trim(), None),
    };
    if name.is_empty() {
        return Err(syntax_error(pattern, "parameter name is empty"));
    }
    if !PARAM_NAME.is_match(name) {
        return Err(syntax_error(pattern, format!("invalid parameter name '{name}'")));
    }
    if constraint == Some("") {
        return Err(syntax_error(
            pattern,
            format!("parameter '{name}' has an empty constraint"),
        ));
    }
    Ok(Piece::Param { name, constraint })
}

fn build_alternative(
    pattern: &str,
    text: &str,
    all_names: &[Arc<str>],
) -> Result<Alternative, RouterError> {
    let mut segments = Vec::new();
    let mut param_names = Vec::new();

    // Reuse the Arc<str> names allocated for the whole pattern.
    let shared = |name: &str| -> Arc<str> {
        all_names
            .iter()
            .find(|n| n.as_ref() == name)
            .map_or_else(|| Arc::from(name), Arc::clone)
    };

    for segment in split_segments(text) {
        let pieces = parse_segment(pattern, segment)?;
        let compiled = match pieces.as_slice() {
            [] => Segment::Literal(String::new()),
            [Piece::Literal(lit)] => Segment::Literal((*lit).to_string()),
            [Piece::Param { name, constraint }] => {
                let source = format!(
                    "^(?P<{name}>{})$",
                    constraint.unwrap_or(DEFAULT_CONSTRAINT)
                );
                let name = shared(name);
                param_names.push(Arc::clone(&name));
                Segment::Parameter {
                    regex: compile_regex(pattern, &name, &source)?,
                    name,
                    constraint: constraint.map(str::to_string),
                }
            }
            mixed => {
                let mut source = String::from("^");
                let mut names = Vec::new();
                for piece in mixed {
                    match piece {
                        Piece::Literal(lit) => source.push_str(&regex::escape(lit)),
                        Piece::Param { name, constraint } => {
                            source.push_str("(?P<");
                            source.push_str(name);
                            source.push('>');
                            source.push_str(constraint.unwrap_or(DEFAULT_CONSTRAINT));
                            source.push(')');
                            names.push(shared(name));
                        }
                    }
                }
                source.push('$');
                let label = names.first().map_or("", |n| n.as_ref()).to_string();
                param_names.extend(names.iter().cloned());
                Segment::Mixed {
                    source: segment.to_string(),
                    regex: compile_regex(pattern, &label, &source)?,
                    names,
                }
            }
        };
        segments.push(compiled);
    }

    Ok(Alternative {
        segments,
        param_names,
    })
}

fn compile_regex(pattern: &str, name: &str, source: &str) -> Result<Regex, RouterError> {
    Regex::new(source).map_err(|e| {
        syntax_error(
            pattern,
            format!("invalid constraint for parameter '{name}': {e}"),
        )
    })
}
