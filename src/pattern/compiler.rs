use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::captures::{CaptureKey, Captures};
use super::match_types::{MatchTypeSnapshot, DEFAULT_TAG};
use crate::error::RouteError;

/// A `{…}` placeholder of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Capture name; `None` for anonymous captures (`{}` / `{:TYPE}`)
    pub name: Option<Arc<str>>,
    /// Ordinal among all captures of the template
    pub index: usize,
    /// Regular expression fragment the value must satisfy
    pub rule: String,
    /// `true` for `{name?}` captures
    pub optional: bool,
    /// `/` or `.` absorbed from the preceding literal into the optional group
    pub separator: Option<char>,
    /// Placeholder text exactly as written, e.g. `{id:INT}`
    pub raw: String,
    group: String,
}

impl Capture {
    /// Key the captured value is stored under.
    #[must_use]
    pub fn key(&self) -> CaptureKey {
        match &self.name {
            Some(name) => CaptureKey::Name(Arc::clone(name)),
            None => CaptureKey::Position(self.index),
        }
    }
}

/// One element of a compiled template, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Capture(Capture),
}

/// Immutable result of compiling a template.
///
/// The anchored regex and the token list describe the same template: the
/// regex is used for matching, the tokens for reverse routing.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    tokens: Vec<Token>,
    regex: Regex,
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
            && self.tokens == other.tokens
            && self.regex.as_str() == other.regex.as_str()
    }
}

impl Eq for CompiledPattern {}

impl CompiledPattern {
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Capture tokens in source order.
    pub fn captures(&self) -> impl Iterator<Item = &Capture> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Capture(capture) => Some(capture),
            Token::Literal(_) => None,
        })
    }

    /// Test `path` against the pattern.
    ///
    /// Returns `None` on any mismatch; optional captures that did not take
    /// part in the match are left out of the result.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Captures> {
        let caps = self.regex.captures(path)?;
        let mut out = Captures::new();
        for capture in self.captures() {
            if let Some(value) = caps.name(&capture.group) {
                out.push(capture.key(), value.as_str().to_string());
            }
        }
        Some(out)
    }
}

/// Compile `template` against a registry snapshot.
///
/// `filters` override the rule of individual named captures and take
/// precedence over the capture's declared type.
///
/// # Errors
///
/// Returns [`RouteError::Compile`] for unbalanced or nested braces, invalid
/// or duplicate capture names, a misplaced `?`, and rules that do not form a
/// valid regular expression.
pub fn compile(
    template: &str,
    types: &MatchTypeSnapshot,
    filters: &[(String, String)],
) -> Result<CompiledPattern, RouteError> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut index = 0usize;
    let mut pos = 0usize;
    let mut literal_start = 0usize;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => {
                literal.push_str(&template[literal_start..pos]);
                let close = find_close(template, pos)?;
                let body = &template[pos + 1..close];
                let spec = parse_body(template, pos, body)?;

                if let Some(name) = spec.name {
                    if !seen.insert(name) {
                        return Err(RouteError::compile(
                            template,
                            Some(pos),
                            format!("duplicate capture name '{name}'"),
                        ));
                    }
                }

                let separator = if spec.optional {
                    match literal.chars().last() {
                        Some(sep @ ('/' | '.')) => {
                            literal.pop();
                            Some(sep)
                        }
                        _ => None,
                    }
                } else {
                    None
                };
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }

                let rule = spec
                    .name
                    .and_then(|name| filters.iter().find(|(k, _)| k == name))
                    .map(|(_, rule)| rule.as_str())
                    .unwrap_or_else(|| types.rule_for(spec.tag.unwrap_or(DEFAULT_TAG)));

                tokens.push(Token::Capture(Capture {
                    name: spec.name.map(Arc::from),
                    index,
                    rule: rule.to_string(),
                    optional: spec.optional,
                    separator,
                    raw: template[pos..=close].to_string(),
                    group: format!("th_cap_{index}"),
                }));
                index += 1;
                pos = close + 1;
                literal_start = pos;
            }
            b'}' => {
                return Err(RouteError::compile(template, Some(pos), "unmatched '}'"));
            }
            _ => pos += 1,
        }
    }
    literal.push_str(&template[literal_start..]);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    let source = to_regex_source(&tokens);
    let regex =
        Regex::new(&source).map_err(|e| RouteError::compile(template, None, e.to_string()))?;
    debug!(template = %template, regex = %source, captures = index, "Template compiled");

    Ok(CompiledPattern {
        template: template.to_string(),
        tokens,
        regex,
    })
}

struct CaptureSpec<'a> {
    name: Option<&'a str>,
    tag: Option<&'a str>,
    optional: bool,
}

fn find_close(template: &str, open: usize) -> Result<usize, RouteError> {
    for (offset, byte) in template.as_bytes()[open + 1..].iter().enumerate() {
        match byte {
            b'}' => return Ok(open + 1 + offset),
            b'{' => {
                return Err(RouteError::compile(
                    template,
                    Some(open + 1 + offset),
                    "nested '{' inside a capture",
                ))
            }
            _ => {}
        }
    }
    Err(RouteError::compile(template, Some(open), "unclosed capture"))
}

fn parse_body<'a>(template: &str, open: usize, body: &'a str) -> Result<CaptureSpec<'a>, RouteError> {
    let (body, optional) = match body.strip_suffix('?') {
        Some(stripped) => (stripped, true),
        None => (body, false),
    };
    if let Some(offset) = body.find('?') {
        return Err(RouteError::compile(
            template,
            Some(open + 1 + offset),
            "'?' must be the last character of a capture",
        ));
    }

    let (name, tag) = match body.split_once(':') {
        Some((name, tag)) => (name, Some(tag).filter(|t| !t.is_empty())),
        None => (body, None),
    };
    if !name.is_empty() && !is_valid_name(name) {
        return Err(RouteError::compile(
            template,
            Some(open + 1),
            format!("invalid capture name '{name}'"),
        ));
    }

    Ok(CaptureSpec {
        name: Some(name).filter(|n| !n.is_empty()),
        tag,
        optional,
    })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn to_regex_source(tokens: &[Token]) -> String {
    let mut source = String::from("^");
    for token in tokens {
        match token {
            Token::Literal(text) => source.push_str(&regex::escape(text)),
            Token::Capture(capture) => {
                let group = format!("(?P<{}>{})", capture.group, capture.rule);
                if capture.optional {
                    source.push_str("(?:");
                    if let Some(sep) = capture.separator {
                        source.push_str(&regex::escape(sep.encode_utf8(&mut [0; 4])));
                    }
                    source.push_str(&group);
                    source.push_str(")?");
                } else {
                    source.push_str(&group);
                }
            }
        }
    }
    source.push('$');
    source
}
