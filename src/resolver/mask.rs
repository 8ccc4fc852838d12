//! Resource masks
//!
//! A mask is three independent patterns: resource type, path, and content
//! type. A resource matches when all three match; the content pattern is
//! not consulted for resources without a content type.

use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::domain::Resource;

use super::ResolveError;

/// A single text pattern
///
/// Pattern syntax:
/// - `*` matches anything
/// - `*suffix` matches text ending with `suffix`
/// - `prefix*` matches text starting with `prefix`
/// - `re:<regex>` matches when the regular expression matches the whole text
/// - anything else matches exactly
#[derive(Debug, Clone)]
pub enum Pattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Regex(Regex),
}

impl Pattern {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(exact) => text == exact,
            Pattern::Prefix(prefix) => text.starts_with(prefix.as_str()),
            Pattern::Suffix(suffix) => text.ends_with(suffix.as_str()),
            Pattern::Regex(re) => re.is_match(text),
        }
    }
}

impl FromStr for Pattern {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(Pattern::Any);
        }
        if let Some(re) = s.strip_prefix("re:") {
            let anchored = format!("^(?:{})$", re);
            return Regex::new(&anchored)
                .map(Pattern::Regex)
                .map_err(|e| ResolveError::InvalidPattern {
                    pattern: s.to_string(),
                    message: e.to_string(),
                });
        }
        if let Some(suffix) = s.strip_prefix('*') {
            if !suffix.contains('*') {
                return Ok(Pattern::Suffix(suffix.to_string()));
            }
        }
        if let Some(prefix) = s.strip_suffix('*') {
            if !prefix.contains('*') {
                return Ok(Pattern::Prefix(prefix.to_string()));
            }
        }
        if s.contains('*') {
            return Err(ResolveError::InvalidPattern {
                pattern: s.to_string(),
                message: "only a leading or a trailing '*' is supported".to_string(),
            });
        }
        Ok(Pattern::Exact(s.to_string()))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => write!(f, "*"),
            Pattern::Exact(exact) => write!(f, "{}", exact),
            Pattern::Prefix(prefix) => write!(f, "{}*", prefix),
            Pattern::Suffix(suffix) => write!(f, "*{}", suffix),
            Pattern::Regex(re) => {
                let inner = re.as_str();
                let inner = inner
                    .strip_prefix("^(?:")
                    .and_then(|s| s.strip_suffix(")$"))
                    .unwrap_or(inner);
                write!(f, "re:{}", inner)
            }
        }
    }
}

/// Type/path/content pattern triple
#[derive(Debug, Clone)]
pub struct ResourceMask {
    pub resource_type: Pattern,
    pub path: Pattern,
    pub content: Pattern,
}

impl ResourceMask {
    pub fn new(resource_type: Pattern, path: Pattern, content: Pattern) -> Self {
        Self {
            resource_type,
            path,
            content,
        }
    }

    /// Builds a mask from pattern strings
    pub fn parse(resource_type: &str, path: &str, content: &str) -> Result<Self, ResolveError> {
        Ok(Self::new(resource_type.parse()?, path.parse()?, content.parse()?))
    }

    /// A mask on type and path that accepts any content
    pub fn of(resource_type: &str, path: &str) -> Result<Self, ResolveError> {
        Self::parse(resource_type, path, "*")
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        let content_matches = match &resource.content_type {
            Some(content) => self.content.matches(content),
            None => true,
        };
        content_matches
            && self.resource_type.matches(resource.resource_type())
            && self.path.matches(&resource.path().to_string())
    }
}

impl fmt::Display for ResourceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.resource_type, self.path, self.content)
    }
}
