// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::errors::{DevloopError, Result};

/// A single compiled rule pattern.
///
/// Two syntaxes are accepted:
///
/// - Globs, evaluated against root-relative paths with forward slashes.
///   `*` stays inside one path segment, `**` spans any number of segments
///   (including none), so `**/*.go` matches both `main.go` and `pkg/foo.go`
///   while `*.go` only matches files at the root.
/// - Extension lists: a bare token or comma-separated tokens without any
///   glob syntax (`go`, `.rs`, `js,css,html`). These match, at any depth,
///   when the path's extension equals a token or its file name is exactly
///   a token. So `Makefile` matches `Makefile` and `docs/Makefile`, and
///   `go` matches `main.go`.
#[derive(Clone)]
pub enum Pattern {
    Glob { source: String, matcher: GlobMatcher },
    Extensions(Vec<String>),
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Glob { source, .. } => f.debug_tuple("Glob").field(source).finish(),
            Pattern::Extensions(exts) => f.debug_tuple("Extensions").field(exts).finish(),
        }
    }
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(DevloopError::ConfigError("empty pattern".to_string()));
        }

        if let Some(exts) = parse_extension_list(trimmed) {
            return Ok(Pattern::Extensions(exts));
        }

        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|source| DevloopError::InvalidPattern {
                pattern: trimmed.to_string(),
                source,
            })?;

        Ok(Pattern::Glob {
            source: trimmed.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Returns true if `rel_path` (relative to a watch root, forward
    /// slashes) matches. An empty path never matches.
    pub fn matches(&self, rel_path: &str) -> bool {
        if rel_path.is_empty() {
            return false;
        }
        match self {
            Pattern::Glob { matcher, .. } => matcher.is_match(rel_path),
            Pattern::Extensions(exts) => {
                let path = Path::new(rel_path);
                let ext = path.extension();
                let name = path.file_name();
                exts.iter().any(|e| {
                    ext.is_some_and(|x| x == e.as_str()) || name.is_some_and(|n| n == e.as_str())
                })
            }
        }
    }

    pub fn as_str(&self) -> String {
        match self {
            Pattern::Glob { source, .. } => source.clone(),
            Pattern::Extensions(exts) => exts.join(","),
        }
    }
}

/// One-off match of `path` against an uncompiled `pattern`.
///
/// Invalid patterns never match. Hot paths should compile once with
/// [`Pattern::parse`] instead.
pub fn matches(path: &str, pattern: &str) -> bool {
    match Pattern::parse(pattern) {
        Ok(p) => p.matches(path),
        Err(err) => {
            debug!(pattern, error = %err, "pattern did not compile; treating as no match");
            false
        }
    }
}

/// Ordered list of compiled patterns belonging to one rule.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|s| Pattern::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Index of the first pattern that matches, short-circuiting.
    pub fn first_match(&self, rel_path: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.matches(rel_path))
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.first_match(rel_path).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

/// `Some(tokens)` when `s` is an extension list like `go`, `.rs` or
/// `js, css,html`; `None` when it should be treated as a glob.
fn parse_extension_list(s: &str) -> Option<Vec<String>> {
    let mut exts = Vec::new();
    for token in s.split(',') {
        let token = token.trim();
        let token = token.strip_prefix('.').unwrap_or(token);
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        exts.push(token.to_string());
    }
    Some(exts)
}
