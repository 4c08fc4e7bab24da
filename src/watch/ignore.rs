// src/watch/ignore.rs

use std::path::{Component, Path};

use crate::types::IgnoreMatch;

/// Decides which directories are left out of watch registration.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    tokens: Vec<String>,
    mode: IgnoreMatch,
}

impl IgnoreFilter {
    pub fn new<S: Into<String>>(tokens: impl IntoIterator<Item = S>, mode: IgnoreMatch) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
            mode,
        }
    }

    pub fn mode(&self) -> IgnoreMatch {
        self.mode
    }

    /// Returns true if `path` should not be registered.
    ///
    /// In segment mode `./node_modules/x` is ignored for token
    /// `node_modules`, `./my_node_modules` is not. In substring mode both are.
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.tokens.is_empty() {
            return false;
        }
        match self.mode {
            IgnoreMatch::Segment => path.components().any(|c| match c {
                Component::Normal(name) => self.tokens.iter().any(|t| name == t.as_str()),
                _ => false,
            }),
            IgnoreMatch::Substring => {
                let s = path.to_string_lossy();
                self.tokens.iter().any(|t| s.contains(t.as_str()))
            }
        }
    }
}
