use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How `ignore_dirs` tokens are compared against directory paths.
///
/// - `Segment`: a directory is ignored when one of its path components is
///   exactly equal to a token (default).
/// - `Substring`: a directory is ignored when its path string contains a
///   token anywhere. Ignoring `git` this way also ignores `digit/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IgnoreMatch {
    #[default]
    Segment,
    Substring,
}

impl FromStr for IgnoreMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "segment" => Ok(IgnoreMatch::Segment),
            "substring" => Ok(IgnoreMatch::Substring),
            other => Err(format!(
                "invalid ignore_match: {other} (expected \"segment\" or \"substring\")"
            )),
        }
    }
}

impl fmt::Display for IgnoreMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreMatch::Segment => f.write_str("segment"),
            IgnoreMatch::Substring => f.write_str("substring"),
        }
    }
}
