// src/engine/rules.rs

use crate::config::{CommandConfig, ConfigFile, RuleConfig};
use crate::errors::Result;
use crate::watch::patterns::PatternSet;

/// A rule with its patterns compiled, remembering its configuration index.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    index: usize,
    patterns: PatternSet,
    commands: Vec<CommandConfig>,
}

impl CompiledRule {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn commands(&self) -> &[CommandConfig] {
        &self.commands
    }

    /// Index of the first matching pattern, if any.
    pub fn first_match(&self, rel_path: &str) -> Option<usize> {
        self.patterns.first_match(rel_path)
    }
}

/// Ordered, compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::from_rules(cfg.rules())
    }

    pub fn from_rules(rules: &[RuleConfig]) -> Result<Self> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                Ok(CompiledRule {
                    index,
                    patterns: PatternSet::compile(&rule.patterns)?,
                    commands: rule.commands.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if at least one rule would fire for this path.
    pub fn is_relevant(&self, rel_path: &str) -> bool {
        self.rules.iter().any(|r| r.first_match(rel_path).is_some())
    }
}
