//! Risk levels, operation categories, and risk patterns
//!
//! Categories and risk levels are fixed closed vocabularies shared between
//! the config schema and the engines.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{RouterError, RouterResult};
use crate::routing::matcher::KeywordMatcher;

/// Severity of an operation; ordering is low < medium < high < critical
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Category of an operation an expert is about to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationCategory {
    FileRead,
    FileWrite,
    FileDelete,
    ShellExecute,
    NetworkCall,
    CredentialAccess,
    /// Wildcard for text-only patterns
    Any,
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationCategory::FileRead => "file-read",
            OperationCategory::FileWrite => "file-write",
            OperationCategory::FileDelete => "file-delete",
            OperationCategory::ShellExecute => "shell-execute",
            OperationCategory::NetworkCall => "network-call",
            OperationCategory::CredentialAccess => "credential-access",
            OperationCategory::Any => "any",
        };
        f.write_str(s)
    }
}

/// Description of an operation submitted to the permission gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// What kind of action this is
    pub category: OperationCategory,
    /// Free-text detail (e.g. the shell command or file path)
    pub detail: String,
}

impl Operation {
    /// Create an operation description
    pub fn new(category: OperationCategory, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
        }
    }
}

/// A pattern that flags operation descriptions with a risk level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPattern {
    /// Unique id (fixed string for built-ins, uuid for user patterns)
    pub id: String,

    /// Human-readable name, surfaced in deny reasons and prompts
    pub name: String,

    /// Detail matcher; an empty keyword list matches any detail
    /// (category-only pattern)
    #[serde(flatten)]
    pub matcher: KeywordMatcher,

    /// Severity assigned when this pattern matches
    pub risk_level: RiskLevel,

    /// Category this pattern covers; `Any` makes it text-only
    pub category: OperationCategory,

    /// Disabled patterns never contribute to classification
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether this pattern shipped with the crate
    #[serde(default)]
    pub built_in: bool,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RiskPattern {
    /// Create a user pattern with a fresh uuid
    pub fn new(
        name: impl Into<String>,
        matcher: KeywordMatcher,
        risk_level: RiskLevel,
        category: OperationCategory,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            matcher,
            risk_level,
            category,
            enabled: true,
            built_in: false,
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject patterns that would match every operation
    ///
    /// A pattern must constrain at least one axis: either a non-`Any`
    /// category or a non-empty detail matcher.
    pub fn validate(&self) -> RouterResult<()> {
        if self.category == OperationCategory::Any && self.matcher.is_empty() {
            return Err(RouterError::invalid_config(format!(
                "risk pattern '{}' has category 'any' and no keywords; it would match everything",
                self.name
            )));
        }
        Ok(())
    }

    fn built_in(
        id: &str,
        name: &str,
        matcher: KeywordMatcher,
        risk_level: RiskLevel,
        category: OperationCategory,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            matcher,
            risk_level,
            category,
            enabled: true,
            built_in: true,
            description: None,
        }
    }
}

/// Built-in default risk patterns
pub fn default_patterns() -> Vec<RiskPattern> {
    vec![
        RiskPattern::built_in(
            "builtin-recursive-delete",
            "Recursive delete",
            KeywordMatcher::regex(r"rm\s+-[a-z]*[rf][a-z]*[rf]"),
            RiskLevel::Critical,
            OperationCategory::FileDelete,
        ),
        RiskPattern::built_in(
            "builtin-file-delete",
            "File deletion",
            KeywordMatcher::contains(&[]),
            RiskLevel::High,
            OperationCategory::FileDelete,
        ),
        RiskPattern::built_in(
            "builtin-credentials",
            "Credential access",
            KeywordMatcher::contains(&[".env", "id_rsa", "credentials", "secret", "token"]),
            RiskLevel::Critical,
            OperationCategory::CredentialAccess,
        ),
        RiskPattern::built_in(
            "builtin-privileged-shell",
            "Privileged shell command",
            KeywordMatcher::contains(&["sudo ", "chmod 777", "mkfs"]),
            RiskLevel::High,
            OperationCategory::ShellExecute,
        ),
        RiskPattern::built_in(
            "builtin-shell-execute",
            "Shell execution",
            KeywordMatcher::contains(&[]),
            RiskLevel::Medium,
            OperationCategory::ShellExecute,
        ),
        RiskPattern::built_in(
            "builtin-pipe-to-shell",
            "Remote script piped to shell",
            KeywordMatcher::regex(r"(curl|wget).*\|\s*(ba|z)?sh"),
            RiskLevel::High,
            OperationCategory::NetworkCall,
        ),
        RiskPattern::built_in(
            "builtin-network-call",
            "Outbound network call",
            KeywordMatcher::contains(&[]),
            RiskLevel::Medium,
            OperationCategory::NetworkCall,
        ),
        RiskPattern::built_in(
            "builtin-file-write",
            "File write",
            KeywordMatcher::contains(&[]),
            RiskLevel::Low,
            OperationCategory::FileWrite,
        ),
    ]
}
