//! Permission configuration: actions, override rules, and policy tables
//!
//! Like the keyword config, `PermissionConfig` is a copy-on-write value;
//! mutations return a new config for the caller to persist. The risk-level
//! action and timeout tables live in `RiskPolicy` as injectable data so
//! deployments can retune thresholds without touching engine logic.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{RouterError, RouterResult};
use crate::permissions::patterns::{OperationCategory, RiskPattern, RiskLevel, default_patterns};

/// Current schema version for persisted permission configs
pub const PERMISSION_CONFIG_VERSION: u32 = 1;

/// What to do with an operation once classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Proceed without asking
    Allow,
    /// Hold for human confirmation
    RequireConfirmation,
    /// Refuse outright
    Deny,
}

/// What a permission rule's override applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RuleTarget {
    /// Override for operations matching a specific risk pattern
    Pattern(String),
    /// Override for all operations in a category
    Category(OperationCategory),
}

/// A user override of the default action for a pattern or category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRule {
    /// Unique id
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Pattern or category this rule overrides
    pub target: RuleTarget,

    /// Action taken instead of the risk-level default
    pub action: PermissionAction,

    /// Disabled rules are skipped during resolution
    pub enabled: bool,

    /// When the rule was created
    pub created_at: DateTime<Utc>,

    /// When the rule was last updated
    pub updated_at: DateTime<Utc>,
}

impl PermissionRule {
    /// Create an enabled override rule with a fresh uuid
    pub fn new(name: impl Into<String>, target: RuleTarget, action: PermissionAction) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            target,
            action,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this rule covers any of the matched patterns or the category
    pub fn applies_to(&self, matched: &[RiskPattern], category: OperationCategory) -> bool {
        match &self.target {
            RuleTarget::Pattern(pattern_id) => matched.iter().any(|p| &p.id == pattern_id),
            RuleTarget::Category(cat) => *cat == category,
        }
    }
}

/// Partial update for a permission rule; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct PermissionRuleUpdate {
    pub name: Option<String>,
    pub target: Option<RuleTarget>,
    pub action: Option<PermissionAction>,
    pub enabled: Option<bool>,
}

/// Risk-level policy tables: default actions, grant timeouts, response
/// timeouts
///
/// This is configuration data, not code. The gate takes a policy at
/// construction; the defaults below apply when a level has no entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Default action per risk level
    #[serde(default)]
    pub default_actions: HashMap<RiskLevel, PermissionAction>,

    /// How long a session grant stays valid, per risk level (seconds);
    /// levels without an entry fall back to the config's
    /// `permission_timeout`
    #[serde(default)]
    pub grant_timeouts: HashMap<RiskLevel, u64>,

    /// How long a pending request waits for a human answer, per risk level
    /// (seconds)
    #[serde(default)]
    pub response_timeouts: HashMap<RiskLevel, u64>,

    /// Response timeout when no per-level entry exists (seconds)
    pub default_response_timeout: u64,
}

impl RiskPolicy {
    /// Default action for a classified risk level
    pub fn default_action(&self, level: RiskLevel) -> PermissionAction {
        if let Some(action) = self.default_actions.get(&level) {
            return *action;
        }
        match level {
            RiskLevel::Low => PermissionAction::Allow,
            RiskLevel::Medium | RiskLevel::High | RiskLevel::Critical => {
                PermissionAction::RequireConfirmation
            }
        }
    }

    /// Session-grant lifetime for a risk level, if one is defined
    pub fn grant_timeout(&self, level: RiskLevel) -> Option<Duration> {
        self.grant_timeouts.get(&level).map(|s| Duration::from_secs(*s))
    }

    /// How long to wait for a human decision at this risk level
    pub fn response_timeout(&self, level: Option<RiskLevel>) -> Duration {
        let secs = level
            .and_then(|l| self.response_timeouts.get(&l).copied())
            .unwrap_or(self.default_response_timeout);
        Duration::from_secs(secs)
    }

    /// Override the default action for a level
    pub fn with_action(mut self, level: RiskLevel, action: PermissionAction) -> Self {
        self.default_actions.insert(level, action);
        self
    }

    /// Override the grant timeout for a level (seconds)
    pub fn with_grant_timeout(mut self, level: RiskLevel, secs: u64) -> Self {
        self.grant_timeouts.insert(level, secs);
        self
    }

    /// Override the response timeout for a level (seconds)
    pub fn with_response_timeout(mut self, level: RiskLevel, secs: u64) -> Self {
        self.response_timeouts.insert(level, secs);
        self
    }
}

impl Default for RiskPolicy {
    fn default() -> Self {
        let mut response_timeouts = HashMap::new();
        response_timeouts.insert(RiskLevel::High, 60);
        response_timeouts.insert(RiskLevel::Critical, 30);

        let mut grant_timeouts = HashMap::new();
        grant_timeouts.insert(RiskLevel::Low, 3600);
        grant_timeouts.insert(RiskLevel::Medium, 1800);
        grant_timeouts.insert(RiskLevel::High, 300);

        Self {
            default_actions: HashMap::new(),
            grant_timeouts,
            response_timeouts,
            default_response_timeout: 120,
        }
    }
}

/// The full permission configuration (patterns + override rules + switches)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Schema version
    pub version: u32,

    /// Master switch; when false every operation is auto-allowed
    pub enabled: bool,

    /// Action for operations no pattern classifies
    pub default_action: PermissionAction,

    /// Fallback session-grant lifetime in seconds, used when the risk
    /// policy has no per-level entry
    pub permission_timeout: u64,

    /// Risk patterns, built-in and user-added
    pub patterns: Vec<RiskPattern>,

    /// Override rules, evaluated before the risk-level defaults
    pub rules: Vec<PermissionRule>,
}

impl PermissionConfig {
    /// Config seeded with the built-in default patterns and no overrides
    pub fn with_defaults() -> Self {
        Self {
            version: PERMISSION_CONFIG_VERSION,
            enabled: true,
            default_action: PermissionAction::RequireConfirmation,
            permission_timeout: 900,
            patterns: default_patterns(),
            rules: Vec::new(),
        }
    }

    /// Look up a pattern by id
    pub fn pattern(&self, id: &str) -> Option<&RiskPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Look up an override rule by id
    pub fn rule(&self, id: &str) -> Option<&PermissionRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// First enabled override rule covering the matched patterns or category
    pub fn override_for(
        &self,
        matched: &[RiskPattern],
        category: OperationCategory,
    ) -> Option<&PermissionRule> {
        self.rules
            .iter()
            .find(|r| r.enabled && r.applies_to(matched, category))
    }

    /// Return a new config with the pattern appended; validates the pattern
    pub fn add_pattern(&self, pattern: RiskPattern) -> RouterResult<Self> {
        pattern.validate()?;
        let mut next = self.clone();
        tracing::info!(
            "Adding risk pattern '{}' ({} / {})",
            pattern.name,
            pattern.category,
            pattern.risk_level
        );
        next.patterns.push(pattern);
        Ok(next)
    }

    /// Return a new config with the pattern removed
    pub fn remove_pattern(&self, id: &str) -> RouterResult<Self> {
        if self.pattern(id).is_none() {
            return Err(RouterError::UnknownEntry(id.to_string()));
        }
        let mut next = self.clone();
        next.patterns.retain(|p| p.id != id);
        Ok(next)
    }

    /// Return a new config with the pattern enabled or disabled
    pub fn set_pattern_enabled(&self, id: &str, enabled: bool) -> RouterResult<Self> {
        let mut next = self.clone();
        let pattern = next
            .patterns
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RouterError::UnknownEntry(id.to_string()))?;
        pattern.enabled = enabled;
        Ok(next)
    }

    /// Return a new config with the override rule appended
    pub fn add_rule(&self, rule: PermissionRule) -> Self {
        let mut next = self.clone();
        tracing::info!("Adding permission rule '{}' ({:?})", rule.name, rule.action);
        next.rules.push(rule);
        next
    }

    /// Return a new config with the override rule partially updated
    ///
    /// Refreshes the rule's `updated_at`. Unknown ids are an error.
    pub fn update_rule(&self, id: &str, update: PermissionRuleUpdate) -> RouterResult<Self> {
        let mut next = self.clone();
        let rule = next
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RouterError::UnknownEntry(id.to_string()))?;

        if let Some(name) = update.name {
            rule.name = name;
        }
        if let Some(target) = update.target {
            rule.target = target;
        }
        if let Some(action) = update.action {
            rule.action = action;
        }
        if let Some(enabled) = update.enabled {
            rule.enabled = enabled;
        }
        rule.updated_at = Utc::now();

        Ok(next)
    }

    /// Return a new config with the override rule removed
    pub fn remove_rule(&self, id: &str) -> RouterResult<Self> {
        if self.rule(id).is_none() {
            return Err(RouterError::UnknownEntry(id.to_string()));
        }
        let mut next = self.clone();
        next.rules.retain(|r| r.id != id);
        Ok(next)
    }
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}
