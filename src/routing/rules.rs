//! Keyword routing rules and their config
//!
//! The config is a copy-on-write value: every mutation returns a new,
//! fully independent `KeywordConfig`, so readers holding an older snapshot
//! keep a consistent view. Persisting the returned value is the caller's
//! job (see `store`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{RouterError, RouterResult};
use crate::experts::ExpertId;
use crate::routing::matcher::{KeywordMatcher, MatchType};

/// Current schema version for persisted keyword configs
pub const KEYWORD_CONFIG_VERSION: u32 = 1;

/// A single keyword routing rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Unique id (fixed string for built-ins, uuid for user rules)
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Keywords, match type, and case flag
    #[serde(flatten)]
    pub matcher: KeywordMatcher,

    /// Expert that matching text is routed to
    pub target_expert: ExpertId,

    /// Higher priority wins; user rules beat built-ins at equal priority
    pub priority: i32,

    /// Disabled rules never contribute to matching
    pub enabled: bool,

    /// Whether this rule shipped with the crate
    #[serde(default)]
    pub built_in: bool,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the rule was created
    pub created_at: DateTime<Utc>,

    /// When the rule was last updated
    pub updated_at: DateTime<Utc>,
}

impl KeywordRule {
    /// Create a user rule with a fresh uuid and default priority 50
    pub fn new(
        name: impl Into<String>,
        keywords: Vec<String>,
        target_expert: ExpertId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            matcher: KeywordMatcher::new(keywords, MatchType::Contains),
            target_expert,
            priority: 50,
            enabled: true,
            built_in: false,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the match type
    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.matcher.match_type = match_type;
        self
    }

    /// Make keyword comparison case sensitive
    pub fn case_sensitive(mut self) -> Self {
        self.matcher.case_sensitive = true;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn built_in(
        id: &str,
        name: &str,
        keywords: &[&str],
        target_expert: ExpertId,
        priority: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            matcher: KeywordMatcher::contains(keywords),
            target_expert,
            priority,
            enabled: true,
            built_in: true,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a keyword rule; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct KeywordRuleUpdate {
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub match_type: Option<MatchType>,
    pub case_sensitive: Option<bool>,
    pub target_expert: Option<ExpertId>,
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
    pub description: Option<String>,
}

/// The full keyword routing rule table (built-in + user rules)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Schema version
    pub version: u32,

    /// All rules, built-in and user-added
    pub rules: Vec<KeywordRule>,
}

impl KeywordConfig {
    /// Config seeded with the built-in default rules
    pub fn with_defaults() -> Self {
        Self {
            version: KEYWORD_CONFIG_VERSION,
            rules: default_rules(),
        }
    }

    /// Look up a rule by id
    pub fn rule(&self, id: &str) -> Option<&KeywordRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Return a new config with the rule appended
    pub fn add_rule(&self, rule: KeywordRule) -> Self {
        let mut next = self.clone();
        tracing::info!("Adding keyword rule '{}' -> {}", rule.name, rule.target_expert);
        next.rules.push(rule);
        next
    }

    /// Return a new config with the rule partially updated
    ///
    /// Refreshes the rule's `updated_at`. Unknown ids are an error.
    pub fn update_rule(&self, id: &str, update: KeywordRuleUpdate) -> RouterResult<Self> {
        let mut next = self.clone();
        let rule = next
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RouterError::UnknownEntry(id.to_string()))?;

        if let Some(name) = update.name {
            rule.name = name;
        }
        if let Some(keywords) = update.keywords {
            rule.matcher.keywords = keywords;
        }
        if let Some(match_type) = update.match_type {
            rule.matcher.match_type = match_type;
        }
        if let Some(case_sensitive) = update.case_sensitive {
            rule.matcher.case_sensitive = case_sensitive;
        }
        if let Some(target_expert) = update.target_expert {
            rule.target_expert = target_expert;
        }
        if let Some(priority) = update.priority {
            rule.priority = priority;
        }
        if let Some(enabled) = update.enabled {
            rule.enabled = enabled;
        }
        if let Some(description) = update.description {
            rule.description = Some(description);
        }
        rule.updated_at = Utc::now();

        Ok(next)
    }

    /// Return a new config with the rule removed; unknown ids are an error
    pub fn remove_rule(&self, id: &str) -> RouterResult<Self> {
        if self.rule(id).is_none() {
            return Err(RouterError::UnknownEntry(id.to_string()));
        }
        let mut next = self.clone();
        next.rules.retain(|r| r.id != id);
        Ok(next)
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Built-in default routing rules
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::built_in(
            "builtin-review",
            "Code review requests",
            &["review", "code review", "check my code"],
            ExpertId::Reviewer,
            85,
        ),
        KeywordRule::built_in(
            "builtin-research",
            "Research requests",
            &["research", "look up", "find out about", "investigate"],
            ExpertId::Researcher,
            80,
        ),
        KeywordRule::built_in(
            "builtin-implement",
            "Implementation requests",
            &["implement", "refactor", "write a function", "add a feature"],
            ExpertId::Coder,
            75,
        ),
        KeywordRule::built_in(
            "builtin-bugfix",
            "Bug reports",
            &["bug", "fix", "crash", "broken"],
            ExpertId::Reviewer,
            70,
        ),
        KeywordRule::built_in(
            "builtin-writing",
            "Writing and documentation",
            &["draft", "summarize", "document this", "blog post"],
            ExpertId::Writer,
            60,
        ),
    ]
}
