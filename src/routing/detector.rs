//! Keyword match engine
//!
//! Routes free-text user input to a suggested expert using the active rule
//! table. Detection is a pure, synchronous computation over a compiled
//! config snapshot; it never suspends and holds no locks.

use serde::{Deserialize, Serialize};

use crate::experts::ExpertId;
use crate::routing::matcher::CompiledMatcher;
use crate::routing::rules::{KeywordConfig, KeywordRule};

/// One rule that matched the input text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedRule {
    /// Id of the matching rule
    pub rule_id: String,
    /// Name of the matching rule
    pub rule_name: String,
    /// Expert the rule routes to
    pub target_expert: ExpertId,
    /// Rule priority at match time
    pub priority: i32,
    /// How many of the rule's keywords hit
    pub matched_keywords: usize,
}

/// Result of routing detection over one input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Whether any rule matched
    pub detected: bool,
    /// All matching rules, sorted by descending priority
    pub matched_rules: Vec<MatchedRule>,
    /// Target of the highest-priority match, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_expert: Option<ExpertId>,
    /// Confidence in [0, 1]; 0 when nothing matched
    pub confidence: f64,
}

impl DetectionResult {
    fn no_match() -> Self {
        Self {
            detected: false,
            matched_rules: Vec::new(),
            suggested_expert: None,
            confidence: 0.0,
        }
    }
}

struct ActiveRule {
    rule: KeywordRule,
    matcher: CompiledMatcher,
}

/// The keyword match engine, compiled from a config snapshot
///
/// Construct a fresh detector whenever the config is reloaded; the detector
/// itself is immutable and safe to share across request handlers.
pub struct KeywordDetector {
    active: Vec<ActiveRule>,
}

impl KeywordDetector {
    /// Compile a detector from a config snapshot
    ///
    /// Disabled rules are dropped. The remaining rules are sorted by
    /// descending priority; at equal priority user rules come before
    /// built-ins (user intent wins), and the sort is stable so original
    /// list order breaks any remaining tie deterministically.
    pub fn new(config: &KeywordConfig) -> Self {
        let mut active: Vec<ActiveRule> = config
            .rules
            .iter()
            .filter(|r| r.enabled)
            .map(|r| ActiveRule {
                matcher: r.matcher.compile(&format!("keyword rule '{}'", r.name)),
                rule: r.clone(),
            })
            .collect();

        active.sort_by(|a, b| {
            b.rule
                .priority
                .cmp(&a.rule.priority)
                .then_with(|| a.rule.built_in.cmp(&b.rule.built_in))
        });

        Self { active }
    }

    /// Number of rules participating in matching
    pub fn active_rule_count(&self) -> usize {
        self.active.len()
    }

    /// Detect which expert should handle the given text
    ///
    /// Every active rule is evaluated (no short-circuit) so the full match
    /// list is available to callers. Identical inputs always produce an
    /// identical result, including tie-break order.
    pub fn detect(&self, text: &str) -> DetectionResult {
        if text.trim().is_empty() {
            return DetectionResult::no_match();
        }

        let mut matched_rules = Vec::new();
        let mut total_keywords = 0usize;

        for entry in &self.active {
            let hits = entry.matcher.matched_keywords(text);
            if hits == 0 {
                continue;
            }
            total_keywords += hits;
            matched_rules.push(MatchedRule {
                rule_id: entry.rule.id.clone(),
                rule_name: entry.rule.name.clone(),
                target_expert: entry.rule.target_expert,
                priority: entry.rule.priority,
                matched_keywords: hits,
            });
        }

        if matched_rules.is_empty() {
            return DetectionResult::no_match();
        }

        let suggested = matched_rules[0].target_expert;
        let confidence = (0.5 + 0.1 * total_keywords as f64).min(1.0);

        tracing::debug!(
            "Routing match: {} rule(s), suggested expert {} (confidence {:.2})",
            matched_rules.len(),
            suggested,
            confidence
        );

        DetectionResult {
            detected: true,
            matched_rules,
            suggested_expert: Some(suggested),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::MatchType;
    use crate::routing::rules::{KeywordRuleUpdate, default_rules};

    fn rule(name: &str, keywords: &[&str], target: ExpertId, priority: i32) -> KeywordRule {
        KeywordRule::new(
            name,
            keywords.iter().map(|k| k.to_string()).collect(),
            target,
        )
        .with_priority(priority)
    }

    fn config_of(rules: Vec<KeywordRule>) -> KeywordConfig {
        KeywordConfig { version: 1, rules }
    }

    #[test]
    fn test_review_and_bug_scenario() {
        let config = config_of(vec![
            rule("review", &["review"], ExpertId::Reviewer, 85),
            rule("bug", &["bug"], ExpertId::Reviewer, 70),
        ]);
        let detector = KeywordDetector::new(&config);

        let result = detector.detect("please review this for bugs");
        assert!(result.detected);
        assert_eq!(result.matched_rules.len(), 2);
        assert_eq!(result.suggested_expert, Some(ExpertId::Reviewer));
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_no_match_against_defaults() {
        let detector = KeywordDetector::new(&KeywordConfig::with_defaults());
        let result = detector.detect("hello");
        assert!(!result.detected);
        assert!(result.suggested_expert.is_none());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_empty_text_no_match() {
        let detector = KeywordDetector::new(&KeywordConfig::with_defaults());
        let result = detector.detect("   ");
        assert!(!result.detected);
        assert!(result.matched_rules.is_empty());
    }

    #[test]
    fn test_priority_monotonicity() {
        let config = config_of(vec![
            rule("low", &["deploy"], ExpertId::Coder, 10),
            rule("high", &["deploy"], ExpertId::Researcher, 90),
            rule("mid", &["deploy"], ExpertId::Writer, 50),
        ]);
        let detector = KeywordDetector::new(&config);

        let result = detector.detect("deploy the service");
        assert_eq!(result.suggested_expert, Some(ExpertId::Researcher));
        let priorities: Vec<i32> = result.matched_rules.iter().map(|m| m.priority).collect();
        assert_eq!(priorities, vec![90, 50, 10]);
    }

    #[test]
    fn test_user_rule_beats_built_in_at_equal_priority() {
        let mut rules = default_rules();
        // User rule at the same priority as builtin-review (85), different target
        rules.push(rule("my review", &["review"], ExpertId::Coder, 85));
        let detector = KeywordDetector::new(&config_of(rules));

        let result = detector.detect("review this");
        assert_eq!(result.suggested_expert, Some(ExpertId::Coder));
    }

    #[test]
    fn test_equal_priority_ties_are_stable() {
        let config = config_of(vec![
            rule("first", &["deploy"], ExpertId::Coder, 50),
            rule("second", &["deploy"], ExpertId::Writer, 50),
        ]);
        let detector = KeywordDetector::new(&config);

        for _ in 0..3 {
            let result = detector.detect("deploy it");
            assert_eq!(result.suggested_expert, Some(ExpertId::Coder));
            assert_eq!(result.matched_rules[0].rule_name, "first");
        }
    }

    #[test]
    fn test_disabled_rule_is_ignored() {
        let high = rule("high", &["deploy"], ExpertId::Researcher, 90);
        let high_id = high.id.clone();
        let config = config_of(vec![
            high,
            rule("low", &["deploy"], ExpertId::Coder, 10),
        ]);

        let config = config
            .update_rule(
                &high_id,
                KeywordRuleUpdate {
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        let detector = KeywordDetector::new(&config);

        let result = detector.detect("deploy it");
        assert_eq!(result.matched_rules.len(), 1);
        assert_eq!(result.suggested_expert, Some(ExpertId::Coder));
    }

    #[test]
    fn test_invalid_regex_rule_never_matches() {
        let config = config_of(vec![
            rule("bad", &["[unclosed"], ExpertId::Coder, 90).with_match_type(MatchType::Regex),
            rule("good", &["deploy"], ExpertId::Writer, 10),
        ]);
        let detector = KeywordDetector::new(&config);

        let result = detector.detect("deploy [unclosed");
        assert_eq!(result.matched_rules.len(), 1);
        assert_eq!(result.suggested_expert, Some(ExpertId::Writer));
    }

    #[test]
    fn test_regex_rule_matches() {
        let config = config_of(vec![rule(
            "versions",
            &[r"v\d+\.\d+"],
            ExpertId::Researcher,
            60,
        )
        .with_match_type(MatchType::Regex)]);
        let detector = KeywordDetector::new(&config);

        assert!(detector.detect("what changed in v2.1").detected);
        assert!(!detector.detect("what changed recently").detected);
    }

    #[test]
    fn test_confidence_clamped_to_one() {
        let keywords: Vec<&str> = vec!["a", "b", "c", "d", "e", "f", "g"];
        let config = config_of(vec![rule("many", &keywords, ExpertId::General, 10)]);
        let detector = KeywordDetector::new(&config);

        let result = detector.detect("a b c d e f g");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let detector = KeywordDetector::new(&KeywordConfig::with_defaults());
        let a = detector.detect("review the fix for this bug");
        let b = detector.detect("review the fix for this bug");
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
