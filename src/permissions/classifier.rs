//! Risk classifier
//!
//! Maps an operation description to a risk level by collecting every
//! enabled pattern that covers it. Classification is a pure read over a
//! config snapshot.

use crate::permissions::config::PermissionConfig;
use crate::permissions::patterns::{Operation, OperationCategory, RiskLevel, RiskPattern};

/// Outcome of classifying one operation
#[derive(Debug, Clone)]
pub struct Classification {
    /// Maximum severity among matched patterns; `None` means unclassified
    /// and the gate falls back to the config's default action
    pub risk_level: Option<RiskLevel>,
    /// Every pattern that matched, sorted by descending severity
    pub matched_patterns: Vec<RiskPattern>,
}

impl Classification {
    /// True when no pattern covered the operation
    pub fn is_unclassified(&self) -> bool {
        self.risk_level.is_none()
    }
}

/// Classify an operation against the config's enabled patterns
///
/// A pattern covers an operation when its category equals the operation's
/// category (or is `any`) and its detail matcher matches (an empty keyword
/// list is the always-true matcher). All matches are collected; the
/// returned level is the maximum severity among them.
pub fn classify(operation: &Operation, config: &PermissionConfig) -> Classification {
    let mut matched: Vec<RiskPattern> = config
        .patterns
        .iter()
        .filter(|p| p.enabled)
        .filter(|p| {
            let category_ok = p.category == OperationCategory::Any
                || p.category == operation.category;
            if !category_ok {
                return false;
            }
            if p.matcher.is_empty() {
                return true;
            }
            p.matcher
                .compile(&format!("risk pattern '{}'", p.name))
                .matches(&operation.detail)
        })
        .cloned()
        .collect();

    matched.sort_by(|a, b| b.risk_level.cmp(&a.risk_level));
    let risk_level = matched.iter().map(|p| p.risk_level).max();

    tracing::debug!(
        "Classified {} '{}': {:?} ({} pattern(s))",
        operation.category,
        operation.detail,
        risk_level,
        matched.len()
    );

    Classification {
        risk_level,
        matched_patterns: matched,
    }
}
