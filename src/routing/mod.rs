//! Keyword routing: free-text input -> suggested expert
//!
//! - `matcher`: shared keyword/regex matcher (also used by risk patterns)
//! - `rules`: the routing rule table and its copy-on-write config
//! - `detector`: the match engine producing `DetectionResult`s

pub mod detector;
pub mod matcher;
pub mod rules;

pub use detector::{DetectionResult, KeywordDetector, MatchedRule};
pub use matcher::{CompiledMatcher, KeywordMatcher, MatchType};
pub use rules::{KeywordConfig, KeywordRule, KeywordRuleUpdate, default_rules};
