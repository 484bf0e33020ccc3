//! Shared keyword/regex matcher used by routing rules and risk patterns
//!
//! A matcher is a list of keyword strings plus a match type. Non-regex types
//! OR their keywords together; the regex type treats the first keyword as
//! the pattern source. Matchers are compiled once per config snapshot so
//! evaluation is allocation-free on the hot path.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// How a matcher's keywords are compared against input text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Text equals the keyword
    Exact,
    /// Keyword is a substring of the text
    Contains,
    /// Text starts with the keyword
    StartsWith,
    /// Text ends with the keyword
    EndsWith,
    /// First keyword is a regex, tested anywhere in the text
    Regex,
}

/// Serializable matcher definition (keywords + match type + case flag)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatcher {
    /// Keyword strings; ORed together for non-regex types, first entry is
    /// the pattern source for `Regex`
    pub keywords: Vec<String>,
    /// Comparison mode
    pub match_type: MatchType,
    /// Whether comparison is case sensitive
    #[serde(default)]
    pub case_sensitive: bool,
}

impl KeywordMatcher {
    /// Create a matcher over the given keywords
    pub fn new(keywords: Vec<String>, match_type: MatchType) -> Self {
        Self {
            keywords,
            match_type,
            case_sensitive: false,
        }
    }

    /// Convenience constructor for a case-insensitive `Contains` matcher
    pub fn contains(keywords: &[&str]) -> Self {
        Self::new(
            keywords.iter().map(|k| k.to_string()).collect(),
            MatchType::Contains,
        )
    }

    /// Convenience constructor for a regex matcher
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(vec![pattern.into()], MatchType::Regex)
    }

    /// True if this matcher has no keywords (always-true for risk patterns,
    /// never-matching for keyword rules)
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Compile this matcher for evaluation
    ///
    /// An invalid regex pattern does not fail compilation; the compiled
    /// matcher is marked permanently non-matching and a warning is logged.
    /// `context` names the owning rule/pattern in that log line.
    pub fn compile(&self, context: &str) -> CompiledMatcher {
        let mut regex = None;
        let mut poisoned = false;

        if self.match_type == MatchType::Regex {
            match self.keywords.first() {
                Some(pattern) => {
                    match RegexBuilder::new(pattern)
                        .case_insensitive(!self.case_sensitive)
                        .build()
                    {
                        Ok(re) => regex = Some(re),
                        Err(err) => {
                            tracing::warn!(
                                "Invalid regex in {}: {} - entry disabled for matching",
                                context,
                                err
                            );
                            poisoned = true;
                        }
                    }
                }
                None => poisoned = true,
            }
        }

        let keywords = if self.case_sensitive {
            self.keywords.clone()
        } else {
            self.keywords.iter().map(|k| k.to_lowercase()).collect()
        };

        CompiledMatcher {
            keywords,
            match_type: self.match_type,
            case_sensitive: self.case_sensitive,
            regex,
            poisoned,
        }
    }
}

/// A matcher ready for evaluation (regex pre-compiled, keywords case-folded)
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    keywords: Vec<String>,
    match_type: MatchType,
    case_sensitive: bool,
    regex: Option<Regex>,
    poisoned: bool,
}

impl CompiledMatcher {
    /// True if the source matcher had no keywords
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// True if the matcher was built from an invalid regex and never matches
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of keywords that individually match the text
    ///
    /// Regex matchers count as a single keyword. A poisoned or empty
    /// matcher contributes zero.
    pub fn matched_keywords(&self, text: &str) -> usize {
        if self.poisoned || text.is_empty() {
            return 0;
        }

        if self.match_type == MatchType::Regex {
            return match &self.regex {
                Some(re) if re.is_match(text) => 1,
                _ => 0,
            };
        }

        let folded;
        let haystack = if self.case_sensitive {
            text
        } else {
            folded = text.to_lowercase();
            &folded
        };

        self.keywords
            .iter()
            .filter(|keyword| match self.match_type {
                MatchType::Exact => haystack == keyword.as_str(),
                MatchType::Contains => haystack.contains(keyword.as_str()),
                MatchType::StartsWith => haystack.starts_with(keyword.as_str()),
                MatchType::EndsWith => haystack.ends_with(keyword.as_str()),
                MatchType::Regex => unreachable!(),
            })
            .count()
    }

    /// Whether any keyword matches the text
    pub fn matches(&self, text: &str) -> bool {
        self.matched_keywords(text) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(keywords: &[&str], match_type: MatchType, case_sensitive: bool) -> CompiledMatcher {
        let mut m = KeywordMatcher::new(
            keywords.iter().map(|k| k.to_string()).collect(),
            match_type,
        );
        m.case_sensitive = case_sensitive;
        m.compile("test")
    }

    #[test]
    fn test_exact_match() {
        let m = compile(&["deploy"], MatchType::Exact, false);
        assert!(m.matches("deploy"));
        assert!(m.matches("DEPLOY"));
        assert!(!m.matches("deploy now"));
    }

    #[test]
    fn test_contains_match() {
        let m = compile(&["review", "bug"], MatchType::Contains, false);
        assert_eq!(m.matched_keywords("please review this for bugs"), 2);
        assert_eq!(m.matched_keywords("please look at this"), 0);
    }

    #[test]
    fn test_starts_and_ends_with() {
        let starts = compile(&["git "], MatchType::StartsWith, false);
        assert!(starts.matches("git status"));
        assert!(!starts.matches("run git status"));

        let ends = compile(&[".rs"], MatchType::EndsWith, true);
        assert!(ends.matches("src/main.rs"));
        assert!(!ends.matches("main.rs.bak"));
    }

    #[test]
    fn test_case_sensitive() {
        let m = compile(&["Deploy"], MatchType::Contains, true);
        assert!(m.matches("Deploy now"));
        assert!(!m.matches("deploy now"));
    }

    #[test]
    fn test_regex_match() {
        let m = compile(&[r"rm\s+-rf"], MatchType::Regex, false);
        assert!(m.matches("rm -rf /tmp/x"));
        assert!(m.matches("RM  -RF /"));
        assert!(!m.matches("rm file"));
    }

    #[test]
    fn test_invalid_regex_is_poisoned_not_fatal() {
        let m = KeywordMatcher::regex("[unclosed").compile("rule 'bad'");
        assert!(m.is_poisoned());
        assert!(!m.matches("anything"));
        assert_eq!(m.matched_keywords("anything"), 0);
    }

    #[test]
    fn test_empty_text_never_matches() {
        let m = compile(&["review"], MatchType::Contains, false);
        assert!(!m.matches(""));
    }

    #[test]
    fn test_empty_keywords() {
        let m = compile(&[], MatchType::Contains, false);
        assert!(m.is_empty());
        assert!(!m.matches("anything"));
    }
}
