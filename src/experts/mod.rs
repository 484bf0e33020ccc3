//! Expert identifiers and fallback resolution
//!
//! Experts form a fixed, closed vocabulary shared between the config schema
//! and the routing engine. Adding a new expert means extending `ExpertId`
//! and the default fallback chains together.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::RouterError;

/// Unique identifier for each expert backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertId {
    /// Generalist fallback for anything unrouted
    General,
    /// Code writing and implementation
    Coder,
    /// Code review, bug hunting, quality feedback
    Reviewer,
    /// Research, search, and information gathering
    Researcher,
    /// Prose, documentation, and drafting
    Writer,
}

impl ExpertId {
    /// All known experts, in stable order
    pub const ALL: [ExpertId; 5] = [
        ExpertId::General,
        ExpertId::Coder,
        ExpertId::Reviewer,
        ExpertId::Researcher,
        ExpertId::Writer,
    ];

    /// The canonical string form used in configs and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertId::General => "general",
            ExpertId::Coder => "coder",
            ExpertId::Reviewer => "reviewer",
            ExpertId::Researcher => "researcher",
            ExpertId::Writer => "writer",
        }
    }
}

impl fmt::Display for ExpertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpertId {
    type Err = RouterError;

    /// Parse an expert id; unknown ids are a contract violation and fail loudly
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(ExpertId::General),
            "coder" => Ok(ExpertId::Coder),
            "reviewer" => Ok(ExpertId::Reviewer),
            "researcher" => Ok(ExpertId::Researcher),
            "writer" => Ok(ExpertId::Writer),
            other => Err(RouterError::UnknownExpert(other.to_string())),
        }
    }
}

/// Resolves a routing suggestion into an ordered list of candidate experts
///
/// Each expert may carry a configured fallback chain; the resolver produces
/// the candidates the caller will try in sequence. The chain-walking and
/// retry logic around actual model invocation lives with the caller.
#[derive(Debug, Clone)]
pub struct FallbackResolver {
    chains: std::collections::HashMap<ExpertId, Vec<ExpertId>>,
    default_expert: ExpertId,
}

impl FallbackResolver {
    /// Create a resolver with no configured chains and `General` as the default
    pub fn new() -> Self {
        Self {
            chains: std::collections::HashMap::new(),
            default_expert: ExpertId::General,
        }
    }

    /// Set the expert used when routing produced no suggestion
    pub fn with_default_expert(mut self, expert: ExpertId) -> Self {
        self.default_expert = expert;
        self
    }

    /// Set the fallback chain for an expert
    pub fn with_chain(mut self, expert: ExpertId, chain: Vec<ExpertId>) -> Self {
        self.chains.insert(expert, chain);
        self
    }

    /// Resolve a suggestion to the ordered candidate list
    ///
    /// The suggested expert comes first, followed by its configured chain,
    /// then the default expert. Duplicates are dropped, keeping the first
    /// occurrence. With no suggestion the list is just the default expert
    /// and its chain.
    pub fn resolve(&self, suggested: Option<ExpertId>) -> Vec<ExpertId> {
        let head = suggested.unwrap_or(self.default_expert);
        let mut candidates = vec![head];

        if let Some(chain) = self.chains.get(&head) {
            candidates.extend(chain.iter().copied());
        }
        candidates.push(self.default_expert);

        let mut seen = std::collections::HashSet::new();
        candidates.retain(|e| seen.insert(*e));
        candidates
    }
}

impl Default for FallbackResolver {
    fn default() -> Self {
        Self::new()
    }
}
