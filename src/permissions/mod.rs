//! Risk classification and permission gating
//!
//! The pipeline: an expert describes an operation it is about to perform,
//! the classifier maps it to a risk level via the pattern table, and the
//! gate decides allow/deny/ask using override rules, the risk policy, and
//! the session grant cache.
//!
//! ## Example
//!
//! ```rust,ignore
//! use expert_router::permissions::{Operation, OperationCategory, PermissionGate, PermissionConfig};
//!
//! let gate = PermissionGate::new(PermissionConfig::with_defaults());
//! let op = Operation::new(OperationCategory::ShellExecute, "cargo build");
//!
//! match gate.check_permission(&op).status {
//!     CheckStatus::AutoAllowed { .. } => { /* execute */ }
//!     CheckStatus::Denied { reason } => { /* abort, surface reason */ }
//!     CheckStatus::Pending => { /* show request, await_decision */ }
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod gate;
pub mod grants;
pub mod patterns;

pub use classifier::{Classification, classify};
pub use config::{
    PermissionAction, PermissionConfig, PermissionRule, PermissionRuleUpdate, RiskPolicy,
    RuleTarget,
};
pub use gate::{
    CheckStatus, Decision, PermissionCheckResult, PermissionGate, PermissionOutcome,
    PermissionRequest,
};
pub use grants::SessionGrantCache;
pub use patterns::{Operation, OperationCategory, RiskLevel, RiskPattern, default_patterns};
