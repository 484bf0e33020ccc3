//! Routing and risk gating for an expert-backed assistant
//!
//! Two engines with shared plumbing:
//!
//! - `routing`: matches free-text user input against a prioritized rule
//!   table and suggests which expert should handle the request
//! - `permissions`: classifies operations by risk and gates execution
//!   behind human confirmation, remembering approvals for the session
//!
//! Configs are copy-on-write values loaded and saved through `store`;
//! engines hold read-only snapshots and never mutate shared state, except
//! for the mutex-guarded session grant cache inside the gate.

pub mod core;
pub mod experts;
pub mod permissions;
pub mod routing;
pub mod store;

// Optional components
pub mod logging;

pub use crate::core::{RouterError, RouterResult};
pub use experts::{ExpertId, FallbackResolver};
pub use permissions::{Operation, OperationCategory, PermissionConfig, PermissionGate, RiskLevel};
pub use routing::{DetectionResult, KeywordConfig, KeywordDetector};
pub use store::{FileRuleStore, RuleStore};
