//! Permission gate
//!
//! Orchestrates the risk classifier, the session grant cache, and override
//! rules to produce a final allow/deny/ask decision for each operation.
//! Pending requests suspend (the task, not the thread) until a confirmation
//! collaborator resolves them or the risk-level deadline passes.
//!
//! State machine per operation:
//! `pending -> {approved, denied, expired, auto_allowed}`

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::core::{RouterError, RouterResult};
use crate::permissions::classifier::classify;
use crate::permissions::config::{PermissionAction, PermissionConfig, RiskPolicy};
use crate::permissions::grants::SessionGrantCache;
use crate::permissions::patterns::{Operation, RiskLevel, RiskPattern};

/// Immediate status of a permission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    /// Execution may proceed without asking
    AutoAllowed { reason: String },
    /// Execution is refused; the caller must abort and surface the reason
    Denied { reason: String },
    /// Held for human confirmation; see the attached request
    Pending,
}

/// The user's answer to a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

/// Final outcome of a pending request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    /// Explicitly approved before the deadline
    Approved,
    /// Explicitly denied
    Denied { reason: String },
    /// Deadline elapsed or the request was cancelled; treated as a deny
    /// for execution purposes but reported distinctly
    Expired { reason: String },
}

impl PermissionOutcome {
    /// Whether the operation may execute
    pub fn is_allowed(&self) -> bool {
        matches!(self, PermissionOutcome::Approved)
    }
}

/// A request handed to the confirmation collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// Request id, used to resolve or cancel
    pub id: Uuid,
    /// Names of the patterns that flagged the operation
    pub pattern_names: Vec<String>,
    /// Classified risk level, if any
    pub risk_level: Option<RiskLevel>,
    /// Human-readable description of the operation
    pub description: String,
    /// When the request was created
    pub requested_at: DateTime<Utc>,
    /// No response by this time counts as a deny with reason `expired`
    pub deadline: DateTime<Utc>,
}

/// Result of `check_permission`
#[derive(Debug)]
pub struct PermissionCheckResult {
    /// Immediate status
    pub status: CheckStatus,
    /// Classified risk level, if any
    pub risk_level: Option<RiskLevel>,
    /// Patterns that matched, sorted by descending severity
    pub matched_patterns: Vec<RiskPattern>,
    /// Present when status is `Pending`
    pub request: Option<PermissionRequest>,
}

struct PendingResolver {
    sender: oneshot::Sender<Decision>,
    pattern_ids: Vec<String>,
    critical: bool,
}

struct PendingWaiter {
    receiver: oneshot::Receiver<Decision>,
    deadline: tokio::time::Instant,
}

/// The permission gate
///
/// Holds a read-only config snapshot (refreshed via `reload`), the
/// injectable risk policy tables, and the session grant cache. Construct
/// one per routing pipeline; a fresh instance is a full reset.
pub struct PermissionGate {
    config: RwLock<Arc<PermissionConfig>>,
    policy: RiskPolicy,
    grants: SessionGrantCache,
    resolvers: Mutex<HashMap<Uuid, PendingResolver>>,
    waiters: Mutex<HashMap<Uuid, PendingWaiter>>,
}

impl PermissionGate {
    /// Create a gate over a config snapshot with the default risk policy
    pub fn new(config: PermissionConfig) -> Self {
        Self::with_policy(config, RiskPolicy::default())
    }

    /// Create a gate with a custom risk policy
    pub fn with_policy(config: PermissionConfig, policy: RiskPolicy) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            policy,
            grants: SessionGrantCache::new(),
            resolvers: Mutex::new(HashMap::new()),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Current config snapshot
    pub fn config(&self) -> Arc<PermissionConfig> {
        self.config.read().unwrap().clone()
    }

    /// Replace the config snapshot (after a store load or mutation)
    ///
    /// In-flight checks keep the snapshot they started with; session
    /// grants survive a reload.
    pub fn reload(&self, config: PermissionConfig) {
        *self.config.write().unwrap() = Arc::new(config);
    }

    /// Grant lifetime for a pattern: the risk-level timeout if defined,
    /// else the config-wide `permission_timeout`
    fn effective_timeout(
        &self,
        config: &PermissionConfig,
        level: RiskLevel,
    ) -> std::time::Duration {
        self.policy
            .grant_timeout(level)
            .unwrap_or(std::time::Duration::from_secs(config.permission_timeout))
    }

    /// Check whether an operation may execute
    ///
    /// Returns immediately; a `Pending` status carries a request the
    /// confirmation collaborator must resolve, while the caller suspends
    /// on [`await_decision`](Self::await_decision).
    pub fn check_permission(&self, operation: &Operation) -> PermissionCheckResult {
        let config = self.config();

        // Master kill-switch
        if !config.enabled {
            return PermissionCheckResult {
                status: CheckStatus::AutoAllowed {
                    reason: "permission checks disabled".to_string(),
                },
                risk_level: None,
                matched_patterns: Vec::new(),
                request: None,
            };
        }

        let classification = classify(operation, &config);
        let risk_level = classification.risk_level;
        let matched = classification.matched_patterns;

        // Session grants never satisfy a critical operation
        if risk_level != Some(RiskLevel::Critical) {
            for pattern in &matched {
                let timeout = self.effective_timeout(&config, pattern.risk_level);
                if self.grants.is_valid(&pattern.id, timeout) {
                    tracing::debug!(
                        "Operation auto-allowed by session grant for '{}'",
                        pattern.name
                    );
                    return PermissionCheckResult {
                        status: CheckStatus::AutoAllowed {
                            reason: format!("session grant for '{}'", pattern.name),
                        },
                        risk_level,
                        matched_patterns: matched,
                        request: None,
                    };
                }
            }
        }

        // Override rule, then risk-level default, then config default
        let action = match config.override_for(&matched, operation.category) {
            Some(rule) => {
                tracing::debug!("Permission rule '{}' overrides action", rule.name);
                rule.action
            }
            None => match risk_level {
                Some(level) => self.policy.default_action(level),
                None => config.default_action,
            },
        };

        match action {
            PermissionAction::Allow => PermissionCheckResult {
                status: CheckStatus::AutoAllowed {
                    reason: match risk_level {
                        Some(level) => format!("{} risk allows execution", level),
                        None => "allowed by default action".to_string(),
                    },
                },
                risk_level,
                matched_patterns: matched,
                request: None,
            },
            PermissionAction::Deny => PermissionCheckResult {
                status: CheckStatus::Denied {
                    reason: deny_reason(&matched, risk_level),
                },
                risk_level,
                matched_patterns: matched,
                request: None,
            },
            PermissionAction::RequireConfirmation => {
                let request = self.register_pending(operation, risk_level, &matched);
                PermissionCheckResult {
                    status: CheckStatus::Pending,
                    risk_level,
                    matched_patterns: matched,
                    request: Some(request),
                }
            }
        }
    }

    fn register_pending(
        &self,
        operation: &Operation,
        risk_level: Option<RiskLevel>,
        matched: &[RiskPattern],
    ) -> PermissionRequest {
        let id = Uuid::new_v4();
        let (sender, receiver) = oneshot::channel();
        let response_timeout = self.policy.response_timeout(risk_level);
        let requested_at = Utc::now();

        self.resolvers.lock().unwrap().insert(
            id,
            PendingResolver {
                sender,
                pattern_ids: matched.iter().map(|p| p.id.clone()).collect(),
                critical: risk_level == Some(RiskLevel::Critical),
            },
        );
        self.waiters.lock().unwrap().insert(
            id,
            PendingWaiter {
                receiver,
                deadline: tokio::time::Instant::now() + response_timeout,
            },
        );

        tracing::info!(
            "Permission request {} pending ({:?}, {} pattern(s))",
            id,
            risk_level,
            matched.len()
        );

        PermissionRequest {
            id,
            pattern_names: matched.iter().map(|p| p.name.clone()).collect(),
            risk_level,
            description: format!("{}: {}", operation.category, operation.detail),
            requested_at,
            deadline: requested_at
                + chrono::Duration::from_std(response_timeout)
                    .unwrap_or_else(|_| chrono::Duration::seconds(0)),
        }
    }

    /// Suspend until the request is resolved, expires, or is cancelled
    ///
    /// Bounded by the risk-level response timeout. Cancellation (via
    /// [`cancel_request`](Self::cancel_request)) resolves immediately to
    /// `Expired` without waiting out the deadline.
    pub async fn await_decision(&self, request_id: Uuid) -> RouterResult<PermissionOutcome> {
        let waiter = self
            .waiters
            .lock()
            .unwrap()
            .remove(&request_id)
            .ok_or(RouterError::UnknownRequest(request_id))?;

        let outcome = match tokio::time::timeout_at(waiter.deadline, waiter.receiver).await {
            Ok(Ok(Decision::Approve)) => PermissionOutcome::Approved,
            Ok(Ok(Decision::Deny)) => PermissionOutcome::Denied {
                reason: "denied by user".to_string(),
            },
            // Sender dropped: the request was cancelled
            Ok(Err(_)) => PermissionOutcome::Expired {
                reason: "request cancelled".to_string(),
            },
            Err(_) => {
                self.resolvers.lock().unwrap().remove(&request_id);
                PermissionOutcome::Expired {
                    reason: "no response before deadline".to_string(),
                }
            }
        };

        tracing::info!("Permission request {} -> {:?}", request_id, outcome);
        Ok(outcome)
    }

    /// Resolve a pending request with the user's decision
    ///
    /// An approval records session grants for the matched patterns, unless
    /// the operation was critical (critical approvals are single-use).
    pub fn resolve_request(&self, request_id: Uuid, decision: Decision) -> RouterResult<()> {
        let pending = self
            .resolvers
            .lock()
            .unwrap()
            .remove(&request_id)
            .ok_or(RouterError::UnknownRequest(request_id))?;

        if decision == Decision::Approve && !pending.critical {
            for pattern_id in &pending.pattern_ids {
                self.grants.grant(pattern_id);
            }
        }

        // The waiter may already be gone (deadline raced the decision)
        let _ = pending.sender.send(decision);
        Ok(())
    }

    /// Cancel a pending request (e.g. the enclosing operation was aborted)
    ///
    /// The waiter observes `Expired` immediately.
    pub fn cancel_request(&self, request_id: Uuid) -> RouterResult<()> {
        self.resolvers
            .lock()
            .unwrap()
            .remove(&request_id)
            .ok_or(RouterError::UnknownRequest(request_id))?;
        // Dropping the sender wakes the waiter with a recv error
        Ok(())
    }

    /// Manually record a session grant for a pattern
    pub fn grant_session(&self, pattern_id: &str) {
        self.grants.grant(pattern_id);
    }

    /// Manually revoke a session grant; missing ids are a no-op
    pub fn revoke_session(&self, pattern_id: &str) {
        self.grants.revoke(pattern_id);
    }

    /// Drop all session grants (session boundary)
    pub fn clear_session_grants(&self) {
        self.grants.clear();
    }

    /// Number of session grants currently held
    pub fn session_grant_count(&self) -> usize {
        self.grants.len()
    }
}

fn deny_reason(matched: &[RiskPattern], risk_level: Option<RiskLevel>) -> String {
    match (matched.first(), risk_level) {
        (Some(pattern), Some(level)) => {
            format!("denied: matched '{}' ({} risk)", pattern.name, level)
        }
        _ => "denied by default action".to_string(),
    }
}
