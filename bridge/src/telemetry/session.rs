//! Session record shapes: the full per-event trace persisted to the
//! hitlog, keyed by `(tenant_id, agent_id, timestamp_ms, session_id)` per
//! spec section 6.

use serde::{Deserialize, Serialize};

/// One rule's evaluation within a session, carried so the hitlog record
/// contains every rule considered, not only the one that decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEvaluationEvent {
    pub rule_id: String,
    pub family: String,
    pub matched: bool,
    pub eval_time_us: u64,
}

/// A notable event within the session's lifetime, used for the full
/// (non-compact) hitlog record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    RuleEvaluated(RuleEvaluationEvent),
    ActionExecuted { rule_id: String, outcome: String },
    ConstraintViolated { rule_id: String, violation: String },
}

/// Full record of one `Enforce` call, as written to the hitlog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementSession {
    pub session_id: String,
    pub agent_id: String,
    pub flow_id: Option<String>,
    pub timestamp_ms: i64,
    pub final_decision: String,
    pub rule_id: Option<String>,
    pub rules_evaluated_count: usize,
    pub duration_us: u64,
    pub events: Vec<SessionEvent>,
}
