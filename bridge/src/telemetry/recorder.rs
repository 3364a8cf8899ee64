//! Builds `EnforcementSession` records from an `EvaluationEngine` outcome
//! and hands them to a `HitlogWriter`, the conntrack-style hit logging the
//! teacher's own telemetry module framed this around.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rule_engine::{ActionResult, DecisionOutcome, EvaluationOutcome};
use uuid::Uuid;

use super::session::{EnforcementSession, SessionEvent};
use super::writer::HitlogWriter;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

pub struct TelemetryRecorder {
    writer: Arc<HitlogWriter>,
    config: TelemetryConfig,
}

impl TelemetryRecorder {
    pub fn new(writer: Arc<HitlogWriter>, config: TelemetryConfig) -> Self {
        Self { writer, config }
    }

    /// Records one `Enforce` call. Returns the session even when recording
    /// is disabled or the write fails, so the gRPC handler can still
    /// report latency/decision back to the caller.
    pub fn record(
        &self,
        agent_id: &str,
        flow_id: Option<&str>,
        outcome: &EvaluationOutcome,
        duration_us: u64,
    ) -> EnforcementSession {
        let session = EnforcementSession {
            session_id: Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            flow_id: flow_id.map(|s| s.to_string()),
            timestamp_ms: now_ms(),
            final_decision: decision_label(&outcome.decision).to_string(),
            rule_id: outcome.rule_id.map(|id| id.as_str()),
            rules_evaluated_count: outcome.rules_evaluated,
            duration_us,
            events: build_events(outcome),
        };

        if self.config.enabled {
            if let Err(e) = self.writer.append(&session) {
                log::warn!("hitlog write failed for session {}: {}", session.session_id, e);
            }
        }

        session
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn decision_label(decision: &DecisionOutcome) -> &'static str {
    match decision {
        DecisionOutcome::Allow { .. } => "allow",
        DecisionOutcome::Deny { .. } => "deny",
        DecisionOutcome::Rewrite { .. } => "rewrite",
        DecisionOutcome::Redact { .. } => "redact",
        DecisionOutcome::Route { .. } => "route",
        DecisionOutcome::SpawnSidecar { .. } => "spawn_sidecar",
        DecisionOutcome::RateLimit { .. } => "rate_limit",
        DecisionOutcome::SandboxExecute { .. } => "sandbox_execute",
        DecisionOutcome::ConstraintViolation { .. } => "constraint_violation",
        DecisionOutcome::Error { .. } => "error",
        DecisionOutcome::Skip => "skip",
    }
}

fn build_events(outcome: &EvaluationOutcome) -> Vec<SessionEvent> {
    let rule_id = outcome
        .rule_id
        .map(|id| id.as_str())
        .unwrap_or_else(|| "none".to_string());

    let mut events = Vec::with_capacity(outcome.action_results.len());
    for result in &outcome.action_results {
        let label = match result {
            ActionResult::Success { message, .. } => message.clone(),
            ActionResult::Denied { reason, .. } => reason.clone(),
            ActionResult::Failed { error, .. } => error.clone(),
            ActionResult::Timeout { elapsed } => format!("timeout after {:?}", elapsed),
            ActionResult::Skipped { reason } => reason.clone(),
        };
        events.push(SessionEvent::ActionExecuted {
            rule_id: rule_id.clone(),
            outcome: label,
        });
    }

    if let DecisionOutcome::ConstraintViolation { violation_type, .. } = &outcome.decision {
        events.push(SessionEvent::ConstraintViolated {
            rule_id,
            violation: violation_type.clone(),
        });
    }

    events
}
