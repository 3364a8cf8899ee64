//Versioned Rule Bundle CRUD Operations
// Complete lifecycle management for rules and bundles with versioning, 
// state transitions, conflict resolution, and audit trails. 

// Design Principles (from your spec):
// 1. CreateRule → Validates, returns operation_handle, ACTIVE or STAGED based on rollout
// 2. UpdateRule → Version bump, preserves old version until new activated
// 3. DeactivateRule → Sets state to PAUSED, fast path stops applying
// 4. RevokeRule → Immediate unload, respects revocation policy
// 5. ListRules, GetRule, GetRuleStats → Query operations
// 6. Bundle operations supported
//
// State Transitions:
// - NEW → STAGED → ACTIVE → PAUSED → REVOKED
// - UpdateRule: ACTIVE(v1) → STAGED(v2) → ACTIVE(v2) → DEPRECATED(v1)
//
// Versioning:
// - Each update creates new version
// - Old versions preserved until new activated
// - Version history maintained
//
// Conflict Resolution:
// - Priority-based
// - Scope overlap detection
// - Automatic conflict handling

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, Duration, UNIX_EPOCH};
use serde::{Deserialize, Serialize};

use crate::rule_metadata::{RuleId, RuleMetadata, RuleScope};
use crate::rule_bundle::{Rule, BundleId, RuleBundle, RolloutPolicy};
use crate::rule_table::RuleTable;
use crate::hot_reload::{DeploymentManager, DeploymentStrategy, VersionId};
use crate::audit_record::{
    AuditRecord, AuditRecordBuilder, AuditTrail, DecisionOutcome, EvaluationTimestamps,
};

// ============================================================================
// Core Types
// ============================================================================

/// Rule lifecycle state, shared with [`crate::rule_metadata::RuleState`] so a
/// rule's state means the same thing whether read off `RuleMetadata` or off
/// its `VersionedRule` entry in the CRUD registry.
pub use crate::rule_metadata::RuleState;

/// Operation handle returned from CRUD operations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle {
    operation_id: String, 
    rule_id: RuleId, 
    timestamp: u64,
}

impl OperationHandle {
    fn new(rule_id: RuleId) -> Self {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let operation_id = format!("op_{}_{}", rule_id.as_str(), timestamp);
        Self {
            operation_id, 
            rule_id, 
            timestamp
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
    
    pub fn rule_id(&self) -> &RuleId {
        &self.rule_id
    }
}

/// Revocation policy for RevokeRule operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RevocationPolicy {
    /// Terminate active flows immediately
    Immediate, 
    /// Allow active flows to complete
    Graceful {timeout_seconds: u64},
    /// Drain: no new flows, wait for active to complete
    Drain {max_wait_seconds: u64},
}

impl Default for RevocationPolicy {
    fn default() -> Self {
        RevocationPolicy::Graceful { timeout_seconds: 30 }
    }
}

/// Versioned rule entry
#[derive(Debug, Clone)]
struct VersionedRule {
    rule: Rule,
    version: u32,
    state: RuleState,
    created_at: SystemTime,
    updated_at: SystemTime,
    created_by: String,
    updated_by: String,
}

impl VersionedRule {
    fn new(rule: Rule, created_by: String) -> Self {
        Self {
            rule,
            version: 1,
            state: RuleState::New,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
            created_by: created_by.clone(),
            updated_by: created_by,
        }
    }
    
    fn bump_version(&mut self, updated_by: String) {
        self.version += 1;
        self.updated_at = SystemTime::now();
        self.updated_by = updated_by;
    }
}

/// Rule statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleStats {
    pub rule_id: RuleId,
    pub version: u32,
    pub state: RuleState,
    pub evaluation_count: u64,
    pub match_count: u64,
    pub action_count: u64,
    pub error_count: u64,
    pub avg_latency_us: u64,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Conflict detection result
#[derive(Debug, Clone)]
pub struct ConflictInfo {
    pub conflicting_rule_id: RuleId,
    pub conflict_type: ConflictType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictType {
    /// Rules have same priority and overlapping scope
    PriorityConflict,
    /// Rules have conflicting actions
    ActionConflict,
    /// Scope completely overlaps
    ScopeOverlap,
}

// ============================================================================
// Rule Registry
// ============================================================================

/// Internal registry for versioned rules
struct RuleRegistry {
    /// Current active rules by rule_id
    active_rules: HashMap<RuleId, VersionedRule>,
    /// Staged rules (newer versions waiting activation)
    staged_rules: HashMap<RuleId, VersionedRule>,
    /// All rule versions (including deprecated)
    version_history: HashMap<RuleId, Vec<VersionedRule>>,
    /// Bundle associations
    bundle_rules: HashMap<BundleId, HashSet<RuleId>>,
}

impl RuleRegistry {
    fn new() -> Self {
        Self {
            active_rules: HashMap::new(),
            staged_rules: HashMap::new(),
            version_history: HashMap::new(),
            bundle_rules: HashMap::new(),
        }
    }

    fn add_rule(&mut self, rule_id: RuleId, versioned_rule: VersionedRule, bundle_id:Option<BundleId>) {
        // Add to version history
        self.version_history.entry(rule_id.clone()).or_insert_with(Vec::new).push(versioned_rule.clone());
        // Add to appropriate active/staged map
        match versioned_rule.state {
            RuleState::Active => {
                self.active_rules.insert(rule_id.clone(), versioned_rule);
            }
            RuleState::Staged => {
                self.staged_rules.insert(rule_id.clone(), versioned_rule);
            }
            _ => {}
        }
        // Track bundle association
        if let Some(bid) = bundle_id {
            self.bundle_rules
                .entry(bid)
                .or_insert_with(HashSet::new)
                .insert(rule_id);
        }
    }

    fn get_active_rule(&self, rule_id: &RuleId) -> Option<&VersionedRule> {
        self.active_rules.get(rule_id)
    }

    fn get_staged_rule(&self, rule_id: &RuleId) -> Option<&VersionedRule> {
        self.staged_rules.get(rule_id)
    }

    fn get_latest_version(&self, rule_id: &RuleId) -> Option<&VersionedRule> {
        self.version_history
            .get(rule_id)
            .and_then(|versions| versions.last())
    }

    fn update_state(&mut self, rule_id: &RuleId, new_state: RuleState) -> Result<(), String> {
        // Update in active/staged maps
        if let Some(rule) = self.active_rules.get_mut(rule_id) {
            rule.state = new_state.clone();
        }
        if let Some(rule) = self.staged_rules.get_mut(rule_id) {
            rule.state = new_state.clone();
        }

        // Update in version history
        if let Some(versions) = self.version_history.get_mut(rule_id) {
            if let Some(latest) = versions.last_mut() {
                latest.state = new_state;
            }
        }

        Ok(())
    }

    fn promote_staged_to_active(&mut self, rule_id: &RuleId) -> Result<(), String> {
        let staged = self
            .staged_rules
            .remove(rule_id)
            .ok_or_else(|| format!("No staged rule found for {}", rule_id.as_str()))?;

        // Deprecate old active version if exists
        if let Some(old_active) = self.active_rules.get_mut(rule_id) {
            old_active.state = RuleState::Deprecated;
        }

        // Set new rule as active
        let mut active_rule = staged;
        active_rule.state = RuleState::Active;
        self.active_rules.insert(rule_id.clone(), active_rule.clone());

        // Update version history
        if let Some(versions) = self.version_history.get_mut(rule_id) {
            if let Some(last) = versions.last_mut() {
                last.state = RuleState::Active;
            }
        }

        Ok(())
    }

    fn list_rules(&self, state_filter: Option<RuleState>) -> Vec<RuleId> {
        match state_filter {
            Some(RuleState::Active) => self.active_rules.keys().cloned().collect(),
            Some(RuleState::Staged) => self.staged_rules.keys().cloned().collect(),
            None => {
                let mut all: HashSet<RuleId> = HashSet::new();
                all.extend(self.active_rules.keys().cloned());
                all.extend(self.staged_rules.keys().cloned());
                all.into_iter().collect()
            }
            Some(state) => {
                self.version_history
                    .iter()
                    .filter(|(_, versions)| {
                        versions.last().map(|v| &v.state) == Some(&state)
                    })
                    .map(|(id, _)| id.clone())
                    .collect()
            }
        }
    }
}

// ============================================================================
// Bundle CRUD Manager
// ============================================================================

/// Main CRUD manager for versioned rule bundles

pub struct BundleCRUD {
    /// Internal rule registry
    registry: Arc<RwLock<RuleRegistry>>,
    /// Rule table for active rules
    rule_table: Arc<RuleTable>,
    /// Deployment manager for hot reload
    deployment_manager: Arc<DeploymentManager>,
    /// Audit chain for tracking operations
    audit_chain: Arc<AuditTrail>,
    /// Default rollout policy
    default_rollout: RolloutPolicy,
}

impl BundleCRUD {
    /// Create new CRUD manager
    pub fn new(
        rule_table: Arc<RuleTable>,
        deployment_manager: Arc<DeploymentManager>,
        audit_chain: Arc<AuditTrail>,
    ) -> Self {
        Self {
            registry: Arc::new(RwLock::new(RuleRegistry::new())),
            rule_table,
            deployment_manager,
            audit_chain,
            default_rollout: RolloutPolicy::Immediate,
        }
    }

    /// Create with custom default rollout policy
    pub fn with_rollout_policy(
        rule_table: Arc<RuleTable>,
        deployment_manager: Arc<DeploymentManager>,
        audit_chain: Arc<AuditTrail>,
        default_rollout: RolloutPolicy,
    ) -> Self {
        Self {
            registry: Arc::new(RwLock::new(RuleRegistry::new())),
            rule_table,
            deployment_manager,
            audit_chain,
            default_rollout,
        }
    }

    /// Append a lifecycle event (create/update/activate/...) to the audit chain.
    ///
    /// CRUD operations do not run a match/action pipeline, so there is no
    /// `DecisionOutcome` that fits naturally; the operation name and state
    /// transition are carried as metadata on an `Allow` record instead.
    fn record_lifecycle_event(
        &self,
        rule_id: &RuleId,
        rule_version: u64,
        operation: &str,
        actor: &str,
    ) {
        let seq = self.audit_chain.next_seq();
        let record = AuditRecordBuilder::new(seq, rule_id.as_str().to_string(), rule_version)
            .outcome(DecisionOutcome::Allow { metadata: None })
            .timestamps(EvaluationTimestamps::now())
            .add_metadata("operation".to_string(), operation.to_string())
            .add_metadata("actor".to_string(), actor.to_string())
            .log_level(crate::audit_record::AuditLogLevel::Low)
            .build();

        if let Ok(record) = record {
            self.audit_chain.add_record(record);
        }
    }

    // ========================================================================
    // CREATE Operation
    // ========================================================================

    /// CreateRule: Validates and creates a new rule
    /// Returns operation_handle (ACK)
    /// If cheap validation passes -> ACTIVE (immediate) or STAGED (rollout policy)
    pub fn create_rule(
        &self,
        rule: Rule,
        bundle_id: Option<BundleId>,
        rollout_policy: Option<RolloutPolicy>,
        created_by: String,
    ) -> Result<OperationHandle, String> {
        let rule_id = rule.metadata.rule_id.clone();
        
        // 1. Check if rule already exists
        let registry = self.registry.read().unwrap();
        if registry.get_latest_version(&rule_id).is_some() {
            return Err(format!("Rule {} already exists", rule_id.as_str()));
        }
        drop(registry);
        
        // 2. Cheap validation
        self.validate_rule(&rule)?;

        // 2b. Pre-compile regex/JSONPath matchers before this rule can ever
        // be staged or activated.
        rule.compile_matchers()
            .map_err(|e| format!("Failed to compile rule matchers: {e}"))?;

        // 3. Check for conflicts
        let conflicts = self.detect_conflicts(&rule)?;
        if !conflicts.is_empty() {
            return Err(format!(
                "Rule conflicts detected: {:?}",
                conflicts
                    .iter()
                    .map(|c| c.conflicting_rule_id.as_str())
                    .collect::<Vec<_>>()
            ));
        }

        // 4. Determine initial state based on rollout policy
        let policy = rollout_policy.unwrap_or(self.default_rollout.clone());
        let initial_state = match policy {
            RolloutPolicy::Immediate => RuleState::Active,
            _ => RuleState::Staged,
        };
        
        // 5. Create versioned rule
        let mut versioned_rule = VersionedRule::new(rule.clone(), created_by.clone());
        versioned_rule.state = initial_state.clone();
        
        // 6. Add to registry
        let mut registry = self.registry.write().unwrap();
        registry.add_rule(rule_id.clone(), versioned_rule, bundle_id.clone());
        drop(registry);
        
        // 7. If active, add to rule table
        if initial_state == RuleState::Active {
            self.rule_table.add_rule(rule.clone(), bundle_id.clone())?;
        }
        
        // 8. Audit the creation
        self.record_lifecycle_event(&rule_id, 1, "create_rule", &created_by);

        // 9. Return operation handle
        Ok(OperationHandle::new(rule_id))
    }
    // ========================================================================
    // UPDATE Operation
    // ========================================================================
    
    /// UpdateRule: Version bump and validation
    /// Preserves old version until new activated
    pub fn update_rule(
        &self,
        rule_id: &RuleId,
        updated_rule: Rule,
        updated_by: String,
    ) -> Result<OperationHandle, String> {
        // 1. Get current rule
        let registry = self.registry.read().unwrap();
        let current = registry
            .get_latest_version(rule_id)
            .ok_or_else(|| format!("Rule {} not found", rule_id.as_str()))?;
        
        let current_version = current.version;
        let bundle_id = current.rule.metadata.bundle_id.clone().map(BundleId::new);
        drop(registry);
        
        // 2. Validate updated rule
        self.validate_rule(&updated_rule)?;

        // 2b. Pre-compile regex/JSONPath matchers before staging.
        updated_rule
            .compile_matchers()
            .map_err(|e| format!("Failed to compile rule matchers: {e}"))?;

        // 3. Check for conflicts (excluding self)
        let conflicts = self.detect_conflicts_excluding(&updated_rule, rule_id)?;
        if !conflicts.is_empty() {
            return Err(format!("Update conflicts detected: {:?}", conflicts));
        }
        
        // 4. Create new version (staged)
        let mut new_version = VersionedRule::new(updated_rule.clone(), updated_by.clone());
        new_version.version = current_version + 1;
        new_version.state = RuleState::Staged;
        
        // 5. Add staged version to registry
        let mut registry = self.registry.write().unwrap();
        registry.add_rule(rule_id.clone(), new_version, bundle_id.clone());
        drop(registry);
        
        // Note: Old version remains active until new version is explicitly activated

        // 6. Audit the update
        self.record_lifecycle_event(rule_id, current_version + 1, "update_rule", &updated_by);

        Ok(OperationHandle::new(rule_id.clone()))
    }

    /// Activate a staged rule version
    pub fn activate_rule(&self, rule_id: &RuleId) -> Result<OperationHandle, String> {
        // 1. Get staged rule
        let registry = self.registry.read().unwrap();
        let staged = registry
            .get_staged_rule(rule_id)
            .ok_or_else(|| format!("No staged rule found for {}", rule_id.as_str()))?;
        
        let rule = staged.rule.clone();
        let bundle_id = staged.rule.metadata.bundle_id.clone().map(BundleId::new);
        drop(registry);

        // 1b. Re-compile matchers: cloning a Rule resets the regex cache, so
        // activation re-primes it rather than deferring to the hot path.
        rule.compile_matchers()
            .map_err(|e| format!("Failed to compile rule matchers: {e}"))?;

        // 2. Remove old version from rule table
        self.rule_table.remove_rule(rule_id).ok(); // Ignore error if not present

        // 3. Add new version to rule table
        self.rule_table.add_rule(rule.clone(), bundle_id)?;
        
        // 4. Promote staged to active in registry
        let mut registry = self.registry.write().unwrap();
        registry.promote_staged_to_active(rule_id)?;
        drop(registry);
        
        // 5. Record audit trail entry
        self.record_lifecycle_event(rule_id, rule.metadata.version, "activate_rule", "system");

        Ok(OperationHandle::new(rule_id.clone()))
    }

    // ========================================================================
    // DEACTIVATE Operation
    // ========================================================================
    
    /// DeactivateRule: Sets state to PAUSED
    /// Fast path stops applying this rule
    pub fn deactivate_rule(&self, rule_id: &RuleId) -> Result<OperationHandle, String> {
        // 1. Check if rule exists and is active
        let registry = self.registry.read().unwrap();
        let active = registry
            .get_active_rule(rule_id)
            .ok_or_else(|| format!("No active rule found for {}", rule_id.as_str()))?;
        
        if active.state != RuleState::Active {
            return Err(format!("Rule {} is not active", rule_id.as_str()));
        }
        let version = active.rule.metadata.version;
        drop(registry);

        // 2. Remove from rule table (fast path stops evaluating)
        self.rule_table.remove_rule(rule_id)?;

        // 3. Update state to PAUSED
        let mut registry = self.registry.write().unwrap();
        registry.update_state(rule_id, RuleState::Paused)?;
        drop(registry);

        // 4. Record audit trail entry
        self.record_lifecycle_event(rule_id, version, "deactivate_rule", "system");

        Ok(OperationHandle::new(rule_id.clone()))
    }

    /// Reactivate a paused rule
    pub fn reactivate_rule(&self, rule_id: &RuleId) -> Result<OperationHandle, String> {
        // 1. Check if rule is paused
        let registry = self.registry.read().unwrap();
        let paused = registry
            .get_active_rule(rule_id)
            .ok_or_else(|| format!("Rule {} not found", rule_id.as_str()))?;
        
        if paused.state != RuleState::Paused {
            return Err(format!("Rule {} is not paused", rule_id.as_str()));
        }

        let rule = paused.rule.clone();
        let version = rule.metadata.version;
        let bundle_id = paused.rule.metadata.bundle_id.clone().map(BundleId::new);
        drop(registry);

        // 2. Add back to rule table
        self.rule_table.add_rule(rule, bundle_id)?;

        // 3. Update state to ACTIVE
        let mut registry = self.registry.write().unwrap();
        registry.update_state(rule_id, RuleState::Active)?;
        drop(registry);

        // 4. Record audit trail entry
        self.record_lifecycle_event(rule_id, version, "reactivate_rule", "system");

        Ok(OperationHandle::new(rule_id.clone()))
    }

    // ========================================================================
    // REVOKE Operation
    // ========================================================================
    
    /// RevokeRule: Immediate unload
    /// Active flows handled per revocation policy
    pub fn revoke_rule(
        &self,
        rule_id: &RuleId,
        policy: RevocationPolicy,
    ) -> Result<OperationHandle, String> {
        // 1. Check if rule exists
        let registry = self.registry.read().unwrap();
        let rule = registry
            .get_latest_version(rule_id)
            .ok_or_else(|| format!("Rule {} not found", rule_id.as_str()))?;
        
        if rule.state == RuleState::Revoked {
            return Err(format!("Rule {} already revoked", rule_id.as_str()));
        }
        let version = rule.rule.metadata.version;
        drop(registry);
        
        // 2. Handle revocation based on policy
        match policy {
            RevocationPolicy::Immediate => {
                // Remove immediately from rule table
                self.rule_table.remove_rule(rule_id).ok();
            }
            RevocationPolicy::Graceful { timeout_seconds } => {
                // In production, would wait for active evaluations
                // For now, immediate removal after timeout
                std::thread::sleep(Duration::from_secs(timeout_seconds.min(5)));
                self.rule_table.remove_rule(rule_id).ok();
            }
            RevocationPolicy::Drain { max_wait_seconds } => {
                // Stop new evaluations, wait for active to complete
                // For now, simplified to timeout
                std::thread::sleep(Duration::from_secs(max_wait_seconds.min(10)));
                self.rule_table.remove_rule(rule_id).ok();
            }
        }
        // 3. Update state to REVOKED
        let mut registry = self.registry.write().unwrap();
        registry.update_state(rule_id, RuleState::Revoked)?;
        drop(registry);

        // 4. Record audit trail entry
        self.record_lifecycle_event(rule_id, version, "revoke_rule", "system");

        Ok(OperationHandle::new(rule_id.clone()))
    }

    // ========================================================================
    // QUERY Operations
    // ========================================================================
    
    /// ListRules: List all rules, optionally filtered by state
    pub fn list_rules(&self, state_filter: Option<RuleState>) -> Vec<RuleId> {
        let registry = self.registry.read().unwrap();
        registry.list_rules(state_filter)
    }
    
    /// GetRule: Get current version of a rule
    pub fn get_rule(&self, rule_id: &RuleId) -> Option<Rule> {
        let registry = self.registry.read().unwrap();
        registry
            .get_latest_version(rule_id)
            .map(|v| v.rule.clone())
    }

    /// GetRuleStats: Get statistics for a rule
    pub fn get_rule_stats(&self, rule_id: &RuleId) -> Option<RuleStats> {
        let registry = self.registry.read().unwrap();
        let versioned = registry.get_latest_version(rule_id)?;
        
        // Get stats from rule table
        let table_entry = self.rule_table.get_rule(rule_id)?;
        let table_stats = &table_entry.stats;
        
        Some(RuleStats {
            rule_id: rule_id.clone(),
            version: versioned.version,
            state: versioned.state.clone(),
            evaluation_count: table_stats.evaluation_count,
            match_count: table_stats.match_count,
            action_count: table_stats.action_count,
            error_count: table_stats.error_count,
            avg_latency_us: table_stats.avg_eval_time_us(),
            created_at: versioned.created_at,
            updated_at: versioned.updated_at,
        })
    }
    
    /// Get rule version history
    pub fn get_rule_history(&self, rule_id: &RuleId) -> Vec<u32> {
        let registry = self.registry.read().unwrap();
        registry
            .version_history
            .get(rule_id)
            .map(|versions| versions.iter().map(|v| v.version).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // BUNDLE Operations
    // ========================================================================
    
    /// Create entire bundle atomically
    pub fn create_bundle(
        &self,
        bundle: RuleBundle,
        rollout_policy: Option<RolloutPolicy>,
        created_by: String,
    ) -> Result<Vec<OperationHandle>, String> {
        let bundle_id = bundle.metadata.bundle_id.clone();
        let policy = rollout_policy.unwrap_or(bundle.metadata.rollout_policy.clone());
        
        let mut handles = Vec::new();
        
        // Create all rules in bundle
        for rule in bundle.rules {
            let handle = self.create_rule(
                rule,
                Some(bundle_id.clone()),
                Some(policy.clone()),
                created_by.clone(),
            )?;
            handles.push(handle);
        }
        
        Ok(handles)
    }

    /// Deactivate entire bundle
    pub fn deactivate_bundle(&self, bundle_id: &BundleId) -> Result<Vec<OperationHandle>, String> {
        let registry = self.registry.read().unwrap();
        let rule_ids = registry
            .bundle_rules
            .get(bundle_id)
            .ok_or_else(|| format!("Bundle {} not found", bundle_id.as_str()))?
            .clone();
        drop(registry);
        
        let mut handles = Vec::new();
        for rule_id in rule_ids {
            if let Ok(handle) = self.deactivate_rule(&rule_id) {
                handles.push(handle);
            }
        }
        
        Ok(handles)
    }
    
    /// Revoke entire bundle
    pub fn revoke_bundle(
        &self,
        bundle_id: &BundleId,
        policy: RevocationPolicy,
    ) -> Result<Vec<OperationHandle>, String> {
        let registry = self.registry.read().unwrap();
        let rule_ids = registry
            .bundle_rules
            .get(bundle_id)
            .ok_or_else(|| format!("Bundle {} not found", bundle_id.as_str()))?
            .clone();
        drop(registry);
        
        let mut handles = Vec::new();
        for rule_id in rule_ids {
            if let Ok(handle) = self.revoke_rule(&rule_id, policy.clone()) {
                handles.push(handle);
            }
        }
        
        Ok(handles)
    }

    // ========================================================================
    // Validation & Conflict Detection
    // ========================================================================
    
    /// Cheap validation (per design: quick checks before activation)
    fn validate_rule(&self, rule: &Rule) -> Result<(), String> {
        // 1. Check rule_id is not empty
        if rule.metadata.rule_id.as_str().is_empty() {
            return Err("Rule ID cannot be empty".to_string());
        }
        
        // 2. Check priority is reasonable
        if rule.metadata.priority > 10000 {
            return Err("Priority too high (max: 10000)".to_string());
        }
        
        // 3. Check scope is not completely empty
        let scope = &rule.metadata.scope;
        if scope.agent_ids.is_empty()
            && scope.flow_ids.is_empty()
            && scope.dest_agent_ids.is_empty()
            && scope.payload_dtypes.is_empty()
        {
            // Global rule - OK
        }
        
        // 4. Check match clause is valid
        // (In production, would compile match expressions)

        // 5. Check action clause is valid
        // Action clause always has at least a primary_action, so no need to check

        Ok(())
    }

    /// Detect conflicts with existing rules
    fn detect_conflicts(&self, rule: &Rule) -> Result<Vec<ConflictInfo>, String> {
        let registry = self.registry.read().unwrap();
        let mut conflicts = Vec::new();
        
        // Check against all active rules
        for (existing_id, existing) in &registry.active_rules {
            if let Some(conflict) = self.check_conflict(&rule, &existing.rule) {
                conflicts.push(ConflictInfo {
                    conflicting_rule_id: existing_id.clone(),
                    conflict_type: conflict,
                    description: format!(
                        "Conflicts with existing rule {}",
                        existing_id.as_str()
                    ),
                });
            }
        }
        
        Ok(conflicts)
    }

    /// Detect conflicts excluding a specific rule (for updates)
    fn detect_conflicts_excluding(
        &self,
        rule: &Rule,
        exclude_id: &RuleId,
    ) -> Result<Vec<ConflictInfo>, String> {
        let registry = self.registry.read().unwrap();
        let mut conflicts = Vec::new();
        
        for (existing_id, existing) in &registry.active_rules {
            if existing_id == exclude_id {
                continue;
            }
            
            if let Some(conflict) = self.check_conflict(&rule, &existing.rule) {
                conflicts.push(ConflictInfo {
                    conflicting_rule_id: existing_id.clone(),
                    conflict_type: conflict,
                    description: format!(
                        "Conflicts with existing rule {}",
                        existing_id.as_str()
                    ),
                });
            }
        }
        
        Ok(conflicts)
    }

    /// Check if two rules conflict
    fn check_conflict(&self, rule1: &Rule, rule2: &Rule) -> Option<ConflictType> {
        // 1. Check priority conflict with scope overlap
        if rule1.metadata.priority == rule2.metadata.priority {
            if Self::scopes_overlap(&rule1.metadata.scope, &rule2.metadata.scope) {
                return Some(ConflictType::PriorityConflict);
            }
        }
        
        // 2. Check action conflict (e.g., ALLOW vs DENY)
        if Self::actions_conflict(&rule1.action_clause, &rule2.action_clause) {
            if Self::scopes_overlap(&rule1.metadata.scope, &rule2.metadata.scope) {
                return Some(ConflictType::ActionConflict);
            }
        }
        
        None
    }
    
    fn scopes_overlap(scope1: &RuleScope, scope2: &RuleScope) -> bool {
        scope1.overlaps(scope2)
    }

    fn actions_conflict(
        action1: &crate::action_clause::ActionClause,
        action2: &crate::action_clause::ActionClause,
    ) -> bool {
        use crate::action_clause::ActionType;

        // Simplified: check for ALLOW vs DENY
        let has_allow1 = matches!(action1.primary_action, ActionType::Allow(_))
            || action1.secondary_actions.iter().any(|a| matches!(a, ActionType::Allow(_)));
        let has_deny1 = matches!(action1.primary_action, ActionType::Deny(_))
            || action1.secondary_actions.iter().any(|a| matches!(a, ActionType::Deny(_)));
        let has_allow2 = matches!(action2.primary_action, ActionType::Allow(_))
            || action2.secondary_actions.iter().any(|a| matches!(a, ActionType::Allow(_)));
        let has_deny2 = matches!(action2.primary_action, ActionType::Deny(_))
            || action2.secondary_actions.iter().any(|a| matches!(a, ActionType::Deny(_)));

        (has_allow1 && has_deny2) || (has_deny1 && has_allow2)
    }
}

// Thread-safety markers
unsafe impl Send for BundleCRUD {}
unsafe impl Sync for BundleCRUD {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_clause::{ActionClause, ActionType, AllowParams, DenyParams};
    use crate::audit_record::AuditTrail;
    use crate::execution_constraints::ExecutionConstraints;
    use crate::match_clause::MatchClause;
    use crate::rule_family::RuleFamily;
    use crate::rule_metadata::EnforcementMode;

    fn rule_with(action: ActionType, priority: i32) -> Rule {
        let mut metadata = RuleMetadata::new(
            "sec-team".to_string(),
            RuleScope::global(),
            EnforcementMode::Hard,
            RuleFamily::InputSchema,
        );
        metadata.priority = priority;
        Rule {
            metadata,
            match_clause: MatchClause::new(),
            action_clause: ActionClause::new(action),
            constraints: ExecutionConstraints::fast_rule(),
            description: None,
            tags: Vec::new(),
        }
    }

    fn crud() -> BundleCRUD {
        BundleCRUD::new(
            Arc::new(RuleTable::new()),
            Arc::new(DeploymentManager::new()),
            Arc::new(AuditTrail::new(100)),
        )
    }

    #[test]
    fn create_rule_with_immediate_rollout_is_active() {
        let crud = crud();
        let rule = rule_with(ActionType::Allow(AllowParams::default()), 10);
        let rule_id = rule.metadata.rule_id;

        crud.create_rule(rule, None, Some(RolloutPolicy::Immediate), "alice".to_string())
            .unwrap();

        let fetched = crud.get_rule(&rule_id).expect("rule should exist");
        assert_eq!(fetched.metadata.rule_id, rule_id);
        assert!(crud.rule_table.get_rule(&rule_id).is_some());
    }

    #[test]
    fn create_rule_rejects_duplicate_id() {
        let crud = crud();
        let rule = rule_with(ActionType::Allow(AllowParams::default()), 10);
        let duplicate = Rule {
            metadata: rule.metadata.clone(),
            match_clause: MatchClause::new(),
            action_clause: ActionClause::new(ActionType::Allow(AllowParams::default())),
            constraints: ExecutionConstraints::fast_rule(),
            description: None,
            tags: Vec::new(),
        };

        crud.create_rule(rule, None, Some(RolloutPolicy::Immediate), "alice".to_string())
            .unwrap();
        let result = crud.create_rule(duplicate, None, Some(RolloutPolicy::Immediate), "alice".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn create_rule_detects_priority_conflict_between_overlapping_allow_and_deny() {
        let crud = crud();
        let allow_rule = rule_with(ActionType::Allow(AllowParams::default()), 50);
        crud.create_rule(
            allow_rule,
            None,
            Some(RolloutPolicy::Immediate),
            "alice".to_string(),
        )
        .unwrap();

        let deny_rule = rule_with(ActionType::Deny(DenyParams::default()), 50);
        let result = crud.create_rule(deny_rule, None, Some(RolloutPolicy::Immediate), "alice".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn update_then_activate_rule_promotes_staged_version() {
        let crud = crud();
        let rule = rule_with(ActionType::Allow(AllowParams::default()), 10);
        let rule_id = rule.metadata.rule_id;
        crud.create_rule(rule, None, Some(RolloutPolicy::Immediate), "alice".to_string())
            .unwrap();

        let mut updated = rule_with(ActionType::Allow(AllowParams::default()), 20);
        updated.metadata.rule_id = rule_id;
        crud.update_rule(&rule_id, updated, "alice".to_string()).unwrap();

        // Old version still active until explicitly activated.
        assert_eq!(crud.get_rule(&rule_id).unwrap().metadata.priority, 20);
        assert_eq!(crud.get_rule_history(&rule_id), vec![1, 2]);

        crud.activate_rule(&rule_id).unwrap();
        let history = crud.list_rules(Some(RuleState::Active));
        assert!(history.contains(&rule_id));
    }

    #[test]
    fn deactivate_then_reactivate_round_trips() {
        let crud = crud();
        let rule = rule_with(ActionType::Allow(AllowParams::default()), 10);
        let rule_id = rule.metadata.rule_id;
        crud.create_rule(rule, None, Some(RolloutPolicy::Immediate), "alice".to_string())
            .unwrap();

        crud.deactivate_rule(&rule_id).unwrap();
        assert!(crud.rule_table.get_rule(&rule_id).is_none());

        crud.reactivate_rule(&rule_id).unwrap();
        assert!(crud.rule_table.get_rule(&rule_id).is_some());
    }

    #[test]
    fn revoke_rule_removes_from_table_and_marks_revoked() {
        let crud = crud();
        let rule = rule_with(ActionType::Allow(AllowParams::default()), 10);
        let rule_id = rule.metadata.rule_id;
        crud.create_rule(rule, None, Some(RolloutPolicy::Immediate), "alice".to_string())
            .unwrap();

        crud.revoke_rule(&rule_id, RevocationPolicy::Immediate).unwrap();

        assert!(crud.rule_table.get_rule(&rule_id).is_none());
        let result = crud.revoke_rule(&rule_id, RevocationPolicy::Immediate);
        assert!(result.is_err());
    }

    #[test]
    fn create_bundle_creates_every_rule_in_it() {
        let crud = crud();
        let mut bundle = RuleBundle::new(BundleId::new("bundle-1".to_string()), "sec-team".to_string());
        bundle.add_rule(rule_with(ActionType::Allow(AllowParams::default()), 10));
        bundle.add_rule(rule_with(
            ActionType::Log(crate::action_clause::LogParams {
                level: crate::action_clause::LogLevel::Info,
                message: "hit".to_string(),
                include_payload: false,
                structured_data: None,
            }),
            20,
        ));

        let handles = crud
            .create_bundle(bundle, Some(RolloutPolicy::Immediate), "alice".to_string())
            .unwrap();

        assert_eq!(handles.len(), 2);
        assert_eq!(crud.rule_table.len(), 2);
    }
}



