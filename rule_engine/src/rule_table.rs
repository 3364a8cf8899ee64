// In memory rule storage with multi index Lookups.
// High performance rule storage with read optimised indexing, lock free reads
// and atomic hot-reload support

// Design Principles:
// 1. Lock-free reads for zero contention on evaluation hot-path
// 2. Multi-index lookups: O(1) access by agent_id, flow_id, dtype
// 3. Copy-on-write updates for atomic hot-reload without stalling readers
// 4. Decision caching with TTL for repeated evaluations
// 5. Per-rule metrics tracking for observability
// 6. Thread-safe operations (Send + Sync)
// 7. Partitioned by RuleFamily: each family is an independent FamilyTable,
//    so a bundle load that touches one family never perturbs the others'
//    snapshots and evaluation of one layer never scans another's rules.
//
// Architecture:
// - FamilyIndexes: Immutable per-family index structure (lock-free reads via Arc)
// - RuleTable: map RuleFamily -> FamilyIndexes, each behind its own
//   atomic-pointer-swap cell
// - RuleEntry: Rule + metadata + statistics
// - RuleQuery: Fluent query builder for complex lookups, scoped to a family
//
// Memory Model:
// - Readers: Acquire Arc reference (no locks, no contention)
// - Writers: Clone the touched family's index structure, modify, atomic swap
// - Trade-off: Memory overhead for write latency vs. read throughput

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use serde::{Deserialize, Serialize};

use crate::rule_bundle::{BundleId, Rule};
use crate::rule_family::RuleFamily;
use crate::rule_metadata::RuleId;

// ============================================================================
// Core Types
// ============================================================================

/// Rule entry in the table with metadata and statistics
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// The rule itself
    pub rule: Rule,
    /// When the rule was activated
    pub activated_at: SystemTime,
    /// Which bundle this rule belongs to
    pub bundle_id: Option<BundleId>,
    /// Execution statistics
    pub stats: RuleStats,
}

impl RuleEntry {
    ///Create a new rule entry
    pub fn new(rule: Rule, bundle_id: Option<BundleId>) -> Self {
        Self {
            rule,
            activated_at: SystemTime::now(),
            bundle_id,
            stats: RuleStats::new(),
        }
    }

    /// Get Rule ID
    pub fn rule_id(&self) -> &RuleId {
        &self.rule.metadata.rule_id
    }

    /// Get rule priority (higher = more important)
    pub fn priority(&self) -> i32 {
        self.rule.metadata.priority
    }

    /// Get the rule's family
    pub fn family(&self) -> RuleFamily {
        self.rule.metadata.family
    }

    /// Check if the rule is active based on constraints
    pub fn is_active(&self, _now: SystemTime) -> bool {
        // Currently no time-based constraints in ExecutionConstraints
        // This method is a placeholder for future constraint checks
        true
    }
}

/// Per Rule execution Statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleStats {
    /// Number of times rule was evaluated
    pub evaluation_count: u64,
    /// Number of times rule matched
    pub match_count: u64,
    /// Number of times action was executed
    pub action_count: u64,
    /// Total eval time in microseconds
    pub total_eval_time_us: u64,
    #[serde(skip)]
    /// Last Eval timestamp
    pub last_evaluated: Option<SystemTime>,
    /// Error Count
    pub error_count: u64,
}

impl RuleStats {
    ///Create a new statistics tracker
    pub fn new() -> Self {
        Self {
            evaluation_count: 0,
            match_count: 0,
            action_count: 0,
            total_eval_time_us: 0,
            last_evaluated: None,
            error_count: 0,
        }
    }

    /// Record an evaluation
    pub fn record_evaluation(&mut self, matched: bool, eval_time_us: u64) {
        self.evaluation_count += 1;
        self.total_eval_time_us += eval_time_us;
        self.last_evaluated = Some(SystemTime::now());

        if matched {
            self.match_count += 1;
        }
    }

    /// Record an action execution
    pub fn record_action(&mut self) {
        self.action_count += 1;
    }

    /// Record an error
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    /// Get average evaluation time in microseconds
    pub fn avg_eval_time_us(&self) -> u64 {
        if self.evaluation_count == 0 {
            0
        } else {
            self.total_eval_time_us / self.evaluation_count
        }
    }

    /// Get match rate (0.0 to 1.0)
    pub fn match_rate(&self) -> f64 {
        if self.evaluation_count == 0 {
            0.0
        } else {
            self.match_count as f64 / self.evaluation_count as f64
        }
    }
}

impl Default for RuleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Multi-Index Structure (Immutable for Lock-Free Reads)
// ============================================================================

/// Immutable multi-index structure for fast rule lookups within a single
/// family. This structure is cloned on write and atomically swapped.
#[derive(Debug, Clone)]
struct FamilyIndexes {
    /// Primary index: rule_id -> rule entry
    by_id: HashMap<RuleId, Arc<RuleEntry>>,

    /// Secondary index: agent_id -> list of rules
    by_agent: HashMap<String, Vec<Arc<RuleEntry>>>,

    /// Secondary index: flow_id -> list of rules
    by_flow: HashMap<String, Vec<Arc<RuleEntry>>>,

    /// Secondary index: dest_agent -> list of rules
    by_dest_agent: HashMap<String, Vec<Arc<RuleEntry>>>,

    /// Secondary index: payload dtype -> list of rules
    by_dtype: HashMap<String, Vec<Arc<RuleEntry>>>,

    /// Global rules (apply to all agents/flows within this family)
    global: Vec<Arc<RuleEntry>>,
}

impl FamilyIndexes {
    /// Create empty indexes
    fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_agent: HashMap::new(),
            by_flow: HashMap::new(),
            by_dest_agent: HashMap::new(),
            by_dtype: HashMap::new(),
            global: Vec::new(),
        }
    }

    /// Get rule by ID
    fn get(&self, rule_id: &RuleId) -> Option<Arc<RuleEntry>> {
        self.by_id.get(rule_id).cloned()
    }

    /// Query rules with Criteria
    fn query(&self, query: &RuleQuery) -> Vec<Arc<RuleEntry>> {
        let mut results: Vec<Arc<RuleEntry>> = Vec::new();
        let mut seen_ids: HashSet<RuleId> = HashSet::new();
        let now = SystemTime::now();

        // Always include global rules
        for entry in &self.global {
            if entry.is_active(now) && seen_ids.insert(*entry.rule_id()) {
                results.push(Arc::clone(entry));
            }
        }

        //Add rules matching agent_id
        if let Some(agent_id) = &query.agent_id {
            if let Some(entries) = self.by_agent.get(agent_id) {
                for entry in entries {
                    if entry.is_active(now) && seen_ids.insert(*entry.rule_id()) {
                        results.push(Arc::clone(entry));
                    }
                }
            }
        }

        // Add rules matching flow_id
        if let Some(flow_id) = &query.flow_id {
            if let Some(entries) = self.by_flow.get(flow_id) {
                for entry in entries {
                    if entry.is_active(now) && seen_ids.insert(*entry.rule_id()) {
                        results.push(Arc::clone(entry));
                    }
                }
            }
        }

        // Add rules matching dest_agent
        if let Some(dest_agent) = &query.dest_agent {
            if let Some(entries) = self.by_dest_agent.get(dest_agent) {
                for entry in entries {
                    if entry.is_active(now) && seen_ids.insert(*entry.rule_id()) {
                        results.push(Arc::clone(entry));
                    }
                }
            }
        }
        // Add rules matching dtype
        if let Some(dtype) = &query.dtype {
            if let Some(entries) = self.by_dtype.get(dtype) {
                for entry in entries {
                    if entry.is_active(now) && seen_ids.insert(*entry.rule_id()) {
                        results.push(Arc::clone(entry));
                    }
                }
            }
        }

        // Sort by priority (highest first)
        results.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| a.rule_id().as_str().cmp(&b.rule_id().as_str()))
        });

        results
    }

    /// Add a rule to all the relevant indexes
    fn add(&mut self, entry: Arc<RuleEntry>) {
        let rule_id = *entry.rule_id();
        //Primary index
        self.by_id.insert(rule_id, Arc::clone(&entry));

        // Determine which secondary indexes to update
        let scope = &entry.rule.metadata.scope;

        // Check if this is a global rule
        let is_global = scope.is_global()
            || (scope.agent_ids.is_empty()
                && scope.flow_ids.is_empty()
                && scope.dest_agent_ids.is_empty()
                && scope.payload_dtypes.is_empty());

        if is_global {
            self.global.push(Arc::clone(&entry));
        }

        // Index by agent_ids
        for agent_id in &scope.agent_ids {
            self.by_agent
                .entry(agent_id.as_str().to_string())
                .or_insert_with(Vec::new)
                .push(Arc::clone(&entry));
        }

        // Index by flow_ids
        for flow_id in &scope.flow_ids {
            self.by_flow
                .entry(flow_id.as_str().to_string())
                .or_insert_with(Vec::new)
                .push(Arc::clone(&entry));
        }

        // Index by dest agent ids
        for dest_agent in &scope.dest_agent_ids {
            self.by_dest_agent
                .entry(dest_agent.as_str().to_string())
                .or_insert_with(Vec::new)
                .push(Arc::clone(&entry));
        }

        // Index by payload dtypes
        for dtype in &scope.payload_dtypes {
            self.by_dtype
                .entry(dtype.clone())
                .or_insert_with(Vec::new)
                .push(Arc::clone(&entry));
        }
    }

    /// Remove a rule from all the indexes
    fn remove(&mut self, rule_id: &RuleId) -> Option<Arc<RuleEntry>> {
        // Remove from primary index
        let entry = self.by_id.remove(rule_id)?;

        let scope = &entry.rule.metadata.scope;

        // Remove from global rules
        self.global.retain(|e| e.rule_id() != rule_id);

        // Remove from agent index
        for agent_id in &scope.agent_ids {
            if let Some(entries) = self.by_agent.get_mut(agent_id.as_str()) {
                entries.retain(|e| e.rule_id() != rule_id);
            }
        }

        // Remove from flow index
        for flow_id in &scope.flow_ids {
            if let Some(entries) = self.by_flow.get_mut(flow_id.as_str()) {
                entries.retain(|e| e.rule_id() != rule_id);
            }
        }

        // Remove from dest_agent index
        for dest_agent in &scope.dest_agent_ids {
            if let Some(entries) = self.by_dest_agent.get_mut(dest_agent.as_str()) {
                entries.retain(|e| e.rule_id() != rule_id);
            }
        }

        // Remove from dtype index
        for dtype in &scope.payload_dtypes {
            if let Some(entries) = self.by_dtype.get_mut(dtype) {
                entries.retain(|e| e.rule_id() != rule_id);
            }
        }

        Some(entry)
    }

    /// Get total rule count
    fn len(&self) -> usize {
        self.by_id.len()
    }
}

// ============================================================================
// Query Builder
// ============================================================================

/// Fluent Query builder for rule lookups. A query is always scoped to a
/// single family (or, if `family` is left unset, scans every family's
/// partition and merges the results) since a family is the unit of
/// evaluation-time iteration.
#[derive(Debug, Clone, Default)]
pub struct RuleQuery {
    /// Restrict the query to a single family's partition
    pub family: Option<RuleFamily>,
    /// Filter by source agent ID
    pub agent_id: Option<String>,
    /// Filter by Flow ID
    pub flow_id: Option<String>,
    /// Filter by Destination agnet id
    pub dest_agent: Option<String>,
    /// Filter by pyaload data type
    pub dtype: Option<String>,
}

impl RuleQuery {
    /// Create new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single family
    pub fn with_family(mut self, family: RuleFamily) -> Self {
        self.family = Some(family);
        self
    }

    /// Add agent_id filter
    pub fn with_agent(mut self, agent_id: String) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    /// Add flow_id filter
    pub fn with_flow(mut self, flow_id: String) -> Self {
        self.flow_id = Some(flow_id);
        self
    }

    /// Add dest_agent filter
    pub fn with_dest_agent(mut self, dest_agent: String) -> Self {
        self.dest_agent = Some(dest_agent);
        self
    }

    /// Add dtype filter
    pub fn with_dtype(mut self, dtype: String) -> Self {
        self.dtype = Some(dtype);
        self
    }
}

// ============================================================================
// Decision Cache
// ============================================================================

/// Cache key for rule decisions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    agent_id: String,
    flow_id: String,
    event_hash: u64,
}

impl CacheKey {
    fn new(agent_id: String, flow_id: String, event_hash: u64) -> Self {
        Self {
            agent_id,
            flow_id,
            event_hash,
        }
    }
}

///Cached decision entry
#[derive(Debug, Clone)]
struct CacheEntry {
    rule_id: RuleId,
    decision: String,
    cached_at: SystemTime,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        SystemTime::now()
            .duration_since(self.cached_at)
            .map(|d| d > ttl)
            .unwrap_or(true)
    }
}

// ============================================================================
// Per-Family Partition
// ============================================================================

/// One family's slice of the table: an atomically-swapped snapshot of its
/// indexes. This is what spec calls a FamilyTable.
struct FamilyTable {
    indexes: RwLock<Arc<FamilyIndexes>>,
}

impl FamilyTable {
    fn new() -> Self {
        Self {
            indexes: RwLock::new(Arc::new(FamilyIndexes::new())),
        }
    }

    fn snapshot(&self) -> Arc<FamilyIndexes> {
        Arc::clone(&*self.indexes.read().unwrap())
    }

    /// Apply a copy-on-write mutation and atomically publish the result.
    fn mutate<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut FamilyIndexes) -> R,
    {
        let lock = self.indexes.write().unwrap();
        let mut new_indexes = (**lock).clone();
        let result = f(&mut new_indexes);
        drop(lock);
        *self.indexes.write().unwrap() = Arc::new(new_indexes);
        result
    }
}

// ============================================================================
// Main RuleTable
// ============================================================================

/// High-performance in-memory rule table, partitioned by RuleFamily.
///
/// Key Features:
/// - Lock-free reads via Arc (zero contention on hot path)
/// - Copy-on-write updates with atomic pointer swap, scoped to one family
/// - Multi-index lookups within a family: agent_id, flow_id, dest_agent, dtype
/// - Decision caching with configurable TTL
/// - Per-rule statistics tracking
/// - Thread-safe (Send + Sync)
pub struct RuleTable {
    /// One partition per family, created lazily on first write.
    families: RwLock<HashMap<RuleFamily, Arc<FamilyTable>>>,

    /// rule_id -> family, so remove/update-by-id doesn't need the caller to
    /// already know which partition a rule lives in.
    id_to_family: RwLock<HashMap<RuleId, RuleFamily>>,

    /// Decision cache (short-lived), shared across all families.
    cache: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,

    /// Cache TTL in seconds
    cache_ttl_seconds: u64,

    /// Maximum cache size
    max_cache_size: usize,
}

impl RuleTable {
    /// Create new rule table
    pub fn new() -> Self {
        Self::with_config(60, 10000)
    }

    /// Create new rule table with custom cache configuration
    pub fn with_config(cache_ttl_seconds: u64, max_cache_size: usize) -> Self {
        Self {
            families: RwLock::new(HashMap::new()),
            id_to_family: RwLock::new(HashMap::new()),
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds,
            max_cache_size,
        }
    }

    fn family_table(&self, family: RuleFamily) -> Arc<FamilyTable> {
        if let Some(table) = self.families.read().unwrap().get(&family) {
            return Arc::clone(table);
        }
        let mut families = self.families.write().unwrap();
        Arc::clone(
            families
                .entry(family)
                .or_insert_with(|| Arc::new(FamilyTable::new())),
        )
    }

    // ========================================================================
    // Lock-Free Read Operations
    // ========================================================================

    /// Get rule by ID (lock-free once the owning family is known)
    pub fn get_rule(&self, rule_id: &RuleId) -> Option<Arc<RuleEntry>> {
        let family = *self.id_to_family.read().unwrap().get(rule_id)?;
        self.family_table(family).snapshot().get(rule_id)
    }

    /// Query rules matching criteria. If `query.family` is set, only that
    /// family's partition is scanned; otherwise every known family is
    /// scanned and merged (used for cross-layer admin queries, not the
    /// per-layer evaluation hot path).
    pub fn query(&self, query: &RuleQuery) -> Vec<Arc<RuleEntry>> {
        if let Some(family) = query.family {
            return self.family_table(family).snapshot().query(query);
        }

        let families: Vec<Arc<FamilyTable>> =
            self.families.read().unwrap().values().cloned().collect();

        let mut results: Vec<Arc<RuleEntry>> = Vec::new();
        for table in families {
            results.extend(table.snapshot().query(query));
        }
        results.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| a.rule_id().as_str().cmp(&b.rule_id().as_str()))
        });
        results
    }

    /// Query a single family, in family/layer-partitioned evaluation order.
    pub fn query_family(&self, family: RuleFamily, query: &RuleQuery) -> Vec<Arc<RuleEntry>> {
        self.family_table(family).snapshot().query(query)
    }

    /// Get total rule count across every family (lock-free per partition)
    pub fn len(&self) -> usize {
        let families: Vec<Arc<FamilyTable>> =
            self.families.read().unwrap().values().cloned().collect();
        families.iter().map(|t| t.snapshot().len()).sum()
    }

    /// Check if table is empty (lock-free)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List every family that currently holds at least one rule.
    pub fn active_families(&self) -> Vec<RuleFamily> {
        self.families
            .read()
            .unwrap()
            .iter()
            .filter(|(_, t)| t.snapshot().len() > 0)
            .map(|(f, _)| *f)
            .collect()
    }

    // ========================================================================
    // Write Operations (Copy-on-Write, scoped to one family)
    // ========================================================================

    /// Add a rule to the table, partitioned under its own family.
    pub fn add_rule(&self, rule: Rule, bundle_id: Option<BundleId>) -> Result<(), String> {
        let family = rule.metadata.family;
        let entry = Arc::new(RuleEntry::new(rule, bundle_id));
        let rule_id = *entry.rule_id();

        {
            let mut id_map = self.id_to_family.write().unwrap();
            if id_map.contains_key(&rule_id) {
                return Err(format!("Rule {} already exists", rule_id.as_str()));
            }
            id_map.insert(rule_id, family);
        }

        let table = self.family_table(family);
        let result = table.mutate(|indexes| {
            if indexes.by_id.contains_key(&rule_id) {
                return Err(format!("Rule {} already exists", rule_id.as_str()));
            }
            indexes.add(entry);
            Ok(())
        });

        if result.is_err() {
            self.id_to_family.write().unwrap().remove(&rule_id);
        }
        result
    }

    /// Remove a rule from the table.
    pub fn remove_rule(&self, rule_id: &RuleId) -> Result<Arc<RuleEntry>, String> {
        let family = self
            .id_to_family
            .write()
            .unwrap()
            .remove(rule_id)
            .ok_or_else(|| format!("Rule {} not found", rule_id.as_str()))?;

        let table = self.family_table(family);
        table.mutate(|indexes| {
            indexes
                .remove(rule_id)
                .ok_or_else(|| format!("Rule {} not found", rule_id.as_str()))
        })
    }

    /// Load multiple rules from a bundle atomically. Rules are grouped by
    /// family and each family's partition is swapped independently, but the
    /// rule_id -> family bookkeeping is updated up front so a concurrent
    /// reader never observes a rule_id with no owning family.
    pub fn load_bundle(&self, rules: Vec<Rule>, bundle_id: BundleId) -> Result<usize, String> {
        let mut by_family: HashMap<RuleFamily, Vec<Arc<RuleEntry>>> = HashMap::new();
        for rule in rules {
            let family = rule.metadata.family;
            let entry = Arc::new(RuleEntry::new(rule, Some(bundle_id.clone())));
            by_family.entry(family).or_default().push(entry);
        }

        // Check for duplicates up front, across all touched families.
        {
            let id_map = self.id_to_family.read().unwrap();
            for entries in by_family.values() {
                for entry in entries {
                    if id_map.contains_key(entry.rule_id()) {
                        return Err(format!("Rule {} already exists", entry.rule_id().as_str()));
                    }
                }
            }
        }

        let mut count = 0;
        for (family, entries) in by_family {
            let table = self.family_table(family);
            table.mutate(|indexes| {
                for entry in &entries {
                    indexes.add(Arc::clone(entry));
                }
            });
            let mut id_map = self.id_to_family.write().unwrap();
            for entry in &entries {
                id_map.insert(*entry.rule_id(), family);
            }
            count += entries.len();
        }

        Ok(count)
    }

    /// Unload all rules from a bundle, across every family partition.
    pub fn unload_bundle(&self, bundle_id: &BundleId) -> Result<usize, String> {
        let families: Vec<(RuleFamily, Arc<FamilyTable>)> = self
            .families
            .read()
            .unwrap()
            .iter()
            .map(|(f, t)| (*f, Arc::clone(t)))
            .collect();

        let mut total = 0;
        for (_family, table) in families {
            let removed = table.mutate(|indexes| {
                let rule_ids: Vec<RuleId> = indexes
                    .by_id
                    .values()
                    .filter(|entry| entry.bundle_id.as_ref() == Some(bundle_id))
                    .map(|entry| *entry.rule_id())
                    .collect();
                for rule_id in &rule_ids {
                    indexes.remove(rule_id);
                }
                rule_ids
            });

            if !removed.is_empty() {
                let mut id_map = self.id_to_family.write().unwrap();
                for rule_id in &removed {
                    id_map.remove(rule_id);
                }
                total += removed.len();
            }
        }

        Ok(total)
    }

    /// Update rule statistics
    pub fn update_stats<F>(&self, rule_id: &RuleId, update_fn: F) -> Result<(), String>
    where
        F: FnOnce(&mut RuleStats),
    {
        let family = *self
            .id_to_family
            .read()
            .unwrap()
            .get(rule_id)
            .ok_or_else(|| format!("Rule {} not found", rule_id.as_str()))?;

        let table = self.family_table(family);
        table.mutate(|indexes| {
            let entry = indexes
                .by_id
                .get_mut(rule_id)
                .ok_or_else(|| format!("Rule {} not found", rule_id.as_str()))?;

            let mut updated_entry = (**entry).clone();
            update_fn(&mut updated_entry.stats);
            *entry = Arc::new(updated_entry);
            Ok(())
        })
    }

    // ========================================================================
    // Cache Operations
    // ========================================================================

    /// Get cached decision
    pub fn get_cached_decision(
        &self,
        agent_id: &str,
        flow_id: &str,
        event_hash: u64,
    ) -> Option<(RuleId, String)> {
        let cache = self.cache.read().unwrap();
        let key = CacheKey::new(agent_id.to_string(), flow_id.to_string(), event_hash);

        if let Some(entry) = cache.get(&key) {
            let ttl = Duration::from_secs(self.cache_ttl_seconds);
            if !entry.is_expired(ttl) {
                return Some((entry.rule_id, entry.decision.clone()));
            }
        }

        None
    }

    /// Cache a decision
    pub fn cache_decision(
        &self,
        agent_id: &str,
        flow_id: &str,
        event_hash: u64,
        rule_id: RuleId,
        decision: String,
    ) -> Result<(), String> {
        let mut cache = self.cache.write().unwrap();

        // Evict expired entries if cache is full
        if cache.len() >= self.max_cache_size {
            let ttl = Duration::from_secs(self.cache_ttl_seconds);
            cache.retain(|_, entry| !entry.is_expired(ttl));

            // If still full, clear oldest 10%
            if cache.len() >= self.max_cache_size {
                let to_remove = cache.len() / 10;
                let keys: Vec<CacheKey> = cache.keys().take(to_remove).cloned().collect();
                for key in keys {
                    cache.remove(&key);
                }
            }
        }

        let key = CacheKey::new(agent_id.to_string(), flow_id.to_string(), event_hash);
        let entry = CacheEntry {
            rule_id,
            decision,
            cached_at: SystemTime::now(),
        };

        cache.insert(key, entry);
        Ok(())
    }

    /// Clear entire cache
    pub fn clear_cache(&self) -> Result<(), String> {
        let mut cache = self.cache.write().unwrap();
        cache.clear();
        Ok(())
    }

    /// Clear expired cache entries
    pub fn evict_expired_cache(&self) -> usize {
        let mut cache = self.cache.write().unwrap();
        let ttl = Duration::from_secs(self.cache_ttl_seconds);
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_expired(ttl));
        before - cache.len()
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Get table statistics, aggregated across every family partition.
    pub fn get_table_stats(&self) -> TableStats {
        let families: Vec<Arc<FamilyTable>> =
            self.families.read().unwrap().values().cloned().collect();

        let mut stats = TableStats {
            total_rules: 0,
            global_rules: 0,
            agent_indexes: 0,
            flow_indexes: 0,
            dest_agent_indexes: 0,
            dtype_indexes: 0,
            cache_size: self.cache.read().unwrap().len(),
            family_count: families.len(),
        };

        for table in families {
            let snapshot = table.snapshot();
            stats.total_rules += snapshot.len();
            stats.global_rules += snapshot.global.len();
            stats.agent_indexes += snapshot.by_agent.len();
            stats.flow_indexes += snapshot.by_flow.len();
            stats.dest_agent_indexes += snapshot.by_dest_agent.len();
            stats.dtype_indexes += snapshot.by_dtype.len();
        }

        stats
    }

    /// Get statistics for a single family partition.
    pub fn get_family_table_stats(&self, family: RuleFamily) -> TableStats {
        let snapshot = self.family_table(family).snapshot();
        TableStats {
            total_rules: snapshot.len(),
            global_rules: snapshot.global.len(),
            agent_indexes: snapshot.by_agent.len(),
            flow_indexes: snapshot.by_flow.len(),
            dest_agent_indexes: snapshot.by_dest_agent.len(),
            dtype_indexes: snapshot.by_dtype.len(),
            cache_size: 0,
            family_count: 1,
        }
    }

    /// List all rule IDs across every family
    pub fn list_rule_ids(&self) -> Vec<RuleId> {
        self.id_to_family.read().unwrap().keys().cloned().collect()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Table statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStats {
    pub total_rules: usize,
    pub global_rules: usize,
    pub agent_indexes: usize,
    pub flow_indexes: usize,
    pub dest_agent_indexes: usize,
    pub dtype_indexes: usize,
    pub cache_size: usize,
    pub family_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_clause::{ActionClause, ActionType, AllowParams};
    use crate::execution_constraints::ExecutionConstraints;
    use crate::match_clause::MatchClause;
    use crate::rule_metadata::{AgentId, EnforcementMode, RuleMetadata, RuleScope};

    fn rule_with(scope: RuleScope, family: RuleFamily, priority: i32) -> Rule {
        let mut metadata =
            RuleMetadata::new("sec-team".to_string(), scope, EnforcementMode::Hard, family);
        metadata.priority = priority;
        Rule {
            metadata,
            match_clause: MatchClause::new(),
            action_clause: ActionClause::new(ActionType::Allow(AllowParams::default())),
            constraints: ExecutionConstraints::fast_rule(),
            description: None,
            tags: Vec::new(),
        }
    }

    fn global_rule(family: RuleFamily, priority: i32) -> Rule {
        rule_with(RuleScope::global(), family, priority)
    }

    fn agent_rule(agent: &str, family: RuleFamily, priority: i32) -> Rule {
        rule_with(RuleScope::for_agents([AgentId::new(agent)]), family, priority)
    }

    #[test]
    fn add_rule_then_get_rule_round_trips() {
        let table = RuleTable::new();
        let rule = global_rule(RuleFamily::InputSchema, 100);
        let rule_id = rule.metadata.rule_id;

        table.add_rule(rule, None).unwrap();

        let fetched = table.get_rule(&rule_id).expect("rule should be stored");
        assert_eq!(*fetched.rule_id(), rule_id);
        assert_eq!(fetched.priority(), 100);
    }

    #[test]
    fn add_rule_rejects_duplicate_rule_id() {
        let table = RuleTable::new();
        let rule = global_rule(RuleFamily::InputSchema, 100);
        let duplicate = Rule {
            metadata: rule.metadata.clone(),
            match_clause: MatchClause::new(),
            action_clause: ActionClause::new(ActionType::Allow(AllowParams::default())),
            constraints: ExecutionConstraints::fast_rule(),
            description: None,
            tags: Vec::new(),
        };

        table.add_rule(rule, None).unwrap();
        let result = table.add_rule(duplicate, None);

        assert!(result.is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn query_family_always_includes_global_rules() {
        let table = RuleTable::new();
        table
            .add_rule(global_rule(RuleFamily::InputSchema, 10), None)
            .unwrap();

        let results = table.query_family(RuleFamily::InputSchema, &RuleQuery::new());
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn query_family_excludes_agent_scoped_rule_for_unrelated_agent() {
        let table = RuleTable::new();
        table
            .add_rule(agent_rule("agent-a", RuleFamily::InputSchema, 10), None)
            .unwrap();

        let matching = table.query_family(
            RuleFamily::InputSchema,
            &RuleQuery::new().with_agent("agent-a".to_string()),
        );
        assert_eq!(matching.len(), 1);

        let unrelated = table.query_family(
            RuleFamily::InputSchema,
            &RuleQuery::new().with_agent("agent-b".to_string()),
        );
        assert!(unrelated.is_empty());
    }

    #[test]
    fn query_family_scopes_results_to_the_requested_family() {
        let table = RuleTable::new();
        table
            .add_rule(global_rule(RuleFamily::InputSchema, 10), None)
            .unwrap();
        table
            .add_rule(global_rule(RuleFamily::OutputPII, 10), None)
            .unwrap();

        let results = table.query_family(RuleFamily::OutputPII, &RuleQuery::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].family(), RuleFamily::OutputPII);
    }

    #[test]
    fn load_bundle_then_unload_bundle_round_trips() {
        let table = RuleTable::new();
        let bundle_id = BundleId::new("bundle-1".to_string());
        let rules = vec![
            global_rule(RuleFamily::InputSchema, 10),
            global_rule(RuleFamily::OutputPII, 20),
        ];

        let loaded = table.load_bundle(rules, bundle_id.clone()).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(table.len(), 2);

        let unloaded = table.unload_bundle(&bundle_id).unwrap();
        assert_eq!(unloaded, 2);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn cache_decision_round_trips_and_misses_on_different_event_hash() {
        let table = RuleTable::new();
        let rule_id = RuleId::new();

        table
            .cache_decision("agent-a", "flow-1", 42, rule_id, "allow".to_string())
            .unwrap();

        let hit = table.get_cached_decision("agent-a", "flow-1", 42);
        assert_eq!(hit, Some((rule_id, "allow".to_string())));

        let miss = table.get_cached_decision("agent-a", "flow-1", 99);
        assert!(miss.is_none());
    }

    #[test]
    fn get_table_stats_aggregates_total_and_global_counts() {
        let table = RuleTable::new();
        table
            .add_rule(global_rule(RuleFamily::InputSchema, 10), None)
            .unwrap();
        table
            .add_rule(agent_rule("agent-a", RuleFamily::InputSchema, 20), None)
            .unwrap();

        let stats = table.get_table_stats();
        assert_eq!(stats.total_rules, 2);
        assert_eq!(stats.global_rules, 1);
        assert_eq!(stats.agent_indexes, 1);
    }
}
