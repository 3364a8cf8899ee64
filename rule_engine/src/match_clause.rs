// This module implements the matching component of rules, which determines 
// where a rule should be applied to a given event/request. It follows a three
// tier eval method

// 1. FastMatch: O(1) cheap predicates using bitsets and hash lookups
// 2. MatchExpression: Structured syntactic checks (regex, JSONPath, field comparisons)
// 3. WasmHook: Optional semantic validation via sandboxed WASM execution

// The evaluation proceeds from cheapest to the most expensive. 

use crate::{AgentId, FlowId};
use crate::rule_metadata::EnforcementMode;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, HashMap};
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// FAST MATCH - O(1) CHEAP PREDICATES
// ============================================================================

/// Fast matching predicates using bitsets and hash lookups.
///
/// This is the first and fastest layer of rule evaluation. It performs
/// cheap O(1) checks using indexed data structures (HashSets, flags).
/// These checks don't require loading the payload and work purely on
/// event metadata and headers.
///
/// # Design Principles
/// - **O(1) operations only**: Hash lookups, bitset checks
/// - **No payload access**: Works on headers/metadata only
/// - **Early termination**: Fail fast if predicates don't match
/// - **Index-friendly**: Can be pre-indexed for ultra-fast lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastMatch {
    /// Set of allowed source agents. If empty, any source is allowed.
    /// If non-empty, source_agent MUST be in this set.
    pub source_agents: HashSet<AgentId>,

    /// Set of allowed destination agents. If empty, any destination is allowed.
    pub dest_agents: HashSet<AgentId>,

    /// Set of allowed flow IDs. If empty, any flow is allowed.
    pub flow_ids: HashSet<FlowId>,

    /// Set of allowed payload types (MIME types). If empty, any type is allowed.
    /// Examples: "application/json", "text/plain", "application/protobuf"
    pub payload_types: HashSet<String>,

    /// Header flags that must be present. Bitset represented as u64.
    /// Each bit represents a specific flag:
    /// - Bit 0: ENCRYPTED
    /// - Bit 1: AUTHENTICATED
    /// - Bit 2: RATE_LIMITED
    /// - Bit 3: HIGH_PRIORITY
    /// - Bit 4: CONTAINS_PII
    /// - Bits 5-63: Reserved for future use
    pub required_flags: HeaderFlags,

    /// Header flags that must NOT be present.
    pub forbidden_flags: HeaderFlags,
}

impl FastMatch {
    ///Creates a new empty FastMatch instance with no restrictions.
    /// Use the builder pattern for more control. 
    pub fn new() -> Self {
        FastMatch {
            source_agents: HashSet::new(),
            dest_agents: HashSet::new(),
            flow_ids: HashSet::new(),
            payload_types: HashSet::new(),
            required_flags: HeaderFlags::empty(),
            forbidden_flags: HeaderFlags::empty(),
        }
    }

    /// Creates a FastMatch instance that matches nothing. 
    pub fn match_none() -> Self {
        let mut fast_match = Self::new();
        //Set contradictory flags to ensure no match
        fast_match.required_flags = HeaderFlags::all();
        fast_match.forbidden_flags = HeaderFlags::all();
        fast_match
    }

    /// Evaluates this FastMatch against event context.
    ///
    /// Returns `true` if all predicates match, `false` otherwise.
    pub fn evaluate(&self, ctx: &EventContext) -> bool {
        // Check source agent
        if !self.source_agents.is_empty() && !self.source_agents.contains(
            &ctx.source_agent) {
        return false;

        }
        //Check destination agent
        if !self.dest_agents.is_empty(){
            if let Some(dest) = &ctx.dest_agent {
                if !self.dest_agents.contains(dest) {
                    return false;
                }
            }else {
                return false;
            }
        }

        // Check flow id
        if !self.flow_ids.is_empty() {
            if let Some(flow) = &ctx.flow_id {
                if !self.flow_ids.contains(flow) {
                    return false;
                }
            } else {
                return false;
            }
        }
        // Check payload type
        if !self.payload_types.is_empty() && !self.payload_types.contains(&ctx.payload_type) {
            return false;
        }

        // Check required flags are present
        if !ctx.header_flags.contains(self.required_flags) {
            return false;
        }

        // Check forbidden flags are absent
        if ctx.header_flags.intersects(self.forbidden_flags) {
            return false;
        }

        true
    }
    /// Returns true if this FastMatch will match everything
    pub fn matches_all(&self) -> bool {
        self.source_agents.is_empty() &&
        self.dest_agents.is_empty() &&
        self.flow_ids.is_empty() &&
        self.payload_types.is_empty() &&
        self.required_flags.is_empty() &&
        self.forbidden_flags.is_empty()
    }
}

impl Default for FastMatch {
    fn default() -> Self {
        Self::new()
    }
}


// ============================================================================
// HEADER FLAGS - BITSET FOR FAST CHECKS
// ============================================================================

/// Header flags represented as a bitset for fast operations.
///
/// This uses a u64 to represent up to 64 boolean flags. Bitwise operations
/// are extremely fast and cache-friendly.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HeaderFlags(u64);

impl HeaderFlags {
    // Flag bit positions
    pub const ENCRYPTED: u64 = 1 << 0;
    pub const AUTHENTICATED: u64 = 1 << 1;
    pub const RATE_LIMITED: u64 = 1 << 2;
    pub const HIGH_PRIORITY: u64 = 1 << 3;
    pub const CONTAINS_PII: u64 = 1 << 4;
    pub const REQUIRES_AUDIT: u64 = 1 << 5;
    pub const SYNTHETIC: u64 = 1 << 6;
    pub const CACHED: u64 = 1 << 7;

    /// Returns the raw bits value.
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Creates an empty HeaderFlags (no flags set).
    pub fn empty() -> Self {
        HeaderFlags(0)
    }

    /// Creates a HeaderFlags with all flags set.
    pub fn all() -> Self {
        HeaderFlags(u64::MAX)
    }

    /// Creates flags from a raw u64 value.
    pub fn from_bits(bits: u64) -> Self {
        HeaderFlags(bits)
    }

    /// Checks if this contains all flags in `other`.
    pub const fn contains(&self, other: HeaderFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Checks if this has any flags in common with `other`.
    pub const fn intersects(&self, other: HeaderFlags) -> bool {
        (self.0 & other.0) != 0
    }

    /// Returns true if no flags are set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Sets a flag.
    pub fn set(&mut self, flag: u64) {
        self.0 |= flag;
    }

    /// Clears a flag.
    pub fn clear(&mut self, flag: u64) {
        self.0 &= !flag;
    }

    /// Checks if a specific flag is set.
    pub const fn has(&self, flag: u64) -> bool {
        (self.0 & flag) != 0
    }
}

// ============================================================================
// MATCH EXPRESSION - STRUCTURED SYNTACTIC CHECKS
// ============================================================================

/// Structured expressions for syntactic validation.
///
/// This is the second layer of evaluation, applied after FastMatch succeeds.
/// It performs more complex checks like regex matching, field comparisons,
/// and JSONPath queries.
///
/// # Design Principles
/// - **Compiled on activation**: Expressions are pre-compiled (regex, JSONPath)
/// - **Composable**: Can combine multiple expressions with AND/OR/NOT
/// - **Lazy evaluation**: Short-circuits on first failure
/// - **Minimal payload access**: Only loads payload if necessary

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchExpression {
    /// Always matches
    Always,

    /// Never matches
    Never,

    /// Compare a field value
    Field(FieldComparison),

    /// Match against a regex pattern
    Regex(RegexMatch),

    /// Query using JSONPath.
    JsonPath(JsonPathQuery),

    /// Logical AND: all sub-expressions must match.
    And(Vec<MatchExpression>),

    /// Logical OR: at least one sub-expression must match.
    Or(Vec<MatchExpression>),

    /// Logical NOT: inverts the result.
    Not(Box<MatchExpression>),
}

impl MatchExpression {
    /// Evaluates the expression against the event context and payload. 
    /// Returns true if the expression matches else false

    pub fn evaluate(&self, ctx: &EventContext, payload: Option<&PayloadData>) -> bool {
        match self {
            MatchExpression::Always => true,
            MatchExpression::Never => false,
            MatchExpression::Field(field_comp) => field_comp.evaluate(ctx, payload),
            MatchExpression::Regex(regex) => regex.evaluate(ctx, payload),
            MatchExpression::JsonPath(jsonpath) => jsonpath.evaluate(ctx, payload),
            MatchExpression::And(exprs) => {
                // ALl must match 
                exprs.iter().all(|expr| expr.evaluate(ctx, payload))
            }
            MatchExpression::Or(exprs) => {
                // At least one must match
                exprs.iter().any(|expr| expr.evaluate(ctx, payload))
            }
            MatchExpression::Not(expr) => {
                // Invert result
                !expr.evaluate(ctx, payload)
            }
        }
    }

    /// Returns true if the expression requires the payload access. 
    /// This helps optimize evaluation by avoiding unnecessary payload loading.

    pub fn required_payload(&self) -> bool {
        match self {
            MatchExpression::Always | MatchExpression::Never => false,
            MatchExpression::Field(field_comp) => field_comp.requires_payload(),
            MatchExpression::Regex(regex) => regex.requires_payload(),
            MatchExpression::JsonPath(_) => true,// JsonPath always needs payload
            MatchExpression::And(exprs) | MatchExpression::Or(exprs) => {
                exprs.iter().any(|expr| expr.required_payload())
            }
            MatchExpression::Not(expr) => expr.required_payload(),
        }
    }

    /// Pre-compiles every regex nested anywhere in this expression tree.
    /// Called at rule activation time so the hot evaluation path never pays
    /// for compilation.
    pub fn compile(&self) -> Result<(), regex::Error> {
        match self {
            MatchExpression::Always | MatchExpression::Never | MatchExpression::Field(_) => {
                Ok(())
            }
            MatchExpression::Regex(regex) => regex.compile(),
            MatchExpression::JsonPath(_) => Ok(()),
            MatchExpression::And(exprs) | MatchExpression::Or(exprs) => {
                for expr in exprs {
                    expr.compile()?;
                }
                Ok(())
            }
            MatchExpression::Not(expr) => expr.compile(),
        }
    }
}

/// Field comparison operations
/// Compares a field value against a reference value using various operators.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    /// path to the field (dot-separated for nested fields)
    pub field_path: String,

    /// Comparison operator
    pub operator: ComparisonOp,

    /// Reference value to compare against
    pub value: FieldValue,
}

impl FieldComparison {
    pub fn evaluate(&self, ctx: &EventContext, payload: Option<&PayloadData>) -> bool {
        // Try to get field from context first
        if let Some(field_value) = ctx.get_header(&self.field_path) {
            return self.compare(&field_value);
        }

        // If not in context, try payload if available
        if let Some(payload) = payload {
            if let Some(field_value) = payload.get_field(&self.field_path) {
                return self.compare(&field_value);
            }
        }
        false // Field not found
    }

    fn compare(&self, field_value: &FieldValue) -> bool {
        match self.operator {
            ComparisonOp::Equal => field_value == &self.value,
            ComparisonOp::NotEqual => field_value != &self.value,
            ComparisonOp::GreaterThan => field_value > &self.value,
            ComparisonOp::GreaterThanOrEqual => field_value >= &self.value,
            ComparisonOp::LessThan => field_value < &self.value,
            ComparisonOp::LessThanOrEqual => field_value <= &self.value,
            ComparisonOp::Contains => match (field_value, &self.value) {
                (FieldValue::String(s), FieldValue::String(pattern)) => s.contains(pattern),
                _ => false,
            },
            ComparisonOp::StartsWith => match (field_value, &self.value) {
                (FieldValue::String(s), FieldValue::String(prefix)) => s.starts_with(prefix),
                _ => false,
            },
            ComparisonOp::EndsWith => match (field_value, &self.value) {
                (FieldValue::String(s), FieldValue::String(suffix)) => s.ends_with(suffix),
                _ => false,
            },
            ComparisonOp::In => match &self.value {
                FieldValue::Array(arr) => arr.contains(field_value),
                _ => false,
            },
        }
    }

    fn requires_payload(&self) -> bool {
        // If field path is a known header field, we dont need payload
        // For simplicity, assume we might need paylaod. 
        true
    }
}

/// Comparison operators for field comparisons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]

pub enum ComparisonOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,    // String contains substring
    StartsWith,  // String starts with prefix
    EndsWith,    // String ends with suffix
    In,          // Value is in array
}

/// Field value types for comparisons.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<FieldValue>),
    Null,
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

/// Regex patterns matching
/// The actual regex compilation happens during rule activation. 
/// This struct stores the pattern and the metadata

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexMatch {
    /// Field path to apply the regex on
    pub field_path: String,
    /// Regex pattern as string
    pub pattern: String,
    ///Whether the pattern should match the entire field or any substring
    pub full_match: bool,
    /// Lazily compiled form of `pattern`, populated by [`RegexMatch::compile`]
    /// at rule activation time so the hot evaluation path never compiles.
    #[serde(skip)]
    compiled: OnceLock<Option<regex::Regex>>,
}

impl PartialEq for RegexMatch {
    fn eq(&self, other: &Self) -> bool {
        self.field_path == other.field_path
            && self.pattern == other.pattern
            && self.full_match == other.full_match
    }
}

impl Clone for RegexMatch {
    fn clone(&self) -> Self {
        // Don't copy the OnceLock itself (not Clone); a clone recompiles its
        // pattern lazily on first use, same as a freshly deserialized value.
        Self::new(self.field_path.clone(), self.pattern.clone(), self.full_match)
    }
}

impl RegexMatch {
    pub fn new(field_path: impl Into<String>, pattern: impl Into<String>, full_match: bool) -> Self {
        Self {
            field_path: field_path.into(),
            pattern: pattern.into(),
            full_match,
            compiled: OnceLock::new(),
        }
    }

    /// Compiles `pattern`, caching the result. Called at rule/bundle
    /// activation time so activation fails on a bad pattern instead of the
    /// failure surfacing on the hot path. Safe to call more than once.
    pub fn compile(&self) -> Result<(), regex::Error> {
        let mut err = None;
        self.compiled.get_or_init(|| match regex::Regex::new(&self.pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                err = Some(e);
                None
            }
        });
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn regex(&self) -> Option<&regex::Regex> {
        self.compiled
            .get_or_init(|| regex::Regex::new(&self.pattern).ok())
            .as_ref()
    }

    pub fn evaluate(&self, ctx: &EventContext, payload: Option<&PayloadData>) -> bool {
        //Get Field value
        let field_value = if let Some(val) = ctx.get_header(&self.field_path) {
            val
        } else if let Some(payload) = payload {
            if let Some(val) = payload.get_field(&self.field_path) {
                val
            } else {
                return false; // Field not found
            }
        } else {
            return false; // Field not found
        };

        // Convert field to string for regex matching
        let text = match field_value {
            FieldValue::String(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            _ => return false, // Cannot apply regex on non-string types
        };

        let Some(re) = self.regex() else {
            return false; // Bad pattern; treated as no-match rather than panicking
        };

        if self.full_match {
            re.find(&text).map(|m| m.start() == 0 && m.end() == text.len()).unwrap_or(false)
        } else {
            re.is_match(&text)
        }
    }

    fn requires_payload(&self) -> bool {
        true // Conservative - assume we need payload
    }
}

/// JSONPath query matching
/// Queries nested JSON structures using JSON Path syntax. 
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPathQuery {
    /// JSONPath expression
    pub path: String,

    /// Expected value at the JSONPath
    pub expected_value: Option<FieldValue>,

    /// If true, just checks if the path exists (ignores expected_value)
    pub exists_only: bool,
}

impl JsonPathQuery {
    pub fn evaluate(&self, _ctx: &EventContext, payload: Option<&PayloadData>) -> bool {
        // JSONPath always requires payload
        let payload = match payload {
            Some(p) => p,
            None => return false,
        };

        if self.exists_only {
            // Just check if path exists
            payload.has_path(&self.path)
        } else if let Some(expected) = &self.expected_value {
            // Check if path value matches expected
            if let Some(actual) = payload.query_path(&self.path) {
                actual == *expected
            } else {
                false
            }
        } else {
            // No expected value and not an existence check - match if path exists
            payload.has_path(&self.path)
        }
    }
}


// ============================================================================
// WASM HOOK - SEMANTIC VALIDATION
// ============================================================================

/// Reference to a WASM module for semantic validation.
///
/// This is the third and most expensive layer of evaluation. WASM hooks
/// are only invoked if FastMatch and MatchExpression both succeed.
///
/// # Design Principles
/// - **Sandboxed execution**: Runs in isolated WASM runtime
/// - **Time-limited**: Must complete within max_exec_time
/// - **Memory-limited**: Cannot exceed memory_limit
/// - **CPU-limited**: Bounded CPU usage via cpu_shares
/// - **Fail-closed**: If hook fails/times out, treat as no match (for HARD rules)
/// TODO: Need to check if we can implement an SLM here to perform specific semantic 
/// validations as per user requirements.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasmHookRef {
    /// Unique identifier for this hook.
    pub hook_id: String,

    /// Digest of the WASM module (for integrity verification).
    /// Format: "sha256:..." or "sha512:..."
    pub module_digest: String,

    /// Maximum execution time before timeout.
    #[serde(with = "duration_serde")]
    pub max_exec_time: Duration,

    /// Maximum memory the WASM instance can use (in bytes).
    pub memory_limit_bytes: usize,

    /// CPU shares allocation (soft limit for scheduling).
    pub cpu_shares: u32,
}

impl WasmHookRef {
    /// Creates a new WASM hook ref with default resources. 
    /// Default limits:
    /// - Execution time: 50ms
    /// - Memory: 10 MB
    /// - CPU shares: 100
    pub fn new(hook_id: String, module_digest: String) -> Self {
        WasmHookRef {
            hook_id,
            module_digest,
            max_exec_time: Duration::from_millis(50),
            memory_limit_bytes: 10 * 1024 * 1024,
            cpu_shares: 100,
        }
    }
    /// Evaluates this WASM hook against event context and payload.
    ///
    /// No WASM runtime is wired in yet (loading `module_digest`, sandboxing,
    /// enforcing `max_exec_time`/`memory_limit_bytes`/`cpu_shares`), so every
    /// invocation is reported as a hook failure rather than faking a result.
    /// Callers (`MatchClause::evaluate`) are responsible for applying the
    /// fail-closed/fail-open policy appropriate to the rule's enforcement
    /// mode instead of treating a failure as a match.
    pub fn evaluate(&self, _ctx: &EventContext, _payload: Option<&PayloadData>) -> WasmHookOutcome {
        WasmHookOutcome::Failed("no WASM runtime integration available".to_string())
    }
}

/// Outcome of invoking a `WasmHookRef`.
#[derive(Debug, Clone, PartialEq)]
pub enum WasmHookOutcome {
    /// The hook ran to completion and matched.
    Matched,
    /// The hook ran to completion and did not match.
    NoMatch,
    /// The hook could not be run to completion (timeout, OOM, exception, or
    /// — currently, always — the absence of a runtime).
    Failed(String),
}
// Custom serde module for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}


// ============================================================================
// MATCH CLAUSE - COMPLETE MATCHING LOGIC
// ============================================================================

/// Complete matching logic for a rule.
///
/// MatchClause combines all three evaluation tiers:
/// 1. FastMatch (cheap O(1) predicates)
/// 2. MatchExpression (syntactic checks)
/// 3. WasmHook (semantic validation)
///
/// Evaluation proceeds in order, with early termination if any tier fails.
///
/// # Evaluation Flow
/// ```text
/// Event → FastMatch? → MatchExpr? → WasmHook? → MATCH
///            ↓             ↓           ↓
///          FAIL          FAIL        FAIL
///            ↓             ↓           ↓
///         NO MATCH      NO MATCH    NO MATCH
/// ```


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    /// Fast match predicates
    pub fast_match: FastMatch,

    /// Structured match expression
    pub match_expression: MatchExpression,

    /// Optional WASM hook for semantic validation
    pub wasm_hook: Option<WasmHookRef>,
}

impl MatchClause {
    /// Creates a new empty match clause that matches everything
    pub fn new() -> Self {
        MatchClause {
            fast_match: FastMatch::new(),
            match_expression: MatchExpression::Always,
            wasm_hook: None,
        }
    }

    /// Creates a MatchClause that only uses FastMatch.
    pub fn fast_only(fast_match: FastMatch) -> Self {
        MatchClause {
            fast_match,
            match_expression: MatchExpression::Always,
            wasm_hook: None,
        }
    }

    /// Creates a MatchClause with FastMatch and MatchExpression.
    pub fn with_expression(fast_match: FastMatch, expr: MatchExpression) -> Self {
        MatchClause {
            fast_match,
            match_expression: expr,
            wasm_hook: None,
        }
    }

    /// Creates a complete MatchClause with all three tiers.
    pub fn complete(
        fast_match: FastMatch,
        expr: MatchExpression,
        hook: WasmHookRef,
    ) -> Self {
        MatchClause {
            fast_match,
            match_expression: expr,
            wasm_hook: Some(hook),
        }
    }

    /// Evaluates this MatchClause against an event.
    ///
    /// `enforcement_mode` governs what happens if the WASM hook tier fails
    /// (timeout, OOM, exception, or no runtime available): a Hard rule's
    /// failure is reported as a forced match-to-deny, a Soft rule's failure
    /// is reported as a plain no-match. Returns `MatchResult` indicating
    /// whether the rule matched and which tier made the decision.
    pub fn evaluate(
        &self,
        ctx: &EventContext,
        payload: Option<&PayloadData>,
        enforcement_mode: EnforcementMode,
    ) -> MatchResult {
        // Tier 1: FastMatch
        if !self.fast_match.evaluate(ctx) {
            return MatchResult::no_match(MatchTier::FastMatch);
        }
        // Tier 2: MatchExpression
        if !self.match_expression.evaluate(ctx, payload) {
            return MatchResult::no_match(MatchTier::MatchExpression);
        }
        // Tier 3: WasmHook
        if let Some(hook) = &self.wasm_hook {
            match hook.evaluate(ctx, payload) {
                WasmHookOutcome::Matched => {}
                WasmHookOutcome::NoMatch => return MatchResult::no_match(MatchTier::WasmHook),
                WasmHookOutcome::Failed(reason) => {
                    return match enforcement_mode {
                        EnforcementMode::Hard => MatchResult::hook_failed_hard(reason),
                        EnforcementMode::Soft => MatchResult::hook_failed_soft(reason),
                    };
                }
            }
        }
        MatchResult::matched()
    }

    /// Pre-compiles every regex used by this clause's match expression.
    /// Must be called before a rule transitions to Staged/Active.
    pub fn compile(&self) -> Result<(), regex::Error> {
        self.match_expression.compile()
    }

    /// Returns true if this clause requires paylaod access
    pub fn requires_payload(&self) -> bool {
        if self.match_expression.required_payload() {
            return true;
        }
        if self.wasm_hook.is_some() {
            return true;
        }
        false
    }

    /// Returns the most expensive tier this clause uses
    pub fn max_tier(&self) -> MatchTier {
        if self.wasm_hook.is_some() {
            MatchTier::WasmHook
        } else if !matches!(self.match_expression, MatchExpression::Always) {
            MatchTier::MatchExpression
        } else if !self.fast_match.matches_all() {
            MatchTier::FastMatch
        } else {
            MatchTier::None
        }
    }

    /// Alias for max_tier for backward compatibility
    pub fn max_evaluation_tier(&self) -> MatchTier {
        self.max_tier()
    }
}

impl Default for MatchClause {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

/// Result of evaluating a MatchClause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether the rule matched
    pub is_match: bool,

    /// Tier that made the decision
    pub tier: MatchTier,

    /// Set when a Hard rule's WASM hook failed (timeout/OOM/exception/no
    /// runtime): the evaluation engine must force a Deny regardless of
    /// `is_match`, per the fail-closed policy for Hard enforcement.
    pub forced_deny: bool,

    /// Set when a hook failed and the rule's Soft enforcement mode means
    /// the failure is treated as a plain no-match rather than a denial.
    pub hook_failure: Option<String>,
}

impl MatchResult {
    /// Creates a MatchResult indicating a match.
    pub fn matched() -> Self {
        MatchResult {
            is_match: true,
            tier: MatchTier::Complete,
            forced_deny: false,
            hook_failure: None,
        }
    }

    /// Creates a MatchResult indicating no match at the given tier.
    pub fn no_match(tier: MatchTier) -> Self {
        MatchResult {
            is_match: false,
            tier,
            forced_deny: false,
            hook_failure: None,
        }
    }

    /// Creates a MatchResult for a Soft rule whose WASM hook failed: treated
    /// as no-match, with the failure reason preserved for the audit trail.
    pub fn hook_failed_soft(reason: String) -> Self {
        MatchResult {
            is_match: false,
            tier: MatchTier::WasmHook,
            forced_deny: false,
            hook_failure: Some(reason),
        }
    }

    /// Creates a MatchResult for a Hard rule whose WASM hook failed: the
    /// clause is reported as matched so the evaluation engine executes the
    /// rule's Deny action rather than silently skipping it.
    pub fn hook_failed_hard(reason: String) -> Self {
        MatchResult {
            is_match: true,
            tier: MatchTier::WasmHook,
            forced_deny: true,
            hook_failure: Some(reason),
        }
    }
}

/// Evaluation tiers for match clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    None,            // No evaluation tiers present
    FastMatch,       // Failed at fast match
    MatchExpression, // Failed at match expression
    WasmHook,        // Failed at WASM hook
    Complete,        // Passed all tiers
}



// ============================================================================
// EVENT CONTEXT - INPUT TO MATCH EVALUATION
// ============================================================================

/// Event context for match evaluation.
///
/// This represents the metadata and headers of an incoming event/request
/// that rules are evaluated against.

#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    /// Source agent ID.
    pub source_agent: AgentId,

    /// Destination agent ID (if applicable).
    pub dest_agent: Option<AgentId>,

    /// Flow ID (if part of a flow).
    pub flow_id: Option<FlowId>,

    /// Payload MIME type.
    pub payload_type: String,

    /// Header flags.
    pub header_flags: HeaderFlags,

    /// Additional headers (key-value pairs).
    pub headers: HashMap<String, FieldValue>,
}

impl EventContext {
    /// Creates a new event Context
    pub fn new(
        source_agent: AgentId,
        dest_agent: Option<AgentId>,
        flow_id: Option<FlowId>,
        payload_type: String,
        header_flags: HeaderFlags,
        headers: HashMap<String, FieldValue>,
    ) -> Self {
        EventContext {
            source_agent,
            dest_agent,
            flow_id,
            payload_type,
            header_flags,
            headers,
        }
    }
    pub fn get_header(&self, key: &str) -> Option<&FieldValue> {
        self.headers.get(key)
    }

    /// Sets a header value. 
    pub fn set_header(&mut self, key: String, value: FieldValue) {
        self.headers.insert(key, value);
    }
}

// ============================================================================
// PAYLOAD DATA - PAYLOAD REPRESENTATION
// ============================================================================

/// Payload data for match evaluation.
///
/// This represents the actual payload content that may be queried
/// during match expression evaluation.
#[derive(Debug, Clone, PartialEq)]

pub struct PayloadData {
    /// Raw payload bytes
    pub raw_data: Vec<u8>,

    /// Parsed top-level fields (if applicable); mirrors the top-level keys
    /// of `json` for callers that only need flat field lookups.
    pub fields: HashMap<String, FieldValue>,

    /// Full parsed JSON value, used for JSONPath-style queries against
    /// nested structure. `None` if `raw_data` was not valid JSON.
    json: Option<serde_json::Value>,
}

impl PayloadData {
    /// Creates a new PayloadData instance from raw bytes and parsed fields.
    pub fn new(raw_data: Vec<u8>, fields: HashMap<String, FieldValue>) -> Self {
        PayloadData { raw_data, fields, json: None }
    }

    /// Creates payload from raw JSON bytes, parsing both the flat top-level
    /// field map and the full nested structure for path queries.
    pub fn from_bytes(json_bytes: Vec<u8>) -> Self {
        let json = serde_json::from_slice::<serde_json::Value>(&json_bytes).ok();
        let fields = match &json {
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| field_value_from_json(v).map(|fv| (k.clone(), fv)))
                .collect(),
            _ => HashMap::new(),
        };
        PayloadData { raw_data: json_bytes, fields, json }
    }

    /// Gets a field value by path.
    pub fn get_field(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// Checks if a JSON path exists. Supports dot-separated field access
    /// with optional `[index]` array subscripts, e.g. `user.roles[0].name`.
    pub fn has_path(&self, path: &str) -> bool {
        self.json.as_ref().and_then(|v| walk_json_path(v, path)).is_some()
    }

    /// Queries a JSON path and returns the value found there, if any.
    pub fn query_path(&self, path: &str) -> Option<FieldValue> {
        self.json
            .as_ref()
            .and_then(|v| walk_json_path(v, path))
            .and_then(field_value_from_json)
    }
}

impl Default for PayloadData {
    fn default() -> Self {
        Self::new(Vec::new(), HashMap::new())
    }
}

/// Converts a JSON value to a `FieldValue`, when the shape is one
/// `FieldValue` can represent (scalars only — arrays/objects have no
/// direct `FieldValue` variant and are addressed a path segment deeper).
fn field_value_from_json(value: &serde_json::Value) -> Option<FieldValue> {
    match value {
        serde_json::Value::String(s) => Some(FieldValue::String(s.clone())),
        serde_json::Value::Bool(b) => Some(FieldValue::Boolean(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Integer(i))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        _ => None,
    }
}

/// Walks a dot/bracket JSON path (`a.b[2].c`) against a parsed JSON value.
/// Accepts a leading `$.` prefix for callers used to JSONPath notation.
fn walk_json_path<'a>(root: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let path = path.strip_prefix("$.").or_else(|| path.strip_prefix('$')).unwrap_or(path);
    let mut current = root;
    for raw_segment in path.split('.') {
        if raw_segment.is_empty() {
            continue;
        }
        let (name, indices) = parse_segment(raw_segment);
        if !name.is_empty() {
            current = current.as_object()?.get(name)?;
        }
        for idx in indices {
            current = current.as_array()?.get(idx)?;
        }
    }
    Some(current)
}

/// Splits `foo[2][3]` into (`"foo"`, `[2, 3]`).
fn parse_segment(segment: &str) -> (&str, Vec<usize>) {
    let mut indices = Vec::new();
    let name_end = segment.find('[').unwrap_or(segment.len());
    let (name, mut rest) = segment.split_at(name_end);
    while let Some(open) = rest.find('[') {
        if let Some(close) = rest[open..].find(']') {
            if let Ok(idx) = rest[open + 1..open + close].parse::<usize>() {
                indices.push(idx);
            }
            rest = &rest[open + close + 1..];
        } else {
            break;
        }
    }
    (name, indices)
}

// ============================================================================
// BUILDER PATTERN FOR FAST MATCH
// ============================================================================

/// Builder for FastMatch.
#[derive(Debug, Default)]
pub struct FastMatchBuilder {
    source_agents: HashSet<AgentId>,
    dest_agents: HashSet<AgentId>,
    flow_ids: HashSet<FlowId>,
    payload_types: HashSet<String>,
    required_flags: HeaderFlags,
    forbidden_flags: HeaderFlags,
}

impl FastMatchBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        FastMatchBuilder::default()
    }

    /// Adds a source agent constraint.
    pub fn add_source_agent(mut self, agent: AgentId) -> Self {
        self.source_agents.insert(agent);
        self
    }

    /// Adds multiple source agent constraints.
    pub fn source_agents(mut self, agents: impl IntoIterator<Item = AgentId>) -> Self {
        self.source_agents.extend(agents);
        self
    }

    /// Adds a destination agent constraint.
    pub fn add_dest_agent(mut self, agent: AgentId) -> Self {
        self.dest_agents.insert(agent);
        self
    }

    /// Adds a flow ID constraint.
    pub fn add_flow_id(mut self, flow: FlowId) -> Self {
        self.flow_ids.insert(flow);
        self
    }

    /// Adds a payload type constraint.
    pub fn add_payload_type(mut self, mime_type: impl Into<String>) -> Self {
        self.payload_types.insert(mime_type.into());
        self
    }

    /// Sets required flags.
    pub fn require_flags(mut self, flags: HeaderFlags) -> Self {
        self.required_flags = flags;
        self
    }

    /// Sets forbidden flags.
    pub fn forbid_flags(mut self, flags: HeaderFlags) -> Self {
        self.forbidden_flags = flags;
        self
    }

    /// Builds the FastMatch.
    pub fn build(self) -> FastMatch {
        FastMatch {
            source_agents: self.source_agents,
            dest_agents: self.dest_agents,
            flow_ids: self.flow_ids,
            payload_types: self.payload_types,
            required_flags: self.required_flags,
            forbidden_flags: self.forbidden_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_metadata::EnforcementMode;

    fn ctx(source: &str, dest: Option<&str>, payload_type: &str) -> EventContext {
        EventContext::new(
            AgentId::new(source),
            dest.map(AgentId::new),
            None,
            payload_type.to_string(),
            HeaderFlags::empty(),
            HashMap::new(),
        )
    }

    #[test]
    fn fast_match_empty_matches_everything() {
        let fm = FastMatch::new();
        assert!(fm.matches_all());
        assert!(fm.evaluate(&ctx("agent-a", None, "application/json")));
    }

    #[test]
    fn fast_match_rejects_unlisted_source_agent() {
        let fm = FastMatchBuilder::new()
            .add_source_agent(AgentId::new("agent-a"))
            .build();
        assert!(fm.evaluate(&ctx("agent-a", None, "application/json")));
        assert!(!fm.evaluate(&ctx("agent-b", None, "application/json")));
    }

    #[test]
    fn fast_match_requires_dest_when_constrained() {
        let fm = FastMatchBuilder::new()
            .add_dest_agent(AgentId::new("agent-b"))
            .build();
        assert!(!fm.evaluate(&ctx("agent-a", None, "application/json")));
        assert!(fm.evaluate(&ctx("agent-a", Some("agent-b"), "application/json")));
    }

    #[test]
    fn fast_match_required_and_forbidden_flags() {
        let fm = FastMatchBuilder::new()
            .require_flags(HeaderFlags::from_bits(HeaderFlags::ENCRYPTED))
            .forbid_flags(HeaderFlags::from_bits(HeaderFlags::CONTAINS_PII))
            .build();

        let mut event = ctx("agent-a", None, "application/json");
        event.header_flags = HeaderFlags::from_bits(HeaderFlags::ENCRYPTED);
        assert!(fm.evaluate(&event));

        event.header_flags = HeaderFlags::from_bits(HeaderFlags::ENCRYPTED | HeaderFlags::CONTAINS_PII);
        assert!(!fm.evaluate(&event));
    }

    #[test]
    fn match_expression_and_or_not() {
        let always = MatchExpression::Always;
        let never = MatchExpression::Never;
        let event = ctx("agent-a", None, "application/json");

        assert!(MatchExpression::And(vec![always.clone(), always.clone()]).evaluate(&event, None));
        assert!(!MatchExpression::And(vec![always.clone(), never.clone()]).evaluate(&event, None));
        assert!(MatchExpression::Or(vec![never.clone(), always.clone()]).evaluate(&event, None));
        assert!(MatchExpression::Not(Box::new(never)).evaluate(&event, None));
    }

    #[test]
    fn field_comparison_reads_header_first_then_payload() {
        let comparison = FieldComparison {
            field_path: "risk_score".to_string(),
            operator: ComparisonOp::GreaterThan,
            value: FieldValue::Integer(50),
        };

        let mut event = ctx("agent-a", None, "application/json");
        event.set_header("risk_score".to_string(), FieldValue::Integer(90));
        assert!(comparison.evaluate(&event, None));

        event.set_header("risk_score".to_string(), FieldValue::Integer(10));
        assert!(!comparison.evaluate(&event, None));
    }

    #[test]
    fn regex_match_full_vs_partial() {
        let event = ctx("agent-a", None, "application/json");
        let payload = PayloadData::new(
            Vec::new(),
            HashMap::from([("path".to_string(), FieldValue::String("/api/v1/users".to_string()))]),
        );

        let partial = RegexMatch::new("path", "users", false);
        partial.compile().unwrap();
        assert!(partial.evaluate(&event, Some(&payload)));

        let full = RegexMatch::new("path", "users", true);
        full.compile().unwrap();
        assert!(!full.evaluate(&event, Some(&payload)));
    }

    #[test]
    fn json_path_query_nested_lookup() {
        let payload = PayloadData::from_bytes(br#"{"user":{"roles":["admin","viewer"]}}"#.to_vec());
        let exists = JsonPathQuery { path: "user.roles[0]".to_string(), expected_value: None, exists_only: true };
        assert!(exists.evaluate(&ctx("agent-a", None, "application/json"), Some(&payload)));

        let mismatch = JsonPathQuery {
            path: "user.roles[0]".to_string(),
            expected_value: Some(FieldValue::String("viewer".to_string())),
            exists_only: false,
        };
        assert!(!mismatch.evaluate(&ctx("agent-a", None, "application/json"), Some(&payload)));
    }

    #[test]
    fn wasm_hook_always_reports_failure_absent_runtime() {
        let hook = WasmHookRef::new("hook-1".to_string(), "sha256:deadbeef".to_string());
        let outcome = hook.evaluate(&ctx("agent-a", None, "application/json"), None);
        assert_eq!(outcome, WasmHookOutcome::Failed("no WASM runtime integration available".to_string()));
    }

    #[test]
    fn match_clause_hard_hook_failure_forces_deny() {
        let clause = MatchClause::complete(
            FastMatch::new(),
            MatchExpression::Always,
            WasmHookRef::new("hook-1".to_string(), "sha256:deadbeef".to_string()),
        );
        let result = clause.evaluate(&ctx("agent-a", None, "application/json"), None, EnforcementMode::Hard);
        assert!(result.is_match);
        assert!(result.forced_deny);
        assert!(result.hook_failure.is_some());
    }

    #[test]
    fn match_clause_soft_hook_failure_is_plain_no_match() {
        let clause = MatchClause::complete(
            FastMatch::new(),
            MatchExpression::Always,
            WasmHookRef::new("hook-1".to_string(), "sha256:deadbeef".to_string()),
        );
        let result = clause.evaluate(&ctx("agent-a", None, "application/json"), None, EnforcementMode::Soft);
        assert!(!result.is_match);
        assert!(!result.forced_deny);
        assert!(result.hook_failure.is_some());
    }

    #[test]
    fn match_clause_short_circuits_on_fast_match_failure() {
        let clause = MatchClause::with_expression(
            FastMatchBuilder::new().add_source_agent(AgentId::new("agent-a")).build(),
            MatchExpression::Never,
        );
        let result = clause.evaluate(&ctx("agent-b", None, "application/json"), None, EnforcementMode::Hard);
        assert!(!result.is_match);
        assert_eq!(result.tier, MatchTier::FastMatch);
    }

    #[test]
    fn max_tier_reflects_most_expensive_configured_tier() {
        assert_eq!(MatchClause::new().max_tier(), MatchTier::None);
        assert_eq!(
            MatchClause::with_expression(FastMatch::new(), MatchExpression::Never).max_tier(),
            MatchTier::MatchExpression
        );
        let hook_clause = MatchClause::complete(
            FastMatch::new(),
            MatchExpression::Always,
            WasmHookRef::new("hook-1".to_string(), "sha256:deadbeef".to_string()),
        );
        assert_eq!(hook_clause.max_tier(), MatchTier::WasmHook);
    }
}

