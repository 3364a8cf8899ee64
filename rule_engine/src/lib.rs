pub mod rule_family;
pub mod rule_metadata;
pub mod match_clause;
pub mod action_clause;
pub mod execution_constraints;
pub mod audit_record;
pub mod rule_bundle;
pub mod rule_table;
pub mod hot_reload;
pub mod bundle_crud;
pub mod evaluation_engine;

pub use rule_family::{Layer, RuleFamily, SecondaryIndexKind};

pub use rule_metadata::{
    AgentId, EnforcementClass, EnforcementMode, FlowId, RuleId, RuleMetadata,
    RuleMetadataBuilder, RuleScope, RuleState, // shared lifecycle state (see bundle_crud)
};

pub use match_clause::{
    ComparisonOp, EventContext, FastMatch, FastMatchBuilder, FieldComparison, FieldValue,
    HeaderFlags, JsonPathQuery, MatchClause, MatchExpression, MatchResult, MatchTier,
    PayloadData, RegexMatch, WasmHookOutcome, WasmHookRef,
};

// Re-export action_clause types
pub use action_clause::{
    ActionClause, ActionClauseBuilder, ActionContext, ActionResult, ActionType,
    AllowedSideEffect, AllowParams, AttachMetadataParams, CallbackParams, DenyParams, LogLevel,
    LogParams, RateLimitParams, RateLimitScope, RedactParams, RedactionStrategy,
    RewriteOperation, RewriteParams, RouteToParams, SandboxExecuteParams, SidecarSpec,
    SpawnSidecarParams, TransformFunction,
};

pub use execution_constraints::{
    ConstraintEnforcer, ConstraintError, ConstraintViolationType, ExecutionBudget,
    ExecutionConstraints, ExecutionStats, RetryPolicy, RuleType,
};

pub use audit_record::{
    AuditContext, AuditContextBuilder, AuditLogLevel, AuditRecord, AuditRecordBuilder,
    AuditTrail, CompactDecisionRecord, DecisionOutcome, EvaluationTimestamps,
    ExecutionStatistics, PayloadRef, SequenceNumber,
};

pub use rule_bundle::{
    BundleCompiler,         // Bundle compilation
    BundleId,               // Bundle identifier type
    BundleMetadata,         // Bundle metadata
    BundleParser,           // JSON parsing/serialization
    BundleValidator,        // Comprehensive validator
    CompiledBundle,         // Compiled bundle output
    CompiledRule,           // Compiled rule
    CompilationError,       // Compilation errors
    ParseError,             // Parse errors
    RevocationPolicy,       // Deactivation policy
    RolloutPolicy,          // Deployment policy
    Rule,                   // Complete rule definition
    RuleBundle,             // Rule collection
    ValidationError,        // Validation error types
    ValidationResult,       // Validation outcome
    ValidationWarning,      // Validation warning types
};

pub use rule_table::{
    RuleTable,              // Main in-memory rule storage
    RuleQuery,              // Query builder for rule lookups
    RuleEntry,              // Rule entry with metadata
    RuleStats,              // Per-rule execution statistics
    TableStats,             // Table-level statistics
};

pub use hot_reload::{
    DeploymentManager,      // Main hot reload manager
    DeploymentState,        // Deployment state enum
    DeploymentStrategy,     // Deployment strategy enum
    HealthMetrics,          // Health monitoring metrics
    HealthThresholds,       // Health check thresholds
    VersionId,              // Deployment version identifier
    compute_request_hash,   // Helper for request routing
};

pub use bundle_crud::{
    BundleCRUD,             // Main CRUD manager
    ConflictInfo,           // Conflict detection result
    ConflictType,           // Type of conflict
    OperationHandle,        // Operation handle returned from CRUD
    RuleStats as CRUDRuleStats,              // Rule statistics (from CRUD)
};

pub use evaluation_engine::{
    EvaluationEngine,       // Per-event decision pipeline
    EvaluationOutcome,      // Result of evaluating one event
};
