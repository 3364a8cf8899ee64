//! The Bridge is the root data structure gluing the in-process rule engine
//! (`rule_engine::{DeploymentManager, BundleCRUD, AuditTrail}`) to the
//! host process: it persists installed bundle versions to SQLite so a
//! restart can recover the active deployment, and exposes the operations
//! the gRPC surface needs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rule_engine::{
    AuditTrail, BundleCRUD, BundleParser, BundleValidator, DeploymentManager, DeploymentStrategy,
    EvaluationEngine, HealthThresholds, RolloutPolicy, RuleTable, ValidationResult, VersionId,
};
use rusqlite::{params, Connection};

use crate::config::Config;

/// Configuration for the bridge's own recovery storage (separate from the
/// hitlog, which `telemetry::writer` owns under `HITLOG_DIR`).
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub cold_storage_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cold_storage_path: PathBuf::from("./var/data/bundles.db"),
        }
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS bundle_versions (
    version_id    TEXT PRIMARY KEY,
    bundle_id     TEXT NOT NULL,
    bundle_json   TEXT NOT NULL,
    installed_by  TEXT NOT NULL,
    installed_at  INTEGER NOT NULL,
    active        INTEGER NOT NULL DEFAULT 0
);
";

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Converts a rule bundle's own `RolloutPolicy` (spec 4.6) into the
/// `DeploymentManager`'s `DeploymentStrategy` (spec 4.9). The two enums
/// cover the same rollout shapes but are owned by different components;
/// a bundle's authored policy is what actually drives its deployment.
fn rollout_policy_to_strategy(policy: &RolloutPolicy) -> DeploymentStrategy {
    match policy {
        RolloutPolicy::Immediate => DeploymentStrategy::BlueGreen,
        RolloutPolicy::Canary {
            percentage,
            target_agents: _,
        } => DeploymentStrategy::Canary {
            stages: vec![(percentage * 100.0).clamp(0.0, 100.0), 100.0],
            stage_duration_secs: 60,
        },
        RolloutPolicy::TimeWindow { start_time, .. } => DeploymentStrategy::Scheduled {
            activation_time: *start_time,
        },
    }
}

/// The bridge's view of the rule engine: a live `RuleTable` + `BundleCRUD`
/// for single-rule lifecycle operations, and a `DeploymentManager` +
/// `AuditTrail` shared with bundle-level install/activate/rollback and the
/// per-event `EvaluationEngine`.
pub struct Bridge {
    pub rule_table: Arc<RuleTable>,
    pub deployment: Arc<DeploymentManager>,
    pub audit_trail: Arc<AuditTrail>,
    pub crud: Arc<BundleCRUD>,
    pub evaluation: Arc<EvaluationEngine>,
    validator: BundleValidator,
    created_at: u64,
    db: Arc<Mutex<Connection>>,
}

impl Bridge {
    /// Builds a bridge from a loaded config: health thresholds, validation
    /// ceilings and recovery storage all come from it.
    pub fn new(config: &Config, storage: StorageConfig) -> Result<Self, String> {
        if let Some(parent) = storage.cold_storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("failed to create storage directory: {}", e))?;
            }
        }

        let conn = Connection::open(&storage.cold_storage_path)
            .map_err(|e| format!("failed to open SQLite database: {}", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| format!("failed to create schema: {}", e))?;

        let rule_table = Arc::new(RuleTable::with_config(
            config.cache_ttl_seconds,
            config.max_cache_size,
        ));
        let deployment = Arc::new(DeploymentManager::with_config(
            10,
            HealthThresholds::from(config.health_thresholds.clone()),
            config.auto_rollback,
        ));
        let audit_trail = Arc::new(AuditTrail::new(100_000));
        let crud = Arc::new(BundleCRUD::new(
            rule_table.clone(),
            deployment.clone(),
            audit_trail.clone(),
        ));
        let evaluation = Arc::new(EvaluationEngine::new(deployment.clone(), audit_trail.clone()));

        let validator = BundleValidator::new()
            .with_max_rules(config.max_rules_per_bundle)
            .with_max_priority(config.max_priority)
            .require_signatures(config.require_signatures);

        let bridge = Bridge {
            rule_table,
            deployment,
            audit_trail,
            crud,
            evaluation,
            validator,
            created_at: now_ms(),
            db: Arc::new(Mutex::new(conn)),
        };

        bridge.recover_from_storage()?;
        Ok(bridge)
    }

    /// Re-installs and re-activates the most recently active bundle
    /// version recorded in recovery storage, so a restart resumes the
    /// previous deployment instead of starting empty.
    fn recover_from_storage(&self) -> Result<(), String> {
        let row: Option<(String, String, String)> = {
            let conn = self.db.lock();
            conn.query_row(
                "SELECT version_id, bundle_json, installed_by FROM bundle_versions WHERE active = 1 ORDER BY installed_at DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .ok()
        };

        let Some((_version_id, bundle_json, installed_by)) = row else {
            return Ok(());
        };

        let bundle = BundleParser::from_json(&bundle_json)
            .map_err(|e| format!("recovery: failed to parse stored bundle: {}", e))?;
        let strategy = rollout_policy_to_strategy(&bundle.metadata.rollout_policy);
        let version_id = self
            .deployment
            .prepare_deployment(bundle, strategy, installed_by)?;
        self.deployment.activate_deployment(&version_id)?;
        log::info!("recovered deployment {} from storage", version_id.as_str());
        Ok(())
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Validates and installs a rule bundle: stages it via the deployment
    /// manager and persists it so a restart can recover it.
    pub fn install_bundle(
        &self,
        bundle_json: &str,
        installed_by: String,
    ) -> Result<VersionId, InstallError> {
        let bundle = BundleParser::from_json(bundle_json).map_err(InstallError::Parse)?;
        let result: ValidationResult = self.validator.validate(&bundle);
        if !result.valid {
            return Err(InstallError::Validation(result));
        }

        let strategy = rollout_policy_to_strategy(&bundle.metadata.rollout_policy);
        let bundle_id = bundle.metadata.bundle_id.clone();
        let bundle_json_canonical =
            rule_engine::BundleParser::to_json(&bundle).map_err(InstallError::Parse)?;

        let version_id = self
            .deployment
            .prepare_deployment(bundle, strategy, installed_by.clone())
            .map_err(InstallError::Deployment)?;

        let conn = self.db.lock();
        conn.execute(
            "INSERT OR REPLACE INTO bundle_versions (version_id, bundle_id, bundle_json, installed_by, installed_at, active)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                version_id.as_str(),
                bundle_id.as_str(),
                bundle_json_canonical,
                installed_by,
                now_ms() as i64,
            ],
        )
        .map_err(|e| InstallError::Deployment(format!("failed to persist bundle: {}", e)))?;

        Ok(version_id)
    }

    /// Activates a staged version and marks it active in recovery storage.
    pub fn activate_bundle(&self, version_id: &VersionId) -> Result<(), String> {
        self.deployment.activate_deployment(version_id)?;

        let conn = self.db.lock();
        conn.execute(
            "UPDATE bundle_versions SET active = 0 WHERE active = 1",
            [],
        )
        .map_err(|e| format!("failed to clear previous active flag: {}", e))?;
        conn.execute(
            "UPDATE bundle_versions SET active = 1 WHERE version_id = ?1",
            params![version_id.as_str()],
        )
        .map_err(|e| format!("failed to mark version active: {}", e))?;
        Ok(())
    }

    /// Rolls back to the previous active version and updates the active
    /// flag in recovery storage to match.
    pub fn rollback(&self) -> Result<VersionId, String> {
        let previous = self.deployment.rollback()?;

        let conn = self.db.lock();
        conn.execute(
            "UPDATE bundle_versions SET active = 0 WHERE active = 1",
            [],
        )
        .map_err(|e| format!("failed to clear previous active flag: {}", e))?;
        conn.execute(
            "UPDATE bundle_versions SET active = 1 WHERE version_id = ?1",
            params![previous.as_str()],
        )
        .map_err(|e| format!("failed to mark rollback target active: {}", e))?;
        Ok(previous)
    }
}

/// Errors from `Bridge::install_bundle`.
#[derive(Debug)]
pub enum InstallError {
    Parse(rule_engine::ParseError),
    Validation(ValidationResult),
    Deployment(String),
}

impl std::fmt::Display for InstallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallError::Parse(e) => write!(f, "bundle parse error: {}", e),
            InstallError::Validation(result) => write!(
                f,
                "bundle validation failed: {} error(s)",
                result.errors.len()
            ),
            InstallError::Deployment(e) => write!(f, "deployment error: {}", e),
        }
    }
}

impl std::error::Error for InstallError {}

/// Bridge-level statistics (served by no RPC yet, kept for parity with the
/// teacher's own `stats()` accessor and useful from a future health probe).
#[derive(Debug, Clone)]
pub struct BridgeStats {
    pub active_version: Option<String>,
    pub rule_count: usize,
    pub created_at: u64,
}

impl Bridge {
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            active_version: self
                .deployment
                .get_active_version_id()
                .map(|v| v.as_str().to_string()),
            rule_count: self.rule_table.list_rule_ids().len(),
            created_at: self.created_at,
        }
    }
}
