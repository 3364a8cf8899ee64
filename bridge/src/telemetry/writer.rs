//! Persists `EnforcementSession` records to an append-only SQLite-backed
//! hitlog under `HITLOG_DIR`, with size-based rotation that gzips the
//! rolled-off shard.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use super::session::EnforcementSession;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    session_id             TEXT PRIMARY KEY,
    agent_id                TEXT NOT NULL,
    flow_id                 TEXT,
    timestamp_ms            INTEGER NOT NULL,
    final_decision          TEXT NOT NULL,
    rules_evaluated_count   INTEGER NOT NULL,
    duration_us             INTEGER NOT NULL,
    session_json            TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_agent_ts ON sessions (agent_id, timestamp_ms);
";

#[derive(Debug, Clone)]
pub struct RotationPolicy {
    /// Rotate once the active shard exceeds this many bytes.
    pub max_shard_bytes: u64,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_shard_bytes: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HitlogConfig {
    pub dir: PathBuf,
    pub rotation: RotationPolicy,
}

impl Default for HitlogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./var/hitlog"),
            rotation: RotationPolicy::default(),
        }
    }
}

pub struct HitlogWriter {
    conn: Mutex<Connection>,
    active_path: PathBuf,
    dir: PathBuf,
    rotation: RotationPolicy,
}

impl HitlogWriter {
    pub fn new(config: HitlogConfig) -> Result<Self, String> {
        std::fs::create_dir_all(&config.dir)
            .map_err(|e| format!("failed to create hitlog dir: {}", e))?;

        let active_path = config.dir.join("active.db");
        let conn = Connection::open(&active_path)
            .map_err(|e| format!("failed to open hitlog db: {}", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| format!("failed to create hitlog schema: {}", e))?;

        Ok(Self {
            conn: Mutex::new(conn),
            active_path,
            dir: config.dir,
            rotation: config.rotation,
        })
    }

    pub fn path(&self) -> &Path {
        &self.active_path
    }

    /// Appends one session record, rotating the active shard first if it
    /// has grown past the configured size.
    pub fn append(&self, session: &EnforcementSession) -> Result<(), String> {
        self.rotate_if_needed()?;

        let session_json =
            serde_json::to_string(session).map_err(|e| format!("session encode failed: {}", e))?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO sessions (session_id, agent_id, flow_id, timestamp_ms, final_decision, rules_evaluated_count, duration_us, session_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.session_id,
                session.agent_id,
                session.flow_id,
                session.timestamp_ms,
                session.final_decision,
                session.rules_evaluated_count as i64,
                session.duration_us as i64,
                session_json,
            ],
        )
        .map_err(|e| format!("hitlog insert failed: {}", e))?;

        Ok(())
    }

    /// Returns a read-only connection handle path for queries (the query
    /// module opens its own connection to avoid contending on the writer's
    /// lock for read-heavy telemetry queries).
    pub fn connection_path(&self) -> PathBuf {
        self.active_path.clone()
    }

    fn rotate_if_needed(&self) -> Result<(), String> {
        let size = std::fs::metadata(&self.active_path)
            .map(|m| m.len())
            .unwrap_or(0);
        if size < self.rotation.max_shard_bytes {
            return Ok(());
        }

        let rotated_name = format!(
            "hitlog-{}.db",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis()
        );
        let rotated_path = self.dir.join(&rotated_name);

        {
            let conn = self.conn.lock();
            drop(conn);
        }
        std::fs::rename(&self.active_path, &rotated_path)
            .map_err(|e| format!("hitlog rotation rename failed: {}", e))?;
        compress_shard(&rotated_path)?;

        let new_conn = Connection::open(&self.active_path)
            .map_err(|e| format!("failed to reopen hitlog db after rotation: {}", e))?;
        new_conn
            .execute_batch(SCHEMA)
            .map_err(|e| format!("failed to recreate hitlog schema after rotation: {}", e))?;
        *self.conn.lock() = new_conn;

        Ok(())
    }
}

fn compress_shard(path: &Path) -> Result<(), String> {
    let mut input =
        File::open(path).map_err(|e| format!("failed to open rotated shard: {}", e))?;
    let mut contents = Vec::new();
    input
        .read_to_end(&mut contents)
        .map_err(|e| format!("failed to read rotated shard: {}", e))?;

    let gz_path = path.with_extension("db.gz");
    let gz_file =
        File::create(&gz_path).map_err(|e| format!("failed to create gz shard: {}", e))?;
    let mut encoder = GzEncoder::new(gz_file, Compression::default());
    encoder
        .write_all(&contents)
        .map_err(|e| format!("failed to gzip rotated shard: {}", e))?;
    encoder
        .finish()
        .map_err(|e| format!("failed to finalize gz shard: {}", e))?;

    std::fs::remove_file(path).map_err(|e| format!("failed to remove rotated shard: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let writer = HitlogWriter::new(HitlogConfig {
            dir: dir.path().to_path_buf(),
            rotation: RotationPolicy::default(),
        })
        .unwrap();

        let session = EnforcementSession {
            session_id: "s1".to_string(),
            agent_id: "agent-a".to_string(),
            flow_id: None,
            timestamp_ms: 1,
            final_decision: "allow".to_string(),
            rule_id: None,
            rules_evaluated_count: 0,
            duration_us: 10,
            events: vec![],
        };
        writer.append(&session).unwrap();
        assert!(writer.path().exists());
    }
}
