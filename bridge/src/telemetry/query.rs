//! Read path over the hitlog: `QueryTelemetry` (filtered session summaries)
//! and `GetSession` (full record) as served by the gRPC surface.

use std::path::Path;

use rusqlite::{params_from_iter, Connection};

use super::session::EnforcementSession;

#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub agent_id: Option<String>,
    pub flow_id: Option<String>,
    pub decision: Option<String>,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct SessionSummaryRow {
    pub session_id: String,
    pub agent_id: String,
    pub flow_id: String,
    pub timestamp_ms: i64,
    pub final_decision: String,
    pub rules_evaluated_count: i32,
    pub duration_us: i64,
}

pub struct HitlogQuery {
    conn: Connection,
}

impl HitlogQuery {
    pub fn open(db_path: &Path) -> Result<Self, String> {
        let conn = Connection::open(db_path)
            .map_err(|e| format!("failed to open hitlog for query: {}", e))?;
        Ok(Self { conn })
    }

    /// Filtered session summaries plus the total count matching the filter
    /// (ignoring limit/offset), per spec's `QueryTelemetry` shape.
    pub fn query(&self, filter: &QueryFilter) -> Result<(Vec<SessionSummaryRow>, i32), String> {
        let mut clauses = Vec::new();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(agent_id) = &filter.agent_id {
            clauses.push("agent_id = ?");
            args.push(Box::new(agent_id.clone()));
        }
        if let Some(flow_id) = &filter.flow_id {
            clauses.push("flow_id = ?");
            args.push(Box::new(flow_id.clone()));
        }
        if let Some(decision) = &filter.decision {
            clauses.push("final_decision = ?");
            args.push(Box::new(decision.clone()));
        }
        if let Some(start) = filter.start_time_ms {
            clauses.push("timestamp_ms >= ?");
            args.push(Box::new(start));
        }
        if let Some(end) = filter.end_time_ms {
            clauses.push("timestamp_ms <= ?");
            args.push(Box::new(end));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM sessions {}", where_clause);
        let total_count: i32 = self
            .conn
            .query_row(
                &count_sql,
                params_from_iter(args.iter().map(|b| b.as_ref())),
                |row| row.get(0),
            )
            .map_err(|e| format!("hitlog count query failed: {}", e))?;

        let limit = if filter.limit == 0 { 100 } else { filter.limit };
        let select_sql = format!(
            "SELECT session_id, agent_id, flow_id, timestamp_ms, final_decision, rules_evaluated_count, duration_us
             FROM sessions {} ORDER BY timestamp_ms DESC LIMIT {} OFFSET {}",
            where_clause, limit, filter.offset
        );

        let mut stmt = self
            .conn
            .prepare(&select_sql)
            .map_err(|e| format!("hitlog select prepare failed: {}", e))?;

        let rows = stmt
            .query_map(params_from_iter(args.iter().map(|b| b.as_ref())), |row| {
                Ok(SessionSummaryRow {
                    session_id: row.get(0)?,
                    agent_id: row.get(1)?,
                    flow_id: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    timestamp_ms: row.get(3)?,
                    final_decision: row.get(4)?,
                    rules_evaluated_count: row.get(5)?,
                    duration_us: row.get(6)?,
                })
            })
            .map_err(|e| format!("hitlog select query failed: {}", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("hitlog row decode failed: {}", e))?;

        Ok((rows, total_count))
    }

    /// Fetches the full session record, serialized as JSON.
    pub fn get_session_json(&self, session_id: &str) -> Result<Option<String>, String> {
        self.conn
            .query_row(
                "SELECT session_json FROM sessions WHERE session_id = ?1",
                rusqlite::params![session_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(format!("hitlog get_session query failed: {}", other)),
            })
    }

    /// Fetches and decodes the full session record.
    pub fn get_session(&self, session_id: &str) -> Result<Option<EnforcementSession>, String> {
        match self.get_session_json(session_id)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| format!("session decode failed: {}", e)),
            None => Ok(None),
        }
    }
}
