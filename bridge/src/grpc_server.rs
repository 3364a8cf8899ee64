//! gRPC surface (spec section 6): rule-installation/deployment-control RPCs
//! from the Management Plane and the per-event `Enforce` RPC from the
//! SDK/interceptor, both served from one `DataPlaneService` impl wrapping
//! `Bridge`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rule_engine::{AgentId, EventContext, FlowId, HeaderFlags};
use tonic::{transport::Server, Request, Response, Status};

use crate::bridge::{Bridge, InstallError};
use crate::telemetry::{HitlogQuery, QueryFilter, TelemetryRecorder};

pub mod rule_installation {
    tonic::include_proto!("rule_installation");
}

use rule_installation::data_plane_service_server::{DataPlaneService, DataPlaneServiceServer};
use rule_installation::{
    ActivateBundleRequest, ActivateBundleResponse, EnforceRequest, EnforceResponse,
    GetSessionRequest, GetSessionResponse, InstallBundleRequest, InstallBundleResponse,
    QueryTelemetryRequest, QueryTelemetryResponse, RollbackRequest, RollbackResponse,
    SessionSummary,
};

pub struct DataPlaneServiceImpl {
    bridge: Arc<Bridge>,
    recorder: Arc<TelemetryRecorder>,
    hitlog_path: std::path::PathBuf,
}

impl DataPlaneServiceImpl {
    pub fn new(
        bridge: Arc<Bridge>,
        recorder: Arc<TelemetryRecorder>,
        hitlog_path: std::path::PathBuf,
    ) -> Self {
        Self {
            bridge,
            recorder,
            hitlog_path,
        }
    }
}

/// Builds the event context the evaluation engine matches against from an
/// `EnforceRequest`. `agent_id`/`flow_id` are carried as dedicated request
/// fields (not re-parsed out of `event_json`); `event_json`'s top-level
/// `action` field, when present, becomes the payload type used for family
/// scoping, and the full JSON is passed through as the evaluated payload.
fn build_event_context(request: &EnforceRequest) -> EventContext {
    let payload_type = serde_json::from_str::<serde_json::Value>(&request.event_json)
        .ok()
        .and_then(|v| v.get("action").and_then(|a| a.as_str()).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    EventContext {
        source_agent: AgentId::new(request.agent_id.clone()),
        dest_agent: None,
        flow_id: if request.flow_id.is_empty() {
            None
        } else {
            Some(FlowId::new(request.flow_id.clone()))
        },
        payload_type,
        header_flags: HeaderFlags::empty(),
        headers: HashMap::new(),
    }
}

#[tonic::async_trait]
impl DataPlaneService for DataPlaneServiceImpl {
    async fn install_bundle(
        &self,
        request: Request<InstallBundleRequest>,
    ) -> Result<Response<InstallBundleResponse>, Status> {
        let req = request.into_inner();
        let version_id = self
            .bridge
            .install_bundle(&req.bundle_json, req.installed_by)
            .map_err(|e| match e {
                InstallError::Parse(e) => Status::invalid_argument(e.to_string()),
                InstallError::Validation(result) => Status::invalid_argument(format!(
                    "{:?}",
                    result.errors
                )),
                InstallError::Deployment(e) => Status::internal(e),
            })?;

        Ok(Response::new(InstallBundleResponse {
            operation_handle: version_id.as_str().to_string(),
        }))
    }

    async fn activate_bundle(
        &self,
        request: Request<ActivateBundleRequest>,
    ) -> Result<Response<ActivateBundleResponse>, Status> {
        let req = request.into_inner();
        let version_id = rule_engine::VersionId::new(req.version_id);

        self.bridge
            .activate_bundle(&version_id)
            .map_err(Status::failed_precondition)?;

        Ok(Response::new(ActivateBundleResponse {
            state: "active".to_string(),
        }))
    }

    async fn rollback(
        &self,
        _request: Request<RollbackRequest>,
    ) -> Result<Response<RollbackResponse>, Status> {
        let previous = self
            .bridge
            .rollback()
            .map_err(Status::failed_precondition)?;

        Ok(Response::new(RollbackResponse {
            previous_version: previous.as_str().to_string(),
        }))
    }

    async fn enforce(
        &self,
        request: Request<EnforceRequest>,
    ) -> Result<Response<EnforceResponse>, Status> {
        let req = request.into_inner();
        let ctx = build_event_context(&req);
        let mut payload = req.event_json.clone().into_bytes();
        let mut metadata = HashMap::new();

        let start = Instant::now();
        let outcome = self
            .bridge
            .evaluation
            .evaluate(&ctx, Some(&mut payload), &mut metadata);
        let duration_us = start.elapsed().as_micros() as u64;

        let session = self.recorder.record(
            &req.agent_id,
            if req.flow_id.is_empty() {
                None
            } else {
                Some(req.flow_id.as_str())
            },
            &outcome,
            duration_us,
        );

        Ok(Response::new(EnforceResponse {
            decision: session.final_decision,
            rule_id: outcome.rule_id.map(|id| id.as_str()),
            slice_similarities: Vec::new(),
            rationale: outcome.decision.summary(),
            latency_ms: duration_us / 1000,
        }))
    }

    async fn query_telemetry(
        &self,
        request: Request<QueryTelemetryRequest>,
    ) -> Result<Response<QueryTelemetryResponse>, Status> {
        let req = request.into_inner();
        let query = HitlogQuery::open(&self.hitlog_path).map_err(Status::internal)?;

        let filter = QueryFilter {
            agent_id: req.agent_id,
            flow_id: req.flow_id,
            decision: req.decision,
            start_time_ms: req.start_time_ms,
            end_time_ms: req.end_time_ms,
            limit: req.limit,
            offset: req.offset,
        };

        let (rows, total_count) = query.query(&filter).map_err(Status::internal)?;

        let sessions = rows
            .into_iter()
            .map(|row| SessionSummary {
                session_id: row.session_id,
                agent_id: row.agent_id,
                flow_id: row.flow_id,
                timestamp_ms: row.timestamp_ms,
                final_decision: row.final_decision,
                rules_evaluated_count: row.rules_evaluated_count,
                duration_us: row.duration_us,
            })
            .collect();

        Ok(Response::new(QueryTelemetryResponse {
            sessions,
            total_count,
        }))
    }

    async fn get_session(
        &self,
        request: Request<GetSessionRequest>,
    ) -> Result<Response<GetSessionResponse>, Status> {
        let req = request.into_inner();
        let query = HitlogQuery::open(&self.hitlog_path).map_err(Status::internal)?;

        let session_json = query
            .get_session_json(&req.session_id)
            .map_err(Status::internal)?
            .ok_or_else(|| Status::not_found(format!("session {} not found", req.session_id)))?;

        Ok(Response::new(GetSessionResponse { session_json }))
    }
}

/// Starts the gRPC server and serves until the process is terminated.
pub async fn start_grpc_server(
    bridge: Arc<Bridge>,
    recorder: Arc<TelemetryRecorder>,
    hitlog_path: std::path::PathBuf,
    listen_addr: std::net::SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("starting data plane gRPC server on {}", listen_addr);
    let service = DataPlaneServiceImpl::new(bridge, recorder, hitlog_path);

    Server::builder()
        .add_service(DataPlaneServiceServer::new(service))
        .serve(listen_addr)
        .await?;

    Ok(())
}
