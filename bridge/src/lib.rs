//! # Rule Bridge
//!
//! The host-facing half of the data-plane rule engine: gRPC surface,
//! hitlog telemetry, persisted deployment recovery and configuration
//! around the in-process `rule_engine` core.

pub mod bridge;
pub mod config;
pub mod grpc_server;
pub mod refresh;
pub mod telemetry;

pub use bridge::Bridge;
