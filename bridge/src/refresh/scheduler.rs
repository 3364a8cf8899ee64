//! Background task advancing canary rollouts: spec 4.9's
//! `advance_rollout()` must be called periodically so a canary stage that
//! has elapsed and is healthy moves to the next percentage.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use rule_engine::DeploymentManager;
use tokio::time::interval;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            enabled: true,
        }
    }
}

/// Ticks `DeploymentManager::advance_rollout()` on an interval as a
/// background tokio task.
pub struct RolloutScheduler {
    deployment: Arc<DeploymentManager>,
    config: SchedulerConfig,
}

impl RolloutScheduler {
    pub fn new(deployment: Arc<DeploymentManager>, config: SchedulerConfig) -> Self {
        Self { deployment, config }
    }

    pub async fn start(self: Arc<Self>) {
        if !self.config.enabled {
            info!("rollout scheduler disabled, skipping");
            return;
        }

        info!(
            "starting rollout scheduler with {}-second tick interval",
            self.config.tick_interval.as_secs()
        );

        let mut ticker = interval(self.config.tick_interval);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    async fn tick(&self) {
        match self.deployment.advance_rollout() {
            Ok(true) => info!("rollout advanced to next stage"),
            Ok(false) => {}
            Err(e) => error!("rollout advance failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_enabled() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.tick_interval.as_secs(), 10);
    }
}
