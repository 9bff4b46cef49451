//! Ephemeral replica-set container handle.

use testcontainers_modules::mongo::Mongo;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::{ContainerAsync, ImageExt};
use tracing::{debug, info};
use txnprobe_core::{Deployment, DeploymentState, ProbeError, ProbeResult};

/// Image tag launched when none is configured.
pub const DEFAULT_IMAGE_TAG: &str = "7.0";

const MONGO_PORT: u16 = 27017;

/// A single-node MongoDB replica set running in a container.
///
/// Multi-document transactions require a replica set, so the container is
/// launched with replica-set bootstrap enabled and the endpoint carries
/// `directConnection=true` (the member advertises its in-container
/// hostname, which is not reachable from the host).
pub struct MongoReplica {
    tag: String,
    state: DeploymentState,
    container: Option<ContainerAsync<Mongo>>,
    endpoint: Option<String>,
}

impl MongoReplica {
    /// Creates a stopped handle with the default image tag.
    pub fn new() -> Self {
        Self {
            tag: DEFAULT_IMAGE_TAG.to_string(),
            state: DeploymentState::Stopped,
            container: None,
            endpoint: None,
        }
    }

    /// Sets the image tag to launch.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// The replica-set connection string, while running.
    pub fn replica_set_url(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

impl Default for MongoReplica {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployment for MongoReplica {
    async fn start(&mut self) -> ProbeResult<()> {
        if self.state == DeploymentState::Running {
            return Ok(());
        }
        self.state = DeploymentState::Starting;
        debug!(tag = %self.tag, "launching mongodb replica-set container");

        let container = Mongo::repl_set()
            .with_tag(self.tag.clone())
            .start()
            .await
            .map_err(|e| {
                self.state = DeploymentState::Stopped;
                ProbeError::setup(format!("container failed to start: {e}"))
            })?;

        let host = container.get_host().await.map_err(|e| {
            self.state = DeploymentState::Stopped;
            ProbeError::setup(format!("container host lookup failed: {e}"))
        })?;
        let port = container.get_host_port_ipv4(MONGO_PORT).await.map_err(|e| {
            self.state = DeploymentState::Stopped;
            ProbeError::setup(format!("container port mapping failed: {e}"))
        })?;

        let endpoint = format!("mongodb://{host}:{port}/?directConnection=true");
        info!(%endpoint, "mongodb replica set is up");
        self.endpoint = Some(endpoint);
        self.container = Some(container);
        self.state = DeploymentState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> ProbeResult<()> {
        if let Some(container) = self.container.take() {
            debug!("stopping mongodb replica-set container");
            container
                .stop()
                .await
                .map_err(|e| ProbeError::driver_with("container failed to stop", e))?;
            container
                .rm()
                .await
                .map_err(|e| ProbeError::driver_with("container failed to be removed", e))?;
        }
        self.endpoint = None;
        self.state = DeploymentState::Stopped;
        Ok(())
    }

    fn state(&self) -> DeploymentState {
        self.state
    }

    fn endpoint(&self) -> Option<String> {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_stopped_without_endpoint() {
        let replica = MongoReplica::new();
        assert_eq!(replica.state(), DeploymentState::Stopped);
        assert!(replica.endpoint().is_none());
        assert!(replica.replica_set_url().is_none());
    }

    #[test]
    fn tag_is_configurable() {
        let replica = MongoReplica::new().with_tag("6.0");
        assert_eq!(replica.tag, "6.0");
    }
}
