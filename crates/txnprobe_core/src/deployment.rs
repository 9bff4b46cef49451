//! Deployment lifecycle seam.
//!
//! A deployment is the external database instance the probe runs against,
//! consumed through a narrow surface: start it, stop it, ask for its state
//! and connection endpoint. The real container handle lives in the mongo
//! binding crate; [`MockDeployment`] covers tests that need no container.

use crate::error::{ProbeError, ProbeResult};

/// Lifecycle state of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    /// Not running; no endpoint.
    Stopped,
    /// Start requested, not yet serving.
    Starting,
    /// Serving; endpoint available.
    Running,
}

/// An external database deployment with a start/stop lifecycle.
#[allow(async_fn_in_trait)]
pub trait Deployment {
    /// Transitions the deployment to running. Failure is a setup fault.
    async fn start(&mut self) -> ProbeResult<()>;

    /// Stops the deployment and discards its endpoint.
    async fn stop(&mut self) -> ProbeResult<()>;

    /// Current lifecycle state.
    fn state(&self) -> DeploymentState;

    /// Connection endpoint; `Some` exactly while running.
    fn endpoint(&self) -> Option<String>;

    /// Returns true while the deployment is serving.
    fn is_running(&self) -> bool {
        self.state() == DeploymentState::Running
    }
}

/// An in-memory deployment for tests.
#[derive(Debug)]
pub struct MockDeployment {
    state: DeploymentState,
    url: String,
    start_failure: Option<String>,
    transitions: Vec<DeploymentState>,
}

impl MockDeployment {
    /// Creates a stopped mock deployment.
    pub fn new() -> Self {
        Self {
            state: DeploymentState::Stopped,
            url: "mongodb://mock.local:27017/?directConnection=true".to_string(),
            start_failure: None,
            transitions: Vec::new(),
        }
    }

    /// Makes the next start attempt fail with the given message.
    #[must_use]
    pub fn with_start_failure(mut self, message: impl Into<String>) -> Self {
        self.start_failure = Some(message.into());
        self
    }

    /// Every state this deployment has passed through.
    pub fn transitions(&self) -> &[DeploymentState] {
        &self.transitions
    }

    fn set_state(&mut self, state: DeploymentState) {
        self.state = state;
        self.transitions.push(state);
    }
}

impl Default for MockDeployment {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployment for MockDeployment {
    async fn start(&mut self) -> ProbeResult<()> {
        self.set_state(DeploymentState::Starting);
        if let Some(message) = self.start_failure.take() {
            self.set_state(DeploymentState::Stopped);
            return Err(ProbeError::setup(message));
        }
        self.set_state(DeploymentState::Running);
        Ok(())
    }

    async fn stop(&mut self) -> ProbeResult<()> {
        self.set_state(DeploymentState::Stopped);
        Ok(())
    }

    fn state(&self) -> DeploymentState {
        self.state
    }

    fn endpoint(&self) -> Option<String> {
        (self.state == DeploymentState::Running).then(|| self.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle_transitions() {
        let mut deployment = MockDeployment::new();
        assert_eq!(deployment.state(), DeploymentState::Stopped);
        assert!(deployment.endpoint().is_none());

        deployment.start().await.unwrap();
        assert!(deployment.is_running());
        assert!(deployment.endpoint().is_some());

        deployment.stop().await.unwrap();
        assert_eq!(deployment.state(), DeploymentState::Stopped);
        assert!(deployment.endpoint().is_none());

        assert_eq!(
            deployment.transitions(),
            &[
                DeploymentState::Starting,
                DeploymentState::Running,
                DeploymentState::Stopped,
            ]
        );
    }

    #[tokio::test]
    async fn forced_start_failure() {
        let mut deployment = MockDeployment::new().with_start_failure("no runtime");

        let err = deployment.start().await.unwrap_err();
        assert!(err.is_setup());
        assert_eq!(deployment.state(), DeploymentState::Stopped);
        assert!(deployment.endpoint().is_none());
    }
}
