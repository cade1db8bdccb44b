use std::fmt;
use std::time::Duration;

use busan_core::{RuntimeConfig, ServiceName};

use crate::client::DaemonClient;
use crate::daemon::DaemonError;
use crate::registry::VersionedImage;
use crate::transport::{ContainerSpec, DaemonTransport};

/// Time a stale container is given to shut down before the daemon kills it.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(90);

/// The service's containers on the daemon, relative to one desired image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSet {
    /// Container already bound to the desired image.
    pub current: Option<String>,
    /// Every other container belonging to the service, in listing order.
    pub stale: Vec<String>,
}

/// How far a stale container got through teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownState {
    Running,
    Stopping,
    Stopped,
    Removed,
}

impl fmt::Display for TeardownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// The container now running the desired image.
    pub container_id: String,
    pub created: bool,
    pub started: bool,
    /// Stale containers torn down during this pass.
    pub removed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ContainerReconciler<'a, T: DaemonTransport>(&'a DaemonClient<T>);

impl<'a, T: DaemonTransport> ContainerReconciler<'a, T> {
    pub fn new(client: &'a DaemonClient<T>) -> Self {
        Self(client)
    }
}

impl<T: DaemonTransport> ContainerReconciler<'_, T> {
    /// Partitions the daemon's containers (stopped ones included) into the
    /// one bound to `image` and the stale rest.
    ///
    /// A container is bound to `image` when it was created from the
    /// service tag for the image's version or from the image identifier.
    /// Only the first such container is current; later duplicates are stale.
    pub async fn survey(
        &self,
        service: &ServiceName,
        image: &VersionedImage,
    ) -> Result<ContainerSet, ReconcileError> {
        let containers = self
            .0
            .transport()
            .list_containers(true)
            .await
            .map_err(|e| ReconcileError::Survey { source: e })?;

        let expected_tag = service.image_tag(&image.version);
        let mut set = ContainerSet::default();

        for container in containers {
            let bound = container.image == expected_tag || container.image == image.id;
            let ours = service.matches_image(&container.image)
                || container.names.iter().any(|n| n == service.as_str());

            if bound && set.current.is_none() {
                set.current = Some(container.id);
            } else if bound || ours {
                set.stale.push(container.id);
            }
        }

        tracing::debug!(
            current = ?set.current,
            stale = set.stale.len(),
            "surveyed containers"
        );
        Ok(set)
    }

    /// Brings the daemon to exactly one running container for `service`,
    /// bound to `image`.
    ///
    /// Stale containers are torn down first and any failure there aborts
    /// the pass. Running it again with no daemon change creates, stops and
    /// starts nothing.
    pub async fn reconcile(
        &self,
        service: &ServiceName,
        image: &VersionedImage,
        set: ContainerSet,
        config: Option<&RuntimeConfig>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let ContainerSet { current, stale } = set;
        let mut removed = Vec::with_capacity(stale.len());

        for container_id in stale {
            if current.as_deref() == Some(container_id.as_str()) {
                continue;
            }
            self.teardown(&container_id).await?;
            removed.push(container_id);
        }

        let (container_id, created) = match current {
            Some(id) => {
                tracing::info!("Latest container is already installed {id}");
                (id, false)
            }
            None => {
                tracing::info!("Creating container");
                let spec = container_spec(service, image, config);
                let id = self
                    .0
                    .transport()
                    .create_container(&spec)
                    .await
                    .map_err(|e| ReconcileError::Create {
                        name: spec.name.clone(),
                        source: e,
                    })?;
                (id, true)
            }
        };

        let started = if self.is_running(&container_id).await? {
            tracing::info!("Container {container_id} is already running");
            false
        } else {
            self.0
                .transport()
                .start_container(&container_id)
                .await
                .map_err(|e| ReconcileError::Start {
                    container: container_id.clone(),
                    source: e,
                })?;
            tracing::info!("Container {container_id} is now up");
            true
        };

        Ok(ReconcileOutcome {
            container_id,
            created,
            started,
            removed,
        })
    }

    /// Stop, wait for exit, then remove. Each step must succeed before the
    /// next is attempted.
    async fn teardown(&self, container_id: &str) -> Result<(), ReconcileError> {
        let transport = self.0.transport();
        let fail = |reached, source| ReconcileError::Teardown {
            container: container_id.to_owned(),
            reached,
            source,
        };

        tracing::info!("Stopping container {container_id}");
        transport
            .stop_container(container_id, STOP_GRACE_PERIOD)
            .await
            .map_err(|e| fail(TeardownState::Running, e))?;

        let exit_code = transport
            .wait_container(container_id)
            .await
            .map_err(|e| fail(TeardownState::Stopping, e))?;
        tracing::debug!(container_id, exit_code, "container exited");

        transport
            .remove_container(container_id)
            .await
            .map_err(|e| fail(TeardownState::Stopped, e))?;
        tracing::debug!(container_id, state = %TeardownState::Removed, "teardown complete");

        Ok(())
    }

    async fn is_running(&self, container_id: &str) -> Result<bool, ReconcileError> {
        let running = self
            .0
            .transport()
            .list_containers(false)
            .await
            .map_err(|e| ReconcileError::RunningCheck {
                container: container_id.to_owned(),
                source: e,
            })?;

        Ok(running.iter().any(|c| c.id == container_id))
    }
}

/// Container definition for `image`, named after the service.
///
/// The container is created from the service tag when the image carries
/// it, otherwise from the image identifier; [`ContainerReconciler::survey`]
/// recognizes either. `NAME` and `VERSION` are always injected.
pub fn container_spec(
    service: &ServiceName,
    image: &VersionedImage,
    config: Option<&RuntimeConfig>,
) -> ContainerSpec {
    let tag = service.image_tag(&image.version);
    let reference = if image.repo_tags.contains(&tag) {
        tag
    } else {
        image.id.clone()
    };

    let mut spec = ContainerSpec {
        name: service.as_str().to_owned(),
        image: reference,
        env: vec![
            format!("NAME={service}"),
            format!("VERSION={}", image.version),
        ],
        ..Default::default()
    };

    if let Some(config) = config {
        spec.mount_points = config.mount_points().map(str::to_owned).collect();
        spec.binds = config.binds();
        spec.published_ports = config.exposed_ports.clone();
    }

    spec
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to list containers")]
    Survey { source: DaemonError },

    #[error("failed to tear down container {container} (reached: {reached})")]
    Teardown {
        container: String,
        reached: TeardownState,
        source: DaemonError,
    },

    #[error("failed to create container {name}")]
    Create { name: String, source: DaemonError },

    #[error("failed to check whether container {container} is running")]
    RunningCheck {
        container: String,
        source: DaemonError,
    },

    #[error("failed to start container {container}")]
    Start {
        container: String,
        source: DaemonError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(version: &str) -> VersionedImage {
        VersionedImage {
            id: "sha256:abc".to_owned(),
            repo_tags: vec![format!("web:v{version}")],
            version: version.to_owned(),
        }
    }

    #[test]
    fn spec_without_config_only_sets_identity() {
        let svc = ServiceName::new("web").unwrap();
        let spec = container_spec(&svc, &image("1.2"), None);

        assert_eq!(spec.name, "web");
        assert_eq!(spec.image, "web:v1.2");
        assert_eq!(spec.env, vec!["NAME=web", "VERSION=1.2"]);
        assert!(spec.mount_points.is_empty());
        assert!(spec.binds.is_empty());
        assert!(spec.published_ports.is_empty());
    }

    #[test]
    fn spec_falls_back_to_image_id_without_service_tag() {
        let svc = ServiceName::new("web").unwrap();
        let rc = VersionedImage {
            id: "sha256:rc".to_owned(),
            repo_tags: vec!["web:v1.0-rc1".to_owned()],
            version: "1.0".to_owned(),
        };

        let spec = container_spec(&svc, &rc, None);

        assert_eq!(spec.image, "sha256:rc");
        assert_eq!(spec.env, vec!["NAME=web", "VERSION=1.0"]);
    }

    #[test]
    fn spec_carries_volumes_and_ports() {
        let svc = ServiceName::new("web").unwrap();
        let mut config = RuntimeConfig::default();
        config
            .volumes
            .insert("/data".to_owned(), "/srv/data:ro".to_owned());
        config.exposed_ports.push("8080/tcp".to_owned());

        let spec = container_spec(&svc, &image("1.2"), Some(&config));

        assert_eq!(spec.mount_points, vec!["/data"]);
        assert_eq!(spec.binds, vec!["/srv/data:/data:ro"]);
        assert_eq!(spec.published_ports, vec!["8080/tcp"]);
    }

    #[test]
    fn teardown_state_display() {
        assert_eq!(TeardownState::Stopping.to_string(), "stopping");
        assert_eq!(TeardownState::Removed.to_string(), "removed");
    }
}
