use std::collections::HashMap;
use std::pin::pin;
use std::time::Duration;

use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig, PortBinding};
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, ListContainersOptions, ListImagesOptions,
    RemoveContainerOptions, RemoveImageOptions, StartContainerOptions, StopContainerOptions,
    WaitContainerOptions,
};
use busan_build::PackedContext;
use tokio_stream::StreamExt;
use tokio_util::io::ReaderStream;

use crate::daemon::DaemonError;
use crate::endpoint::DaemonEndpoint;
use crate::progress::ProgressSink;

/// Per-request timeout handed to the daemon connection, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// An image as listed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: String,
    pub repo_tags: Vec<String>,
}

/// A container as listed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    /// Image reference the container was created from, as reported by the daemon.
    pub image: String,
    /// Container names, without the leading `/`.
    pub names: Vec<String>,
}

/// Everything needed to create the managed container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: Vec<String>,
    /// Container paths declared as empty mount points.
    pub mount_points: Vec<String>,
    /// `host:container[:mode]` bind specifications.
    pub binds: Vec<String>,
    /// `port/proto` entries published on an ephemeral host port.
    pub published_ports: Vec<String>,
}

/// Abstraction over the daemon protocol for testability.
///
/// Production code uses [`BollardTransport`], tests use mockall-generated mocks.
/// Every call blocks the pipeline until the daemon answers.
#[allow(async_fn_in_trait)]
pub trait DaemonTransport: Send + Sync {
    /// List every image, including intermediate ones.
    async fn list_images(&self) -> Result<Vec<ImageRecord>, DaemonError>;

    /// Build an image from an archived context, forwarding daemon output
    /// to `progress` as it arrives.
    async fn build_image(
        &self,
        tag: &str,
        context: PackedContext,
        progress: &mut ProgressSink,
    ) -> Result<(), DaemonError>;

    async fn remove_image(&self, image_id: &str) -> Result<(), DaemonError>;

    /// List containers; `all` includes stopped ones.
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerRecord>, DaemonError>;

    /// Create a container and return its identifier.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DaemonError>;

    async fn start_container(&self, container_id: &str) -> Result<(), DaemonError>;

    /// Ask the container to stop, killing it after `grace`.
    async fn stop_container(&self, container_id: &str, grace: Duration) -> Result<(), DaemonError>;

    /// Block until the container has exited and return its exit code.
    async fn wait_container(&self, container_id: &str) -> Result<i64, DaemonError>;

    async fn remove_container(&self, container_id: &str) -> Result<(), DaemonError>;
}

/// Docker Engine API transport.
#[derive(Debug, Clone)]
pub struct BollardTransport {
    docker: Docker,
}

impl BollardTransport {
    /// Connect to the daemon at `endpoint`.
    pub async fn connect(endpoint: &DaemonEndpoint) -> Result<Self, DaemonError> {
        let connect_err = |source| DaemonError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        let docker = match endpoint {
            DaemonEndpoint::Unix(path) => Docker::connect_with_unix(
                &path.to_string_lossy(),
                REQUEST_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            ),
            DaemonEndpoint::Tcp(host) => Docker::connect_with_http(
                &format!("tcp://{host}"),
                REQUEST_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            ),
        }
        .map_err(connect_err)?;

        // Bollard doesn't actually connect with the `connect_*` call.
        // Do a /ping to ensure we can connect before proceeding.
        docker.ping().await.map_err(connect_err)?;

        Ok(Self { docker })
    }

    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }
}

impl DaemonTransport for BollardTransport {
    async fn list_images(&self) -> Result<Vec<ImageRecord>, DaemonError> {
        let opts = ListImagesOptions {
            all: true,
            ..Default::default()
        };

        let images = self
            .docker
            .list_images(Some(opts))
            .await
            .map_err(DaemonError::request("list images"))?;

        Ok(images
            .into_iter()
            .map(|image| ImageRecord {
                id: image.id,
                repo_tags: image.repo_tags,
            })
            .collect())
    }

    async fn build_image(
        &self,
        tag: &str,
        context: PackedContext,
        progress: &mut ProgressSink,
    ) -> Result<(), DaemonError> {
        let opts = BuildImageOptions {
            t: Some(tag.to_owned()),
            rm: true,
            ..Default::default()
        };

        let body = archive_stream(context);
        let mut stream = pin!(
            self.docker
                .build_image(opts, None, Some(bollard::body_try_stream(body)))
        );

        while let Some(item) = stream.next().await {
            let info = item.map_err(DaemonError::request("build image"))?;

            if let Some(detail) = info.error_detail {
                return Err(DaemonError::BuildFailed {
                    message: detail.message.unwrap_or_else(|| "unknown error".to_owned()),
                });
            }

            if let Some(text) = info.stream {
                progress
                    .write_chunk(&text)
                    .map_err(|e| DaemonError::Output { source: e })?;
            }
        }

        Ok(())
    }

    async fn remove_image(&self, image_id: &str) -> Result<(), DaemonError> {
        self.docker
            .remove_image(image_id, None::<RemoveImageOptions>, None)
            .await
            .map_err(DaemonError::request("remove image"))?;

        Ok(())
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerRecord>, DaemonError> {
        let opts = ListContainersOptions {
            all,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(opts))
            .await
            .map_err(DaemonError::request("list containers"))?;

        Ok(containers
            .into_iter()
            .filter_map(|summary| {
                let id = summary.id?;
                let names = summary
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .map(|name| name.trim_start_matches('/').to_owned())
                    .collect();
                Some(ContainerRecord {
                    id,
                    image: summary.image.unwrap_or_default(),
                    names,
                })
            })
            .collect())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DaemonError> {
        let options = Some(CreateContainerOptions {
            name: Some(spec.name.clone()),
            platform: String::from(""),
        });

        let config = ContainerCreateBody {
            image: Some(spec.image.clone()),
            env: Some(spec.env.clone()),
            volumes: non_empty_map(empty_object_map(&spec.mount_points)),
            exposed_ports: non_empty_map(empty_object_map(&spec.published_ports)),
            host_config: Some(HostConfig {
                binds: non_empty(spec.binds.clone()),
                port_bindings: non_empty_map(ephemeral_port_bindings(&spec.published_ports)),
                ..Default::default()
            }),
            ..Default::default()
        };

        let res = self
            .docker
            .create_container(options, config)
            .await
            .map_err(DaemonError::request("create container"))?;

        Ok(res.id)
    }

    async fn start_container(&self, container_id: &str) -> Result<(), DaemonError> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions>)
            .await
            .map_err(DaemonError::request("start container"))
    }

    async fn stop_container(&self, container_id: &str, grace: Duration) -> Result<(), DaemonError> {
        let opts = StopContainerOptions {
            t: Some(i32::try_from(grace.as_secs()).unwrap_or(i32::MAX)),
            ..Default::default()
        };

        self.docker
            .stop_container(container_id, Some(opts))
            .await
            .map_err(DaemonError::request("stop container"))
    }

    async fn wait_container(&self, container_id: &str) -> Result<i64, DaemonError> {
        let mut stream = pin!(
            self.docker
                .wait_container(container_id, None::<WaitContainerOptions>)
        );

        let mut exit_code = 0;
        while let Some(item) = stream.next().await {
            match item {
                Ok(res) => exit_code = res.status_code,
                // bollard reports a non-zero exit as an error; the container
                // has still exited, which is all the wait is for.
                Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => {
                    exit_code = code
                }
                Err(e) => return Err(DaemonError::request("wait for container")(e)),
            }
        }

        Ok(exit_code)
    }

    async fn remove_container(&self, container_id: &str) -> Result<(), DaemonError> {
        self.docker
            .remove_container(container_id, None::<RemoveContainerOptions>)
            .await
            .map_err(DaemonError::request("remove container"))
    }
}

// ── Helpers ──

/// The packed archive as a request body. A read failure ends the body with
/// an error, which fails the build request.
fn archive_stream(context: PackedContext) -> ReaderStream<tokio::fs::File> {
    ReaderStream::new(tokio::fs::File::from_std(context.into_file()))
}

/// The daemon's `{"key": {}}` shape for volume and exposed-port sets.
fn empty_object_map(keys: &[String]) -> HashMap<String, HashMap<(), ()>> {
    keys.iter().map(|k| (k.clone(), HashMap::new())).collect()
}

/// One binding per port with no host port pinned; the daemon picks one.
fn ephemeral_port_bindings(ports: &[String]) -> HashMap<String, Option<Vec<PortBinding>>> {
    ports
        .iter()
        .map(|port| {
            let binding = PortBinding {
                host_ip: None,
                host_port: None,
            };
            (port.clone(), Some(vec![binding]))
        })
        .collect()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

fn non_empty_map<K, V>(map: HashMap<K, V>) -> Option<HashMap<K, V>> {
    (!map.is_empty()).then_some(map)
}
