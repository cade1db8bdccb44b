//! End-to-end deploy of one service directory.
//!
//! Steps run strictly in order and the first failure aborts the rest:
//!
//! 1. Validate the directory and locate the `Dockerfile`
//! 2. Read its `VERSION` marker
//! 3. Build the image unless the daemon already has that version
//! 4. Load the optional `attributes.yml`
//! 5. Reconcile containers to the resolved image
//! 6. Remove service images at any other version
//!
//! Local steps run in [`Plan::prepare`], before any daemon connection is
//! made. The daemon is assumed not to be changed by anyone else while the
//! pipeline runs; concurrent changes are not detected.

use std::path::Path;

use busan_core::{ATTRIBUTES_FILE_NAME, BuildDescriptor, RuntimeConfig, ServiceName};
use busan_daemon::{
    CleanupReport, DaemonClient, DaemonTransport, ProgressSink, ReconcileOutcome, VersionedImage,
};

use crate::PipelineError;

/// A validated service directory, ready to deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    descriptor: BuildDescriptor,
    service: ServiceName,
    version: String,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The daemon has no versioned image for the service even after the
    /// build step. Treated as success.
    NothingToDo,
    Deployed(Deployment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub image: VersionedImage,
    pub container: ReconcileOutcome,
    pub cleanup: CleanupReport,
}

impl Plan {
    /// Runs the local steps: structure checks, service name, descriptor version.
    ///
    /// The service name defaults to the directory's base name.
    pub fn prepare(directory: &Path, service: Option<&str>) -> Result<Self, PipelineError> {
        let descriptor = BuildDescriptor::locate(directory)?;
        tracing::info!("Dockerfile: {}", descriptor.path().display());

        let service = match service {
            Some(name) => ServiceName::new(name)?,
            None => ServiceName::from_directory(directory)?,
        };
        tracing::info!("Name: {service}");

        let version = descriptor.version()?;
        tracing::info!("Version: {version}");

        Ok(Self {
            descriptor,
            service,
            version,
        })
    }

    pub fn descriptor(&self) -> &BuildDescriptor {
        &self.descriptor
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Runs the daemon steps against `client`.
    pub async fn execute<T: DaemonTransport>(
        &self,
        client: &DaemonClient<T>,
        progress: &mut ProgressSink,
    ) -> Result<Outcome, PipelineError> {
        let images = client.images();

        let built = images
            .conditionally_build(
                &self.service,
                &self.version,
                self.descriptor.context_dir(),
                progress,
            )
            .await?;

        let Some(image) = built else {
            tracing::info!("No version of {} on the daemon, nothing to do", self.service);
            return Ok(Outcome::NothingToDo);
        };

        let config = self.load_config()?;

        let containers = client.containers();
        let set = containers.survey(&self.service, &image).await?;
        let container = containers
            .reconcile(&self.service, &image, set, config.as_ref())
            .await?;

        let cleanup = images
            .remove_images_not_at(&self.service, &image.version, &image.id)
            .await?;

        Ok(Outcome::Deployed(Deployment {
            image,
            container,
            cleanup,
        }))
    }

    fn load_config(&self) -> Result<Option<RuntimeConfig>, PipelineError> {
        let dir = self.descriptor.context_dir();
        let config = RuntimeConfig::load(dir)?;
        if config.is_some() {
            tracing::info!("Using {}", dir.join(ATTRIBUTES_FILE_NAME).display());
        }
        Ok(config)
    }
}

/// Prepare and execute in one call.
pub async fn run<T: DaemonTransport>(
    directory: &Path,
    service: Option<&str>,
    client: &DaemonClient<T>,
    progress: &mut ProgressSink,
) -> Result<Outcome, PipelineError> {
    Plan::prepare(directory, service)?
        .execute(client, progress)
        .await
}
