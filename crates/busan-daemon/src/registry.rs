use std::collections::HashSet;
use std::path::Path;

use busan_build::{ContextLayout, PackError, PackedContext};
use busan_core::ServiceName;

use crate::client::DaemonClient;
use crate::daemon::DaemonError;
use crate::progress::ProgressSink;
use crate::transport::{DaemonTransport, ImageRecord};

/// An image on the daemon together with the service version read from its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedImage {
    /// Daemon-assigned image identifier.
    pub id: String,
    pub repo_tags: Vec<String>,
    /// Empty when none of the image's tags carries a version for the service.
    pub version: String,
}

impl VersionedImage {
    pub fn is_versioned(&self) -> bool {
        !self.version.is_empty()
    }
}

/// What [`ImageRegistry::remove_images_not_at`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Identifiers of images removed.
    pub removed: Vec<String>,
    /// Identifiers skipped because they back the active container.
    pub kept_active: Vec<String>,
    /// Identifiers the daemon refused to remove.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImageRegistry<'a, T: DaemonTransport>(&'a DaemonClient<T>);

impl<'a, T: DaemonTransport> ImageRegistry<'a, T> {
    pub fn new(client: &'a DaemonClient<T>) -> Self {
        Self(client)
    }
}

impl<T: DaemonTransport> ImageRegistry<'_, T> {
    // ── Listing ──

    /// Returns every image on the daemon, versioned for `service` where a
    /// tag allows it; the rest carry an empty version.
    pub async fn list(&self, service: &ServiceName) -> Result<Vec<VersionedImage>, RegistryError> {
        let images = self.list_records().await?;

        Ok(images
            .into_iter()
            .map(|image| {
                let version = image
                    .repo_tags
                    .iter()
                    .find_map(|tag| service.tag_version(tag))
                    .unwrap_or_default()
                    .to_owned();
                VersionedImage {
                    id: image.id,
                    repo_tags: image.repo_tags,
                    version,
                }
            })
            .collect())
    }

    /// Resolves the service version currently on the daemon.
    ///
    /// Images and their tags are scanned in daemon listing order and the
    /// first tag carrying a version for `service` wins. There is no
    /// ordering by recency or by version.
    pub async fn current_version(
        &self,
        service: &ServiceName,
    ) -> Result<Option<VersionedImage>, RegistryError> {
        let images = self.list_records().await?;

        Ok(versioned_tags(&images, service)
            .next()
            .map(|(version, image)| VersionedImage {
                id: image.id.clone(),
                repo_tags: image.repo_tags.clone(),
                version: version.to_owned(),
            }))
    }

    // ── Build ──

    /// Submits a packed build context to the daemon, tagged as `tag`.
    ///
    /// Daemon output is forwarded to `progress` as it arrives.
    pub async fn build(
        &self,
        tag: &str,
        context: PackedContext,
        progress: &mut ProgressSink,
    ) -> Result<(), RegistryError> {
        tracing::debug!(
            tag,
            entries = context.entries().len(),
            bytes = context.len(),
            "submitting build context"
        );

        let build_err = |source| RegistryError::Build {
            tag: tag.to_owned(),
            source,
        };

        self.0
            .transport()
            .build_image(tag, context, progress)
            .await
            .map_err(build_err)?;

        progress
            .finish()
            .map_err(|e| build_err(DaemonError::Output { source: e }))
    }

    /// Builds `version` only when the daemon does not already have it.
    ///
    /// Returns the daemon's own view of the service image afterwards: the
    /// existing image when the build is skipped, or the image re-resolved
    /// from a fresh listing after a build. `None` means the daemon still
    /// has no versioned image for the service.
    pub async fn conditionally_build(
        &self,
        service: &ServiceName,
        version: &str,
        context_dir: &Path,
        progress: &mut ProgressSink,
    ) -> Result<Option<VersionedImage>, RegistryError> {
        let current = self.current_version(service).await?;

        match &current {
            Some(existing) if existing.is_versioned() && existing.version == version => {
                tracing::info!("Server has current version ({})", existing.version);
                return Ok(current);
            }
            Some(existing) => tracing::info!("Image version: {}", existing.version),
            None => tracing::info!("Building version: {version}"),
        }

        let context = busan_build::pack(context_dir, ContextLayout::default())
            .map_err(|e| RegistryError::Pack { source: e })?;
        self.build(&service.image_tag(version), context, progress)
            .await?;

        let built = self.current_version(service).await?;
        if let Some(image) = &built {
            tracing::info!("Uploaded: {}", image.id);
        }

        Ok(built)
    }

    // ── Removal ──

    /// Removes an image by identifier.
    ///
    /// Callers must not pass the image backing a running container.
    pub async fn remove(&self, image_id: &str) -> Result<(), RegistryError> {
        self.0
            .transport()
            .remove_image(image_id)
            .await
            .map_err(|e| RegistryError::Remove {
                image: image_id.to_owned(),
                source: e,
            })
    }

    /// Removes every service image whose version differs from `version`,
    /// except the one whose identifier is `active_id`.
    ///
    /// Removal is best-effort: a refused removal is reported and skipped.
    pub async fn remove_images_not_at(
        &self,
        service: &ServiceName,
        version: &str,
        active_id: &str,
    ) -> Result<CleanupReport, RegistryError> {
        let images = self.list_records().await?;
        let mut report = CleanupReport::default();
        let mut handled = HashSet::new();

        for (tag_version, image) in versioned_tags(&images, service) {
            if tag_version == version || !handled.insert(image.id.as_str()) {
                continue;
            }

            if image.id == active_id {
                tracing::warn!(
                    "Will not delete {:?} as the ID is the same, please clean manually",
                    image.repo_tags
                );
                report.kept_active.push(image.id.clone());
                continue;
            }

            tracing::info!("Removing {:?}", image.repo_tags);
            match self.remove(&image.id).await {
                Ok(()) => report.removed.push(image.id.clone()),
                Err(e) => {
                    tracing::warn!(error = %e, "image left in place");
                    report.failed.push(image.id.clone());
                }
            }
        }

        Ok(report)
    }

    async fn list_records(&self) -> Result<Vec<ImageRecord>, RegistryError> {
        self.0
            .transport()
            .list_images()
            .await
            .map_err(|e| RegistryError::List { source: e })
    }
}

/// Every (version, image) pair where one of the image's tags belongs to
/// `service`, in listing order.
fn versioned_tags<'i>(
    images: &'i [ImageRecord],
    service: &'i ServiceName,
) -> impl Iterator<Item = (&'i str, &'i ImageRecord)> + 'i {
    images.iter().flat_map(move |image| {
        image
            .repo_tags
            .iter()
            .filter_map(move |tag| service.tag_version(tag).map(|version| (version, image)))
    })
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to list images")]
    List { source: DaemonError },

    #[error("failed to pack build context")]
    Pack { source: PackError },

    #[error("failed to build image {tag}")]
    Build { tag: String, source: DaemonError },

    #[error("failed to remove image {image}")]
    Remove { image: String, source: DaemonError },
}
