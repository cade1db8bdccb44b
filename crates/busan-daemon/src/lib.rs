//! Docker daemon operations for busan.
//!
//! All daemon traffic goes through [`DaemonTransport`]. Production code uses
//! [`BollardTransport`]; tests substitute mockall-generated mocks. The
//! [`DaemonClient`] handle is constructed once and borrowed by the
//! [`ImageRegistry`] and [`ContainerReconciler`] views.

pub mod client;
pub mod daemon;
pub mod endpoint;
pub mod progress;
pub mod reconciler;
pub mod registry;
pub mod transport;

pub use bollard::errors::Error as ConnectionError;

pub use client::DaemonClient;
pub use daemon::DaemonError;
pub use endpoint::{DEFAULT_ENDPOINT, DaemonEndpoint};
pub use progress::ProgressSink;
pub use reconciler::{
    ContainerReconciler, ContainerSet, ReconcileError, ReconcileOutcome, STOP_GRACE_PERIOD,
    TeardownState, container_spec,
};
pub use registry::{CleanupReport, ImageRegistry, RegistryError, VersionedImage};
pub use transport::{BollardTransport, ContainerRecord, ContainerSpec, DaemonTransport, ImageRecord};
