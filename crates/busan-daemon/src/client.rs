use crate::daemon::DaemonError;
use crate::endpoint::DaemonEndpoint;
use crate::reconciler::ContainerReconciler;
use crate::registry::ImageRegistry;
use crate::transport::{BollardTransport, DaemonTransport};

/// Daemon client handle, parameterized over the transport for testability.
///
/// Constructed once at startup and passed by reference to every step.
#[derive(Debug)]
pub struct DaemonClient<T: DaemonTransport = BollardTransport> {
    transport: T,
}

impl DaemonClient<BollardTransport> {
    /// Connect to the daemon at `endpoint`.
    pub async fn connect(endpoint: &DaemonEndpoint) -> Result<Self, DaemonError> {
        let transport = BollardTransport::connect(endpoint).await?;
        tracing::debug!(%endpoint, "connected to daemon");
        Ok(Self { transport })
    }
}

impl<T: DaemonTransport> DaemonClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Exposes methods to work with images.
    #[inline]
    pub fn images(&self) -> ImageRegistry<'_, T> {
        ImageRegistry::new(self)
    }

    /// Exposes methods to work with containers.
    #[inline]
    pub fn containers(&self) -> ContainerReconciler<'_, T> {
        ContainerReconciler::new(self)
    }
}
