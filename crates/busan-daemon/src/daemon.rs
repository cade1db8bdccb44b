#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("unsupported daemon address {0:?}, expected unix:// or tcp://")]
    UnsupportedEndpoint(String),

    #[error("failed to connect to daemon at {endpoint}")]
    Connect {
        endpoint: String,
        source: bollard::errors::Error,
    },

    #[error("daemon request failed: {operation}")]
    Request {
        operation: &'static str,
        source: bollard::errors::Error,
    },

    #[error("image build failed: {message}")]
    BuildFailed { message: String },

    #[error("failed to write build output")]
    Output { source: std::io::Error },
}

impl DaemonError {
    /// Returns a `Request` partial constructor for the named operation.
    #[inline]
    pub(crate) fn request(operation: &'static str) -> impl FnOnce(bollard::errors::Error) -> Self {
        move |source| Self::Request { operation, source }
    }
}
