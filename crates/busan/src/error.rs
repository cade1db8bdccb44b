use busan_daemon::{ReconcileError, RegistryError};

/// Any failure that aborts the pipeline.
///
/// Steps already completed are not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] busan_core::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
