//! Build a Docker image only when its declared version is new, then keep
//! exactly one container of it running.
//!
//! This is the facade crate that re-exports the busan sub-crates and owns
//! the end-to-end [`pipeline`].
//!
//! | Module | Crate | Description |
//! |--------|-------|-------------|
//! | root | `busan-core` | Descriptor, runtime config and service identity |
//! | [`build`] | `busan-build` | Build-context packing |
//! | [`daemon`] | `busan-daemon` | Daemon transport, image registry, container reconciler |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use busan::daemon::{DaemonClient, DaemonEndpoint, ProgressSink};
//! use busan::pipeline::Plan;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let plan = Plan::prepare(Path::new("services/web"), None)?;
//! let client = DaemonClient::connect(&DaemonEndpoint::default()).await?;
//! let outcome = plan.execute(&client, &mut ProgressSink::stdout()).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

// Core types flattened into root namespace for convenience.
pub use busan_core::*;

/// Build-context archive packing.
pub mod build {
    pub use busan_build::*;
}

/// Docker daemon operations.
pub mod daemon {
    pub use busan_daemon::*;
}

mod error;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{Deployment, Outcome, Plan};
