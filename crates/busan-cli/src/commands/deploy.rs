use std::path::Path;

use busan::daemon::{DaemonClient, DaemonEndpoint, ProgressSink};
use busan::pipeline::{Outcome, Plan};

/// Execute the full deploy pipeline for one service directory.
pub async fn deploy(directory: &Path, docker_host: &str, name: Option<&str>) -> anyhow::Result<()> {
    let endpoint: DaemonEndpoint = docker_host.parse()?;

    // Local checks run before the daemon is contacted.
    let plan = Plan::prepare(directory, name)?;

    let client = DaemonClient::connect(&endpoint).await?;
    let outcome = plan.execute(&client, &mut ProgressSink::stdout()).await?;

    match outcome {
        Outcome::NothingToDo => tracing::info!("Nothing to do"),
        Outcome::Deployed(deployment) => {
            tracing::info!(
                "Deployed {} (container {})",
                plan.service().image_tag(&deployment.image.version),
                deployment.container.container_id
            );
            if !deployment.cleanup.failed.is_empty() {
                tracing::warn!(
                    "{} old image(s) could not be removed",
                    deployment.cleanup.failed.len()
                );
            }
        }
    }

    Ok(())
}
