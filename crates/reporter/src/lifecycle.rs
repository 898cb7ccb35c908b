use std::sync::Arc;

use tracing::{debug, info, warn};

use casebridge_remote::{RemoteError, RunConfiguration, RunCreateModel, ShallowReference};

use crate::gate::{RunHandle, RunState};
use crate::pipeline::Shared;

/// Resolve the run, creating it on first use.
///
/// All dependent work awaits this; after a creation failure every caller
/// observes `Disabled` without a new remote attempt.
pub(crate) async fn ensure_run(shared: &Arc<Shared>) -> RunState {
    let creator = Arc::clone(shared);
    shared.gate.ensure(move || create_run(creator)).await
}

async fn create_run(shared: Arc<Shared>) -> RunState {
    match try_create(&shared).await {
        Ok(Some(handle)) => {
            if shared.config.logging {
                info!(run_id = handle.run_id, "using run to publish test results");
            }
            RunState::Ready(handle)
        }
        Ok(None) => {
            // Expected absence, not an error: the pipeline quietly stands down.
            debug!(
                project = %shared.config.project_name,
                "project does not exist; reporting is disabled"
            );
            shared.state.disable();
            RunState::Disabled
        }
        Err(e) => {
            match &e {
                RemoteError::Unauthorized { .. } => {
                    warn!("failed to create test run: check your token; reporting is disabled");
                }
                RemoteError::Network { .. } => {
                    warn!(
                        "failed to create test run: check your organization url; reporting is disabled"
                    );
                }
                _ => {
                    warn!("failed to create test run; reporting is disabled");
                    warn!(error = %e, "remote error");
                }
            }
            shared.state.disable();
            RunState::Disabled
        }
    }
}

async fn try_create(shared: &Shared) -> Result<Option<RunHandle>, RemoteError> {
    let project = shared
        .api
        .get_project(&shared.config.project_name)
        .await?;
    if project.is_none() {
        return Ok(None);
    }

    let blueprint = RunConfiguration::default();
    let run_config = if let Some(config) = &shared.config.run_config {
        config.clone()
    } else if let Some(derive) = &shared.config.run_config_fn {
        let suite = shared.suite.lock().unwrap().clone();
        derive(&blueprint, &suite)
    } else {
        blueprint
    };

    let model = RunCreateModel {
        name: shared.config.run_title.clone(),
        automated: true,
        plan: ShallowReference::new(shared.config.plan_id.to_string()),
        configuration_ids: run_config.configuration_ids.clone(),
        comment: run_config.comment,
    };
    let run = shared
        .api
        .create_run(&shared.config.project_name, &model)
        .await?;

    Ok(Some(RunHandle {
        run_id: run.id,
        configuration_ids: run_config.configuration_ids,
    }))
}
