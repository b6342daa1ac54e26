// Issuer binary entry point
//
// Intended to run as a scheduled GitLab CI job: one pass over the template
// directory, then exit. A non-zero exit status marks the pipeline failed.

use anyhow::Result;
use common::config::Settings;
use common::gitlab::{GitlabApi, GitlabClient};
use common::issuer::{IssuerConfig, IssuerEngine};
use common::telemetry;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let settings =
        Settings::load().map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    telemetry::init_logging(&settings.log_level)?;

    info!("Starting recurring issue run");

    settings.validate().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        anyhow::anyhow!(e)
    })?;

    info!(
        api_url = %settings.ci_api_v4_url,
        project_id = %settings.ci_project_id,
        job_name = %settings.ci_job_name,
        template_dir = %settings.template_path().display(),
        "Configuration loaded"
    );

    let client = GitlabClient::new(
        &settings.ci_api_v4_url,
        &settings.gitlab_api_token,
        settings.request_timeout_seconds,
        settings.verify_ssl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to initialize GitLab client");
        anyhow::anyhow!("GitLab client error: {}", e)
    })?;
    let api: Arc<dyn GitlabApi> = Arc::new(client);

    let engine = IssuerEngine::new(
        IssuerConfig {
            project_id: settings.ci_project_id.clone(),
            job_name: settings.ci_job_name.clone(),
            template_dir: settings.template_path(),
        },
        api,
    );

    let summary = engine.run().await.map_err(|e| {
        error!(error = %e, "Run failed");
        anyhow::anyhow!("Run error: {}", e)
    })?;

    info!(
        templates = summary.templates,
        created = summary.created,
        "Run complete"
    );
    Ok(())
}
