// Configuration management with layered configuration (defaults, file, env)
//
// The required values come from the GitLab CI contract: the job is meant to
// run inside a scheduled pipeline, where these variables are injected.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_template_dir() -> String {
    ".gitlab/recurring_issue_templates".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_verify_ssl() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// API token, set under the project CI/CD settings
    #[serde(default)]
    pub gitlab_api_token: String,
    /// Base API URL, injected by the pipeline as CI_API_V4_URL
    #[serde(default)]
    pub ci_api_v4_url: String,
    #[serde(default)]
    pub ci_project_id: String,
    /// Repository checkout root, injected as CI_PROJECT_DIR
    #[serde(default)]
    pub ci_project_dir: String,
    /// Name of this job, used to find its previous successful run
    #[serde(default)]
    pub ci_job_name: String,
    /// Template directory relative to the project dir
    #[serde(default = "default_template_dir")]
    pub template_dir: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Explicit opt-out for self-hosted instances with private certificates
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Settings {
    /// Load configuration with layered precedence: defaults, file, env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // CI variables arrive unprefixed (GITLAB_API_TOKEN, CI_API_V4_URL, ...)
            .add_source(Environment::default().try_parsing(true));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.gitlab_api_token.is_empty() {
            return Err("Environment variable 'GITLAB_API_TOKEN' not found. Ensure this is set under the project CI/CD settings".to_string());
        }
        if self.ci_api_v4_url.is_empty() {
            return Err("Environment variable 'CI_API_V4_URL' not found. This tool must be run as part of a GitLab pipeline".to_string());
        }
        if self.ci_project_id.is_empty() {
            return Err("Environment variable 'CI_PROJECT_ID' not found. This tool must be run as part of a GitLab pipeline".to_string());
        }
        if self.ci_project_dir.is_empty() {
            return Err("Environment variable 'CI_PROJECT_DIR' not found. This tool must be run as part of a GitLab pipeline".to_string());
        }
        if self.ci_job_name.is_empty() {
            return Err("Environment variable 'CI_JOB_NAME' not found. This tool must be run as part of a GitLab pipeline".to_string());
        }
        if self.request_timeout_seconds == 0 {
            return Err("request_timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Absolute template directory: the configured path under the checkout root
    pub fn template_path(&self) -> PathBuf {
        Path::new(&self.ci_project_dir).join(&self.template_dir)
    }
}
