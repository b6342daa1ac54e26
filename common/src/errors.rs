// Error handling framework

use thiserror::Error;

/// Template discovery and parsing errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template directory {path}: {source}")]
    DirectoryRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read template file {path}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Template {path} has no frontmatter block")]
    MissingFrontmatter { path: String },

    #[error("Invalid frontmatter in {path}: {reason}")]
    InvalidFrontmatter { path: String, reason: String },

    #[error("Template {path} is missing a title")]
    MissingTitle { path: String },

    #[error("Template {path} is missing a crontab expression")]
    MissingCrontab { path: String },

    #[error("Invalid duein value '{value}' in {path}: {reason}")]
    InvalidDueIn {
        path: String,
        value: String,
        reason: String,
    },

    #[error("Invalid timezone '{value}' in {path}")]
    InvalidTimezone { path: String, value: String },
}

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("No next occurrence for cron expression '{expression}'")]
    NoNextOccurrence { expression: String },
}

/// GitLab API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("GitLab returned status {status} for {url}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Epic '{title}' not found in group {group_id}")]
    EpicNotFound { title: String, group_id: u64 },
}

/// Errors surfaced by one issuer run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("GitLab API error: {0}")]
    Api(#[from] ApiError),
}
