// Issuer engine implementation
//
// Drives one invocation end to end: resolve the previous successful run from
// the API, scan the template directory, and create an issue for every
// template whose schedule has fired since that run.

use crate::errors::{ApiError, RunError};
use crate::gitlab::GitlabApi;
use crate::models::{Issue, IssueTemplate, NamespaceKind, NewIssue, Project};
use crate::schedule;
use crate::template;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Configuration for the issuer
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// CI project the tool runs in; default target for created issues
    pub project_id: String,
    /// Name of the CI job, used to locate its previous successful run
    pub job_name: String,
    /// Directory holding the issue templates
    pub template_dir: PathBuf,
}

/// Outcome of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Templates discovered in the template directory
    pub templates: usize,
    /// Issues actually created
    pub created: usize,
}

/// Main issuer engine implementation
pub struct IssuerEngine {
    config: IssuerConfig,
    api: Arc<dyn GitlabApi>,
}

impl IssuerEngine {
    pub fn new(config: IssuerConfig, api: Arc<dyn GitlabApi>) -> Self {
        Self { config, api }
    }

    /// Run one pass over the template directory
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let last_run = self.last_run_time().await?;
        info!(last_run = %last_run.to_rfc3339(), "Resolved last successful run");

        let templates = template::scan_template_dir(&self.config.template_dir)?;
        let now = Utc::now();

        let mut summary = RunSummary {
            templates: templates.len(),
            created: 0,
        };
        for tmpl in &templates {
            if self.process_template(tmpl, last_run, now).await? {
                summary.created += 1;
            }
        }

        Ok(summary)
    }

    /// Finish time of this job's previous successful run; epoch when the job
    /// has never completed, so every schedule's first occurrence counts.
    async fn last_run_time(&self) -> Result<DateTime<Utc>, ApiError> {
        let finish = self
            .api
            .last_successful_job_finish(&self.config.project_id, &self.config.job_name)
            .await?;
        Ok(finish.unwrap_or(DateTime::UNIX_EPOCH))
    }

    /// Create the issue for one template if its schedule has fired.
    /// Returns whether an issue was created.
    #[instrument(
        skip(self, tmpl, last_run, now),
        fields(template = %tmpl.source.display(), title = %tmpl.title)
    )]
    async fn process_template(
        &self,
        tmpl: &IssueTemplate,
        last_run: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, RunError> {
        let scheduled_at = schedule::next_occurrence(&tmpl.crontab, tmpl.timezone, last_run)?;
        if scheduled_at > now {
            info!(due = %scheduled_at.to_rfc3339(), "Template is not due yet");
            return Ok(false);
        }

        info!(due = %scheduled_at.to_rfc3339(), "Template was due, creating issue");

        let project = self.target_project(tmpl).await?;
        let assignee_ids = self.resolve_assignees(&tmpl.assignees).await?;

        let new_issue = NewIssue {
            title: tmpl.title.clone(),
            description: tmpl.description.clone(),
            confidential: tmpl.confidential,
            assignee_ids,
            labels: if tmpl.labels.is_empty() {
                None
            } else {
                Some(tmpl.labels.join(","))
            },
            due_date: tmpl.due_in.map(|d| (scheduled_at + d).date_naive()),
            created_at: Some(scheduled_at),
        };

        let issue = self.api.create_issue(project.id, &new_issue).await?;
        info!(issue_iid = issue.iid, web_url = %issue.web_url, "Issue created");

        if let Some(epic_title) = &tmpl.epic {
            self.assign_epic(&project, epic_title, &issue).await?;
        }

        Ok(true)
    }

    /// The template's explicit target project, or the CI project
    async fn target_project(&self, tmpl: &IssueTemplate) -> Result<Project, ApiError> {
        match tmpl.project_id {
            Some(id) => self.api.get_project(&id.to_string()).await,
            None => self.api.get_project(&self.config.project_id).await,
        }
    }

    /// Resolve assignee usernames to user ids. Unknown usernames are logged
    /// and skipped rather than failing the run.
    async fn resolve_assignees(&self, usernames: &[String]) -> Result<Vec<u64>, ApiError> {
        let mut ids = Vec::with_capacity(usernames.len());
        for username in usernames {
            match self.api.find_user(username).await? {
                Some(user) => ids.push(user.id),
                None => warn!(username = %username, "Assignee not found, skipping"),
            }
        }
        Ok(ids)
    }

    /// Attach the issue to the named epic of the project's group. Projects
    /// in user namespaces have no epics and are skipped with a warning; a
    /// group epic that cannot be found is an error.
    async fn assign_epic(
        &self,
        project: &Project,
        epic_title: &str,
        issue: &Issue,
    ) -> Result<(), RunError> {
        if project.namespace.kind != NamespaceKind::Group {
            warn!(
                project = %project.path_with_namespace,
                epic = %epic_title,
                "Project is not in a group, cannot assign an epic"
            );
            return Ok(());
        }

        let group_id = project.namespace.id;
        let epic = self
            .api
            .find_group_epic(group_id, epic_title)
            .await?
            .ok_or_else(|| ApiError::EpicNotFound {
                title: epic_title.to_string(),
                group_id,
            })?;

        self.api
            .assign_issue_to_epic(group_id, epic.iid, issue.id)
            .await?;
        info!(epic_iid = epic.iid, "Issue assigned to epic");
        Ok(())
    }
}
