use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Template Models
// ============================================================================

/// IssueTemplate is one Markdown file's parsed schedule metadata plus body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTemplate {
    /// File the template was parsed from
    pub source: PathBuf,
    /// Issue title
    pub title: String,
    /// Markdown body below the frontmatter, used verbatim as the description
    pub description: String,
    pub confidential: bool,
    /// GitLab usernames to assign, resolved to ids at creation time
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    /// Offset from the scheduled occurrence to the issue due date
    pub due_in: Option<Duration>,
    /// Standard five-field cron expression (descriptors like @daily accepted)
    pub crontab: String,
    /// Timezone the cron expression is evaluated in
    pub timezone: Tz,
    /// Title of a group epic to attach the issue to
    pub epic: Option<String>,
    /// Explicit target project overriding the CI project
    pub project_id: Option<u64>,
}

// ============================================================================
// GitLab API Models
// ============================================================================

/// Project as returned by GET /projects/:id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub path_with_namespace: String,
    pub namespace: Namespace,
}

/// Namespace owning a project; epics exist only for group namespaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub id: u64,
    pub kind: NamespaceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Group,
    User,
}

/// Pipeline summary from GET /projects/:id/pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Job summary from GET /projects/:id/pipelines/:pipeline_id/jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineJob {
    pub id: u64,
    pub name: String,
    pub finished_at: Option<DateTime<Utc>>,
}

/// User as returned by GET /users?username=
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}

/// Epic summary from GET /groups/:id/epics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    pub group_id: u64,
}

/// Issue as returned by POST /projects/:id/issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub iid: u64,
    pub project_id: u64,
    pub title: String,
    pub web_url: String,
}

/// Payload for POST /projects/:id/issues
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub confidential: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<u64>,
    /// Comma-separated label names, per the issues API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Backdated to the scheduled occurrence the issue was created for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
