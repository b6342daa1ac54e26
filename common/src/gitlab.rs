// GitLab REST API client
//
// Thin typed wrapper over reqwest. Calls are sequential with no retry or
// backoff of their own; list endpoints follow the x-next-page header.

use crate::errors::ApiError;
use crate::models::{Epic, Issue, NewIssue, Pipeline, PipelineJob, Project, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

const PER_PAGE: u32 = 100;

/// GitLab operations the run engine depends on
#[async_trait]
pub trait GitlabApi: Send + Sync {
    /// GET /projects/:id
    async fn get_project(&self, id: &str) -> Result<Project, ApiError>;

    /// Finish time of the most recent successful run of `job_name`, walking
    /// finished pipelines newest first. None when the job has never run.
    async fn last_successful_job_finish(
        &self,
        project_id: &str,
        job_name: &str,
    ) -> Result<Option<DateTime<Utc>>, ApiError>;

    /// Exact-username lookup via GET /users?username=
    async fn find_user(&self, username: &str) -> Result<Option<User>, ApiError>;

    /// POST /projects/:id/issues
    async fn create_issue(&self, project_id: u64, issue: &NewIssue) -> Result<Issue, ApiError>;

    /// Exact-title epic lookup via GET /groups/:id/epics?search=
    async fn find_group_epic(&self, group_id: u64, title: &str)
        -> Result<Option<Epic>, ApiError>;

    /// POST /groups/:group_id/epics/:epic_iid/issues/:issue_id
    async fn assign_issue_to_epic(
        &self,
        group_id: u64,
        epic_iid: u64,
        issue_id: u64,
    ) -> Result<(), ApiError>;
}

/// Client for the GitLab v4 REST API
pub struct GitlabClient {
    client: Client,
    base_url: String,
}

impl GitlabClient {
    /// Build a client with the token installed as a default header.
    pub fn new(
        base_url: &str,
        token: &str,
        timeout_seconds: u64,
        verify_ssl: bool,
    ) -> Result<Self, ApiError> {
        let mut token_value =
            HeaderValue::from_str(token).map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        token_value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("PRIVATE-TOKEN", token_value);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_status(url: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Request {
                url: url.to_string(),
                source: e,
            })?;
        let response = Self::check_status(url, response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    /// GET a list endpoint page by page until x-next-page runs out
    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let mut paged_query: Vec<(&str, String)> = query.to_vec();
            paged_query.push(("per_page", PER_PAGE.to_string()));
            paged_query.push(("page", page.to_string()));

            let response = self
                .client
                .get(url)
                .query(&paged_query)
                .send()
                .await
                .map_err(|e| ApiError::Request {
                    url: url.to_string(),
                    source: e,
                })?;
            let response = Self::check_status(url, response).await?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u32>().ok());

            let mut batch: Vec<T> =
                response
                    .json()
                    .await
                    .map_err(|e| ApiError::InvalidResponse {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })?;
            items.append(&mut batch);

            match next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(items)
    }

    /// Most recent page of finished, successful pipelines, newest first.
    /// One page is enough to locate the previous run of a scheduled job.
    async fn list_successful_pipelines(
        &self,
        project_id: &str,
    ) -> Result<Vec<Pipeline>, ApiError> {
        let url = self.url(&format!("/projects/{}/pipelines", project_id));
        let query = [
            ("scope", "finished".to_string()),
            ("status", "success".to_string()),
            ("order_by", "updated_at".to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];
        self.get_json(&url, &query).await
    }

    async fn list_pipeline_jobs(
        &self,
        project_id: &str,
        pipeline_id: u64,
    ) -> Result<Vec<PipelineJob>, ApiError> {
        let url = self.url(&format!(
            "/projects/{}/pipelines/{}/jobs",
            project_id, pipeline_id
        ));
        self.get_paged(&url, &[]).await
    }
}

#[async_trait]
impl GitlabApi for GitlabClient {
    #[instrument(skip(self))]
    async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        let url = self.url(&format!("/projects/{}", id));
        self.get_json(&url, &[]).await
    }

    #[instrument(skip(self))]
    async fn last_successful_job_finish(
        &self,
        project_id: &str,
        job_name: &str,
    ) -> Result<Option<DateTime<Utc>>, ApiError> {
        let pipelines = self.list_successful_pipelines(project_id).await?;
        debug!(count = pipelines.len(), "Scanning pipelines for previous run");

        for pipeline in pipelines {
            let jobs = self.list_pipeline_jobs(project_id, pipeline.id).await?;
            for job in jobs {
                if job.name != job_name {
                    continue;
                }
                if let Some(finished_at) = job.finished_at {
                    return Ok(Some(finished_at));
                }
            }
        }
        Ok(None)
    }

    #[instrument(skip(self))]
    async fn find_user(&self, username: &str) -> Result<Option<User>, ApiError> {
        let url = self.url("/users");
        let users: Vec<User> = self
            .get_json(&url, &[("username", username.to_string())])
            .await?;
        Ok(users
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(username)))
    }

    #[instrument(skip(self, issue), fields(title = %issue.title))]
    async fn create_issue(&self, project_id: u64, issue: &NewIssue) -> Result<Issue, ApiError> {
        let url = self.url(&format!("/projects/{}/issues", project_id));
        let response = self
            .client
            .post(&url)
            .json(issue)
            .send()
            .await
            .map_err(|e| ApiError::Request {
                url: url.clone(),
                source: e,
            })?;
        let response = Self::check_status(&url, response).await?;
        response
            .json::<Issue>()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                url,
                reason: e.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn find_group_epic(
        &self,
        group_id: u64,
        title: &str,
    ) -> Result<Option<Epic>, ApiError> {
        let url = self.url(&format!("/groups/{}/epics", group_id));
        let epics: Vec<Epic> = self
            .get_paged(&url, &[("search", title.to_string())])
            .await?;
        Ok(epics.into_iter().find(|e| e.title == title))
    }

    #[instrument(skip(self))]
    async fn assign_issue_to_epic(
        &self,
        group_id: u64,
        epic_iid: u64,
        issue_id: u64,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!(
            "/groups/{}/epics/{}/issues/{}",
            group_id, epic_iid, issue_id
        ));
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ApiError::Request {
                url: url.clone(),
                source: e,
            })?;
        Self::check_status(&url, response).await?;
        Ok(())
    }
}
