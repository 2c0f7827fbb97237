use chrono::{DateTime, Utc};
use futures::Stream;
use log::debug;
use serde::Deserialize;

use super::core::GitHubClient;
use crate::date_range::DateRange;
use crate::error::{DeployMetricsError, Result};
use crate::providers::github::types::{RunOutcome, Trigger, WorkflowRun};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowListDto {
    pub total_count: u64,
    pub workflows: Vec<WorkflowDto>,
}

/// A workflow definition in a repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowDto {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowRunListDto {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRunDto>,
}

/// GitHub stops listing filtered workflow runs past this many results.
const RUN_LISTING_CAP: u64 = 1000;

/// One page of runs plus the total the API reports for the whole query.
#[derive(Debug)]
pub struct WorkflowRunsPage {
    pub total_count: u64,
    pub runs: Vec<WorkflowRun>,
}

enum RangeRuns {
    Complete(Vec<WorkflowRun>),
    Capped(u64),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowRunDto {
    pub id: u64,
    pub run_number: u64,
    pub event: String,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub head_branch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
}

impl WorkflowRunDto {
    pub fn into_run(self, repository: &str, workflow_name: &str) -> WorkflowRun {
        WorkflowRun {
            id: self.id,
            run_number: self.run_number,
            repository: repository.to_string(),
            workflow_name: workflow_name.to_string(),
            outcome: RunOutcome::from_api(self.status.as_deref(), self.conclusion.as_deref()),
            trigger: Trigger::from_event(&self.event),
            event: self.event,
            head_branch: self.head_branch,
            created_at: self.created_at,
            updated_at: self.updated_at,
            html_url: self.html_url,
        }
    }
}

impl GitHubClient {
    /// Fetch one page of `/repos/{org}/{repo}/actions/workflows`
    pub async fn fetch_workflows_page(
        &self,
        org: &str,
        repo: &str,
        page: u32,
    ) -> Result<Vec<WorkflowDto>> {
        let url = self.endpoint(&["repos", org, repo, "actions", "workflows"]);

        let list: WorkflowListDto = self.get_json(url, &self.page_query(page)).await?;
        debug!("{org}/{repo}: {} workflows defined", list.total_count);
        Ok(list.workflows)
    }

    pub fn list_workflows<'a>(
        &'a self,
        org: &'a str,
        repo: &'a str,
    ) -> impl Stream<Item = Result<WorkflowDto>> + 'a {
        self.paginate(move |page| self.fetch_workflows_page(org, repo, page))
    }

    /// Fetch one page of runs of a workflow created within `range`
    pub async fn fetch_workflow_runs_page(
        &self,
        org: &str,
        repo: &str,
        workflow: &WorkflowDto,
        range: DateRange,
        page: u32,
    ) -> Result<WorkflowRunsPage> {
        let workflow_id = workflow.id.to_string();
        let url = self.endpoint(&[
            "repos",
            org,
            repo,
            "actions",
            "workflows",
            &workflow_id,
            "runs",
        ]);
        let mut query = self.page_query(page);
        query.push(("created", range.as_created_qualifier()));

        let list: WorkflowRunListDto = self.get_json(url, &query).await?;
        debug!(
            "{org}/{repo}: workflow '{}' has {} runs in {range}",
            workflow.name, list.total_count
        );
        Ok(WorkflowRunsPage {
            total_count: list.total_count,
            runs: list
                .workflow_runs
                .into_iter()
                .map(|run| run.into_run(repo, &workflow.name))
                .collect(),
        })
    }

    /// Every run of `workflow` created within `range`.
    ///
    /// Ranges holding more runs than GitHub will list are halved and queried
    /// again. Fails with [`DeployMetricsError::Incomplete`] when the listing
    /// ends before the reported `total_count` is reached.
    pub async fn collect_workflow_runs(
        &self,
        org: &str,
        repo: &str,
        workflow: &WorkflowDto,
        range: DateRange,
    ) -> Result<Vec<WorkflowRun>> {
        let mut pending = vec![range];
        let mut runs = Vec::new();

        while let Some(range) = pending.pop() {
            match self.collect_range(org, repo, workflow, range).await? {
                RangeRuns::Complete(found) => runs.extend(found),
                RangeRuns::Capped(total_count) => {
                    let Some((first, second)) = range.split() else {
                        return Err(DeployMetricsError::Incomplete(format!(
                            "{org}/{repo}: workflow '{}' has {total_count} runs on {}, \
                             more than the {RUN_LISTING_CAP} GitHub lists",
                            workflow.name, range.start
                        )));
                    };
                    debug!(
                        "{org}/{repo}: {total_count} runs of '{}' in {range}, splitting into {first} and {second}",
                        workflow.name
                    );
                    pending.push(second);
                    pending.push(first);
                }
            }
        }

        Ok(runs)
    }

    async fn collect_range(
        &self,
        org: &str,
        repo: &str,
        workflow: &WorkflowDto,
        range: DateRange,
    ) -> Result<RangeRuns> {
        let per_page = self.per_page as usize;
        let mut runs = Vec::new();
        let mut page = 1;

        loop {
            let batch = self
                .fetch_workflow_runs_page(org, repo, workflow, range, page)
                .await?;
            if batch.total_count > RUN_LISTING_CAP {
                return Ok(RangeRuns::Capped(batch.total_count));
            }

            let fetched = batch.runs.len();
            runs.extend(batch.runs);
            let expected = usize::try_from(batch.total_count).unwrap_or(usize::MAX);

            if fetched < per_page || runs.len() >= expected {
                if runs.len() < expected {
                    return Err(DeployMetricsError::Incomplete(format!(
                        "{org}/{repo}: workflow '{}' listed {} of {expected} runs in {range}",
                        workflow.name,
                        runs.len()
                    )));
                }
                return Ok(RangeRuns::Complete(runs));
            }
            page += 1;
        }
    }
}
