use futures::{future, TryStreamExt};
use log::debug;

use super::core::{GitHubProvider, RunQuery};
use crate::error::Result;
use crate::providers::github::client::WorkflowDto;
use crate::providers::github::types::{Repository, WorkflowRun};

impl GitHubProvider {
    /// Runs of every workflow in `repo` whose name matches the query pattern
    /// and whose creation date falls inside the query range.
    ///
    /// All pages are consumed before returning, and a listing that comes up
    /// short of GitHub's reported total is an error. Manual runs are still
    /// included here; see [`super::filter_runs`].
    pub async fn collect_runs(
        &self,
        repo: &Repository,
        query: &RunQuery,
    ) -> Result<Vec<WorkflowRun>> {
        let workflows: Vec<WorkflowDto> = self
            .client
            .list_workflows(&self.org, &repo.name)
            .try_filter(|workflow| {
                let matched = query.pattern.is_match(&workflow.name);
                debug!(
                    "Workflow '{}' in {} {} '{}'",
                    workflow.name,
                    repo.name,
                    if matched { "matches" } else { "does not match" },
                    query.pattern.as_str()
                );
                future::ready(matched)
            })
            .try_collect()
            .await?;

        let mut runs = Vec::new();
        for workflow in &workflows {
            let mut workflow_runs = self
                .client
                .collect_workflow_runs(&self.org, &repo.name, workflow, query.date_range)
                .await?;
            workflow_runs.retain(|run| query.date_range.contains(run.created_at));

            debug!(
                "Found {} workflow runs for {} in {}",
                workflow_runs.len(),
                workflow.name,
                repo.name
            );
            runs.extend(workflow_runs);
        }

        Ok(runs)
    }
}
