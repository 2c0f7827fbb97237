use chrono::Utc;
use futures::{future, Stream, TryStreamExt};
use log::{debug, info, warn};

use crate::auth::Token;
use crate::date_range::DateRange;
use crate::error::{DeployMetricsError, Result};
use crate::insights::DeploymentInsights;
use crate::providers::github::client::GitHubClient;
use crate::providers::github::metrics::{aggregate, RepositoryRuns};
use crate::providers::github::pattern::WorkflowPattern;
use crate::providers::github::types::Repository;

use super::filter_runs;

/// What to collect for every repository.
#[derive(Debug, Clone)]
pub struct RunQuery {
    pub pattern: WorkflowPattern,
    pub date_range: DateRange,
    pub include_manual: bool,
    /// Upper bound on repositories fetched at the same time.
    pub concurrency: usize,
}

pub struct GitHubProvider {
    pub client: GitHubClient,
    pub org: String,
}

impl GitHubProvider {
    pub fn new(base_url: &str, org: String, token: Token) -> Result<Self> {
        let client = GitHubClient::new(base_url, token)?;

        Ok(Self::with_client(client, org))
    }

    pub fn with_client(client: GitHubClient, org: String) -> Self {
        Self { client, org }
    }

    /// Non-archived repositories of the organization, fetched page by page.
    pub fn repositories(&self) -> impl Stream<Item = Result<Repository>> + '_ {
        self.client.list_org_repos(&self.org).try_filter(|repo| {
            if repo.archived {
                debug!("Repo {} is archived - skipping", repo.name);
            }
            future::ready(!repo.archived)
        })
    }

    /// Collect and filter the runs of every repository.
    ///
    /// Each repository is fetched independently and produces its own
    /// [`RepositoryRuns`]; the first error aborts the whole collection.
    pub async fn collect_deployments(&self, query: &RunQuery) -> Result<Vec<RepositoryRuns>> {
        self.repositories()
            .map_ok(|repo| async move {
                debug!("Processing repo {}", repo.name);

                let runs = self.collect_runs(&repo, query).await?;
                let runs = filter_runs(runs, query.include_manual);

                debug!("Repo {}: {} runs counted", repo.name, runs.len());
                Ok::<_, DeployMetricsError>(RepositoryRuns {
                    repository: repo.name,
                    runs,
                })
            })
            .try_buffer_unordered(query.concurrency.max(1))
            .try_collect()
            .await
    }

    pub async fn collect_insights(
        &self,
        query: &RunQuery,
        detailed: bool,
    ) -> Result<DeploymentInsights> {
        info!(
            "Collecting runs of workflows matching '{}' in {} for {}",
            query.pattern.as_str(),
            self.org,
            query.date_range
        );

        let results = self.collect_deployments(query).await?;

        if results.is_empty() {
            warn!("No active repositories found in organization: {}", self.org);
        }

        let total_repositories = results.len();
        let (repositories, organization_totals) =
            aggregate(results, &query.date_range, detailed);

        info!(
            "Processed {total_repositories} repositories, {} runs counted",
            organization_totals.total_runs
        );

        Ok(DeploymentInsights {
            provider: "GitHub".to_string(),
            organization: self.org.clone(),
            workflow_pattern: query.pattern.as_str().to_string(),
            date_range: query.date_range,
            include_manual_runs: query.include_manual,
            collected_at: Utc::now(),
            total_repositories,
            repositories,
            organization_totals,
        })
    }
}
