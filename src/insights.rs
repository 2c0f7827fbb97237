use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::date_range::DateRange;
use crate::providers::github::WorkflowRun;

#[derive(Debug, Serialize)]
pub struct DeploymentInsights {
    pub provider: String,
    pub organization: String,
    pub workflow_pattern: String,
    pub date_range: DateRange,
    pub include_manual_runs: bool,
    pub collected_at: DateTime<Utc>,
    pub total_repositories: usize,
    /// Keyed by repository name, sorted. Repositories without matching runs
    /// are present with zero counts.
    pub repositories: IndexMap<String, RepositoryMetrics>,
    pub organization_totals: DeploymentStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryMetrics {
    #[serde(flatten)]
    pub stats: DeploymentStats,
    pub workflows: IndexMap<String, DeploymentStats>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentStats {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub failed_runs: usize,
    pub cancelled_runs: usize,
    pub in_progress_runs: usize,
    /// `None` when no run reached success or failure.
    pub success_rate: Option<f64>,
    pub failure_rate: Option<f64>,
    pub avg_duration_seconds: Option<f64>,
    pub median_duration_seconds: Option<f64>,
    pub deployments_per_week: f64,
}
