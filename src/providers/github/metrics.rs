use indexmap::IndexMap;

use super::types::{RunOutcome, WorkflowRun};
use crate::date_range::DateRange;
use crate::insights::{DeploymentStats, RepositoryMetrics};

/// Runs collected for one repository, after filtering.
#[derive(Debug, Clone)]
pub struct RepositoryRuns {
    pub repository: String,
    pub runs: Vec<WorkflowRun>,
}

pub fn calculate_stats<'a, I>(runs: I, range: &DateRange) -> DeploymentStats
where
    I: IntoIterator<Item = &'a WorkflowRun>,
{
    let mut total_runs = 0;
    let mut successful = 0;
    let mut failed = 0;
    let mut cancelled = 0;
    let mut in_progress = 0;
    let mut durations = Vec::new();

    for run in runs {
        total_runs += 1;
        match run.outcome {
            RunOutcome::Success => successful += 1,
            RunOutcome::Failure => failed += 1,
            RunOutcome::Cancelled => cancelled += 1,
            RunOutcome::InProgress => {
                in_progress += 1;
                continue;
            }
        }
        durations.push(run.duration_seconds());
    }

    DeploymentStats {
        total_runs,
        successful_runs: successful,
        failed_runs: failed,
        cancelled_runs: cancelled,
        in_progress_runs: in_progress,
        success_rate: calculate_rate(successful, successful + failed),
        failure_rate: calculate_rate(failed, successful + failed),
        avg_duration_seconds: calculate_mean(&durations),
        median_duration_seconds: calculate_median(&mut durations),
        deployments_per_week: calculate_weekly_frequency(successful, range),
    }
}

fn calculate_rate(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let rate = (count as f64 / total as f64) * 100.0;
    Some(rate)
}

fn calculate_mean(durations: &[u64]) -> Option<f64> {
    if durations.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = durations.iter().sum::<u64>() as f64 / durations.len() as f64;
    Some(mean)
}

#[allow(clippy::cast_precision_loss)]
fn calculate_median(durations: &mut [u64]) -> Option<f64> {
    if durations.is_empty() {
        return None;
    }

    durations.sort_unstable();
    let mid = durations.len() / 2;

    let median = if durations.len() % 2 == 0 {
        (durations[mid - 1] + durations[mid]) as f64 / 2.0
    } else {
        durations[mid] as f64
    };
    Some(median)
}

#[allow(clippy::cast_precision_loss)]
fn calculate_weekly_frequency(successful: usize, range: &DateRange) -> f64 {
    let weeks = range.days() as f64 / 7.0;
    successful as f64 / weeks
}

/// Per-repository metrics plus the organization-wide totals.
///
/// Input order does not matter: repositories, workflows and runs all come out
/// sorted. Run lists are only kept when `keep_runs` is set.
pub fn aggregate(
    results: Vec<RepositoryRuns>,
    range: &DateRange,
    keep_runs: bool,
) -> (IndexMap<String, RepositoryMetrics>, DeploymentStats) {
    let organization_totals = calculate_stats(results.iter().flat_map(|r| &r.runs), range);

    let mut repositories: IndexMap<String, RepositoryMetrics> = results
        .into_iter()
        .map(|result| {
            let metrics = repository_metrics(result.runs, range, keep_runs);
            (result.repository, metrics)
        })
        .collect();
    repositories.sort_keys();

    (repositories, organization_totals)
}

fn repository_metrics(
    mut runs: Vec<WorkflowRun>,
    range: &DateRange,
    keep_runs: bool,
) -> RepositoryMetrics {
    let stats = calculate_stats(&runs, range);

    let mut by_workflow: IndexMap<&str, Vec<&WorkflowRun>> = IndexMap::new();
    for run in &runs {
        by_workflow
            .entry(run.workflow_name.as_str())
            .or_default()
            .push(run);
    }
    let mut workflows: IndexMap<String, DeploymentStats> = by_workflow
        .into_iter()
        .map(|(name, runs)| (name.to_string(), calculate_stats(runs, range)))
        .collect();
    workflows.sort_keys();

    if keep_runs {
        runs.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    } else {
        runs.clear();
    }

    RepositoryMetrics {
        stats,
        workflows,
        runs,
    }
}
