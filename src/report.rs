use std::io::{self, Write};

use crate::error::Result;
use crate::insights::{DeploymentInsights, DeploymentStats, RepositoryMetrics};
use crate::providers::github::types::RunOutcome;
use crate::providers::github::WorkflowRun;

/// Whole seconds rendered as `Xm Ys`.
pub fn format_duration(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.max(0.0).round() as u64;
    format!("{}m {}s", total / 60, total % 60)
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}%"))
}

fn format_seconds(seconds: Option<f64>) -> String {
    seconds.map_or_else(
        || "n/a".to_string(),
        |s| format!("{s:.0} s ({})", format_duration(s)),
    )
}

fn summary_line(name: &str, stats: &DeploymentStats) -> String {
    let mut line = format!(
        "{name}: {} runs, {} success",
        stats.total_runs,
        format_rate(stats.success_rate)
    );
    if let Some(avg) = stats.avg_duration_seconds {
        line.push_str(&format!(", avg {}", format_duration(avg)));
    }
    line
}

fn write_stats_block<W: Write>(
    out: &mut W,
    indent: &str,
    stats: &DeploymentStats,
) -> io::Result<()> {
    writeln!(
        out,
        "{indent}Runs: {} ({} successful, {} failed, {} cancelled, {} in progress)",
        stats.total_runs,
        stats.successful_runs,
        stats.failed_runs,
        stats.cancelled_runs,
        stats.in_progress_runs
    )?;
    writeln!(out, "{indent}Success Rate: {}", format_rate(stats.success_rate))?;
    writeln!(out, "{indent}Failure Rate: {}", format_rate(stats.failure_rate))?;
    writeln!(
        out,
        "{indent}Avg Duration: {}",
        format_seconds(stats.avg_duration_seconds)
    )?;
    writeln!(
        out,
        "{indent}Median Duration: {}",
        format_seconds(stats.median_duration_seconds)
    )?;
    writeln!(
        out,
        "{indent}Deployments per week: {:.2}",
        stats.deployments_per_week
    )
}

fn write_run<W: Write>(out: &mut W, run: &WorkflowRun) -> io::Result<()> {
    let duration = if run.outcome == RunOutcome::InProgress {
        "running".to_string()
    } else {
        format_duration(run.duration_seconds() as f64)
    };

    writeln!(
        out,
        "\t\t#{} (id {}) {} {} {} {} {} {}",
        run.run_number,
        run.id,
        run.created_at.format("%Y-%m-%dT%H:%M:%SZ"),
        run.outcome.as_str(),
        run.event,
        run.head_branch.as_deref().unwrap_or("-"),
        duration,
        run.html_url
    )
}

fn write_repository<W: Write>(
    out: &mut W,
    name: &str,
    metrics: &RepositoryMetrics,
    detailed: bool,
) -> io::Result<()> {
    writeln!(out, "{}", summary_line(name, &metrics.stats))?;
    if !detailed {
        return Ok(());
    }

    for (workflow, stats) in &metrics.workflows {
        writeln!(out, "\t{workflow}:")?;
        write_stats_block(out, "\t\t", stats)?;
    }

    if !metrics.runs.is_empty() {
        writeln!(out, "\tRuns:")?;
        for run in &metrics.runs {
            write_run(out, run)?;
        }
    }
    Ok(())
}

/// Human-readable report: one line per repository (plus workflow and run
/// breakdowns when `detailed`), followed by the organization summary.
pub fn write_text<W: Write>(
    out: &mut W,
    insights: &DeploymentInsights,
    detailed: bool,
) -> Result<()> {
    write_report(out, insights, detailed)?;
    out.flush()?;
    Ok(())
}

fn write_report<W: Write>(
    out: &mut W,
    insights: &DeploymentInsights,
    detailed: bool,
) -> io::Result<()> {
    writeln!(
        out,
        "Deployment metrics for {} ({} repositories)",
        insights.organization, insights.total_repositories
    )?;
    writeln!(out)?;

    for (name, metrics) in &insights.repositories {
        write_repository(out, name, metrics, detailed)?;
    }

    let totals = &insights.organization_totals;
    writeln!(out)?;
    writeln!(out, "-------- SUMMARY ---------")?;
    writeln!(
        out,
        "For the period {} with workflows matching {}{}",
        insights.date_range,
        insights.workflow_pattern,
        if insights.include_manual_runs {
            " (manual runs included)"
        } else {
            ""
        }
    )?;
    writeln!(out, "{}", summary_line("Total", totals))?;
    write_stats_block(out, "", totals)
}

pub fn to_json(insights: &DeploymentInsights, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(insights)?
    } else {
        serde_json::to_string(insights)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::DateRange;
    use crate::error::DeployMetricsError;
    use crate::providers::github::types::Trigger;
    use chrono::{Duration, TimeZone, Utc};
    use indexmap::IndexMap;

    fn range() -> DateRange {
        "2024-01-01..2024-01-07".parse().unwrap()
    }

    fn stats(total: usize, ok: usize, failed: usize, avg: Option<f64>) -> DeploymentStats {
        #[allow(clippy::cast_precision_loss)]
        let rate = |n: usize| (ok + failed > 0).then(|| n as f64 / (ok + failed) as f64 * 100.0);
        DeploymentStats {
            total_runs: total,
            successful_runs: ok,
            failed_runs: failed,
            cancelled_runs: 0,
            in_progress_runs: 0,
            success_rate: rate(ok),
            failure_rate: rate(failed),
            avg_duration_seconds: avg,
            median_duration_seconds: avg,
            deployments_per_week: ok as f64,
        }
    }

    fn deploy_run() -> WorkflowRun {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        WorkflowRun {
            id: 9001,
            run_number: 17,
            repository: "repo-a".to_string(),
            workflow_name: "Deploy to Prod".to_string(),
            outcome: RunOutcome::Success,
            trigger: Trigger::Automated,
            event: "push".to_string(),
            head_branch: Some("main".to_string()),
            created_at: created,
            updated_at: created + Duration::seconds(125),
            html_url: "https://github.com/acme/repo-a/actions/runs/9001".to_string(),
        }
    }

    fn insights(with_runs: bool) -> DeploymentInsights {
        let mut repositories = IndexMap::new();
        repositories.insert(
            "repo-a".to_string(),
            RepositoryMetrics {
                stats: stats(3, 2, 1, Some(150.0)),
                workflows: IndexMap::from([(
                    "Deploy to Prod".to_string(),
                    stats(3, 2, 1, Some(150.0)),
                )]),
                runs: if with_runs { vec![deploy_run()] } else { vec![] },
            },
        );
        repositories.insert(
            "repo-b".to_string(),
            RepositoryMetrics {
                stats: stats(0, 0, 0, None),
                workflows: IndexMap::new(),
                runs: vec![],
            },
        );

        DeploymentInsights {
            provider: "GitHub".to_string(),
            organization: "acme".to_string(),
            workflow_pattern: "*Deploy*".to_string(),
            date_range: range(),
            include_manual_runs: false,
            collected_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            total_repositories: 2,
            repositories,
            organization_totals: stats(3, 2, 1, Some(150.0)),
        }
    }

    fn render(insights: &DeploymentInsights, detailed: bool) -> String {
        let mut out = Vec::new();
        write_text(&mut out, insights, detailed).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0m 0s");
        assert_eq!(format_duration(59.4), "0m 59s");
        assert_eq!(format_duration(59.6), "1m 0s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "62m 5s");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(Some(200.0 / 3.0)), "66.7%");
        assert_eq!(format_rate(Some(100.0)), "100.0%");
        assert_eq!(format_rate(None), "n/a");
    }

    #[test]
    fn test_summary_report() {
        let text = render(&insights(false), false);

        assert!(text.contains("repo-a: 3 runs, 66.7% success, avg 2m 30s\n"));
        assert!(text.contains("repo-b: 0 runs, n/a success\n"));
        assert!(text.contains("Total: 3 runs, 66.7% success"));
        assert!(text.contains("For the period 2024-01-01..2024-01-07 with workflows matching *Deploy*"));
        assert!(text.contains("Failure Rate: 33.3%"));
        assert!(!text.contains("Deploy to Prod:"));
        assert!(!text.contains("#17"));
    }

    #[test]
    fn test_detailed_report_lists_workflows_and_runs() {
        let text = render(&insights(true), true);

        assert!(text.contains("\tDeploy to Prod:\n"));
        assert!(text.contains("\t\tRuns: 3 (2 successful, 1 failed, 0 cancelled, 0 in progress)"));
        assert!(text.contains("#17 (id 9001) 2024-01-02T10:00:00Z success push main 2m 5s"));
        assert!(text.contains("repo-b: 0 runs, n/a success\n"));
    }

    #[test]
    fn test_repository_lines_are_in_order() {
        let text = render(&insights(false), false);

        let a = text.find("repo-a:").unwrap();
        let b = text.find("repo-b:").unwrap();
        let summary = text.find("-------- SUMMARY").unwrap();
        assert!(a < b && b < summary);
    }

    #[test]
    fn test_json_output() {
        let json = to_json(&insights(false), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["organization"], "acme");
        assert_eq!(value["date_range"]["start"], "2024-01-01");
        assert_eq!(value["repositories"]["repo-a"]["total_runs"], 3);
        assert_eq!(value["repositories"]["repo-b"]["success_rate"], serde_json::Value::Null);
        assert!(value["repositories"]["repo-a"].get("runs").is_none());
        assert_eq!(value["organization_totals"]["failed_runs"], 1);
    }

    #[test]
    fn test_pretty_json_is_multiline() {
        let json = to_json(&insights(true), true).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("\"outcome\": \"success\""));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let err = write_text(&mut ClosedPipe, &insights(false), false).unwrap_err();

        assert!(matches!(
            err,
            DeployMetricsError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe
        ));
    }
}
