use log::debug;

use crate::providers::github::types::{Trigger, WorkflowRun};

/// Drop manually dispatched runs unless `include_manual` is set.
pub fn filter_runs(runs: Vec<WorkflowRun>, include_manual: bool) -> Vec<WorkflowRun> {
    if include_manual {
        return runs;
    }

    runs.into_iter()
        .filter(|run| {
            let keep = run.trigger != Trigger::Manual;
            if !keep {
                debug!(
                    "Run {} of {} was manually invoked - excluding from stats",
                    run.id, run.repository
                );
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::github::types::RunOutcome;
    use chrono::{TimeZone, Utc};

    fn run(id: u64, event: &str) -> WorkflowRun {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        WorkflowRun {
            id,
            run_number: id,
            repository: "api".to_string(),
            workflow_name: "Deploy".to_string(),
            outcome: RunOutcome::Success,
            trigger: Trigger::from_event(event),
            event: event.to_string(),
            head_branch: None,
            created_at: created,
            updated_at: created,
            html_url: String::new(),
        }
    }

    fn sample() -> Vec<WorkflowRun> {
        vec![
            run(1, "push"),
            run(2, "workflow_dispatch"),
            run(3, "schedule"),
            run(4, "workflow_dispatch"),
        ]
    }

    #[test]
    fn test_excludes_manual_runs_by_default() {
        let ids: Vec<_> = filter_runs(sample(), false).iter().map(|r| r.id).collect();

        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn test_include_manual_keeps_everything() {
        assert_eq!(filter_runs(sample(), true), sample());
    }

    #[test]
    fn test_result_is_subset_of_input() {
        let input = sample();
        let output = filter_runs(input.clone(), false);

        assert!(output.len() <= input.len());
        assert!(output.iter().all(|run| input.contains(run)));
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let once = filter_runs(sample(), false);
        let twice = filter_runs(once.clone(), false);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_runs(vec![], false).is_empty());
    }
}
