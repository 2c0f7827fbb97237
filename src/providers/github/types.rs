use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub archived: bool,
}

/// Final state of a run at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure,
    Cancelled,
    InProgress,
}

impl RunOutcome {
    /// Map GitHub's `status` / `conclusion` pair onto an outcome.
    ///
    /// Anything that has not reached `completed` is in progress. Among
    /// completed runs, `cancelled` and `skipped` never ran to a verdict; every
    /// other non-success conclusion counts as a failure.
    pub fn from_api(status: Option<&str>, conclusion: Option<&str>) -> Self {
        if status != Some("completed") {
            return Self::InProgress;
        }

        match conclusion {
            Some("success") => Self::Success,
            Some("cancelled" | "skipped") => Self::Cancelled,
            _ => Self::Failure,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::InProgress => "in_progress",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    Automated,
}

impl Trigger {
    pub fn from_event(event: &str) -> Self {
        if event == "workflow_dispatch" {
            Self::Manual
        } else {
            Self::Automated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub run_number: u64,
    pub repository: String,
    pub workflow_name: String,
    pub outcome: RunOutcome,
    pub trigger: Trigger,
    pub event: String,
    pub head_branch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
}

impl WorkflowRun {
    /// Wall-clock seconds between creation and last update, never negative.
    pub fn duration_seconds(&self) -> u64 {
        u64::try_from((self.updated_at - self.created_at).num_seconds()).unwrap_or(0)
    }
}
