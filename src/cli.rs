use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::auth::{resolve_token, SettingsFile, Token};
use crate::date_range::DateRange;
use crate::error::DeployMetricsError;
use crate::providers::github::{GitHubProvider, RunQuery, WorkflowPattern};
use crate::report;

const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Parser)]
#[command(name = "deploy-metrics")]
#[command(
    author,
    version,
    about = "Gather deployment metrics from GitHub Actions",
    long_about = None
)]
pub struct Cli {
    /// GitHub organization name
    #[arg(long)]
    org_name: String,

    /// Glob matched against workflow names (e.g. "*Deploy*")
    #[arg(long)]
    deploy_workflow_pattern: String,

    /// Inclusive creation date range, YYYY-MM-DD..YYYY-MM-DD
    #[arg(long)]
    date_filter: String,

    /// Show per-workflow and per-run output for each repository
    #[arg(long, default_value_t = false)]
    detailed: bool,

    /// Include manually dispatched runs in stats computations
    #[arg(long, default_value_t = false)]
    include_manual_runs: bool,

    /// Turn on DEBUG logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// GitHub access token (needs repo and read:org scopes)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_pat: Option<String>,

    /// JSON settings file providing `github_pat` and/or `api_url`
    #[arg(long)]
    settings: Option<PathBuf>,

    /// GitHub API base URL [default: https://api.github.com]
    #[arg(long)]
    api_url: Option<String>,

    /// Number of repositories fetched concurrently
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Pretty print JSON output
    #[arg(short, long, default_value_t = false, requires = "json")]
    pretty: bool,
}

/// Everything one invocation needs, validated before any request is made.
#[derive(Debug)]
pub struct Settings {
    pub org: String,
    pub api_url: String,
    pub token: Token,
    pub query: RunQuery,
    pub detailed: bool,
    pub json: bool,
    pub pretty: bool,
}

impl Cli {
    pub fn settings(&self) -> crate::error::Result<Settings> {
        let date_range: DateRange = self.date_filter.parse()?;
        let pattern = WorkflowPattern::new(&self.deploy_workflow_pattern)?;

        let org = self.org_name.trim();
        if org.is_empty() {
            return Err(DeployMetricsError::Config(
                "Organization name must not be empty".to_string(),
            ));
        }

        let settings_file = self
            .settings
            .as_deref()
            .map(SettingsFile::load)
            .transpose()?;
        let token = resolve_token(self.github_pat.as_deref(), settings_file.as_ref())?;

        let api_url = self
            .api_url
            .clone()
            .or_else(|| settings_file.and_then(|s| s.api_url))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Settings {
            org: org.to_string(),
            api_url,
            token,
            query: RunQuery {
                pattern,
                date_range,
                include_manual: self.include_manual_runs,
                concurrency: usize::from(self.concurrency),
            },
            detailed: self.detailed,
            json: self.json,
            pretty: self.pretty,
        })
    }

    pub async fn execute(&self) -> Result<()> {
        let settings = self.settings()?;
        info!("Collecting deployment metrics for organization: {}", settings.org);

        let provider = GitHubProvider::new(&settings.api_url, settings.org, settings.token)?;
        let insights = provider
            .collect_insights(&settings.query, settings.detailed)
            .await?;

        let mut stdout = io::stdout().lock();
        if settings.json {
            let json = report::to_json(&insights, settings.pretty)?;
            writeln!(stdout, "{json}").map_err(DeployMetricsError::from)?;
        } else {
            report::write_text(&mut stdout, &insights, settings.detailed)?;
        }

        Ok(())
    }
}
