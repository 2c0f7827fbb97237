mod token;

use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::{DeployMetricsError, Result};

pub use token::Token;

/// Local settings file, used when the token is not given on the command line
/// or through `GITHUB_TOKEN`.
///
/// ```json
/// { "github_pat": "ghp_...", "api_url": "https://github.example.com/api/v3" }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub github_pat: Option<String>,
    pub api_url: Option<String>,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Reading settings from {}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|e| {
            DeployMetricsError::Config(format!(
                "Cannot read settings file {}: {e}",
                path.display()
            ))
        })?;

        serde_json::from_str(&raw).map_err(|source| DeployMetricsError::Decode {
            context: path.display().to_string(),
            source,
        })
    }
}

/// Pick the credential: explicit value (flag or environment) first, then the
/// settings file.
pub fn resolve_token(explicit: Option<&str>, settings: Option<&SettingsFile>) -> Result<Token> {
    let candidates = explicit
        .into_iter()
        .chain(settings.and_then(|s| s.github_pat.as_deref()));

    candidates
        .map(Token::from)
        .find(|token| !token.is_empty())
        .ok_or_else(|| {
            DeployMetricsError::Config(
                "No GitHub token supplied (use --github-pat, GITHUB_TOKEN or a settings file)"
                    .to_string(),
            )
        })
}
