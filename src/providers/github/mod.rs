mod client;
mod metrics;
mod pattern;
mod provider;
pub mod types;

pub use pattern::WorkflowPattern;
pub use provider::{GitHubProvider, RunQuery};
pub use types::WorkflowRun;
