mod core;
mod filter;
mod runs;

pub use self::core::{GitHubProvider, RunQuery};
pub use filter::filter_runs;
