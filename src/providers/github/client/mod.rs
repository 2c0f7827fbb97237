mod core;
mod repos;
mod runs;

pub use self::core::GitHubClient;
pub use runs::WorkflowDto;
