use futures::Stream;
use serde::Deserialize;

use super::core::GitHubClient;
use crate::error::Result;
use crate::providers::github::types::Repository;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RepositoryDto {
    pub name: String,
    pub archived: bool,
}

impl From<RepositoryDto> for Repository {
    fn from(dto: RepositoryDto) -> Self {
        Self {
            name: dto.name,
            archived: dto.archived,
        }
    }
}

impl GitHubClient {
    /// Fetch one page of `/orgs/{org}/repos`
    pub async fn fetch_org_repos_page(&self, org: &str, page: u32) -> Result<Vec<Repository>> {
        let url = self.endpoint(&["orgs", org, "repos"]);
        let mut query = self.page_query(page);
        query.push(("type", "all".to_string()));

        let repos: Vec<RepositoryDto> = self.get_json(url, &query).await?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    /// Every repository in the organization, archived ones included.
    pub fn list_org_repos<'a>(
        &'a self,
        org: &'a str,
    ) -> impl Stream<Item = Result<Repository>> + 'a {
        self.paginate(move |page| self.fetch_org_repos_page(org, page))
    }
}
