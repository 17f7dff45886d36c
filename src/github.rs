use chrono::{NaiveDate, SecondsFormat};
use futures::future::try_join_all;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::Config;
use crate::error::{Error, FetchError, Result};
use crate::stats::{self, ContributorStats, RepositoryContribution, UserMetadata};

/// Upper bound GitHub accepts for `maxRepositories`; nothing past it is fetched.
pub const MAX_REPOSITORIES: u32 = 100;

const USER_METADATA_QUERY: &str = r#"
    query($login: String!) {
        user(login: $login) {
            id
            name
            contributionsCollection {
                contributionYears
            }
        }
    }
"#;

const YEAR_CONTRIBUTIONS_QUERY: &str = r#"
    query($login: String!, $from: DateTime!, $maxRepositories: Int!) {
        user(login: $login) {
            contributionsCollection(from: $from) {
                commitContributionsByRepository(maxRepositories: $maxRepositories) {
                    contributions {
                        totalCount
                    }
                    repository {
                        owner {
                            id
                            avatarUrl
                        }
                        isInOrganization
                        url
                        homepageUrl
                        name
                        nameWithOwner
                        stargazerCount
                        openGraphImageUrl
                        defaultBranchRef {
                            target {
                                ... on Commit {
                                    history {
                                        totalCount
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<UserWrapper<T>>,
}

#[derive(Deserialize)]
struct UserWrapper<T> {
    user: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataUser {
    id: String,
    name: Option<String>,
    contributions_collection: YearsCollection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct YearsCollection {
    contribution_years: Vec<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsUser {
    contributions_collection: RepositoryCollection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryCollection {
    commit_contributions_by_repository: Vec<RepositoryContribution>,
}

pub struct GithubClient {
    config: Config,
    http: Client,
}

impl GithubClient {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Create a client from `GITHUB_PERSONAL_ACCESS_TOKEN` and friends.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    /// Low-level GraphQL request with `errors` checking. No retries.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, FetchError> {
        let resp = self
            .http
            .post(&self.config.graphql_url)
            .bearer_auth(&self.config.token)
            .header("User-Agent", &self.config.user_agent)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(FetchError::Status { status, body });
        }

        let bytes = resp.bytes().await?;
        let json: Value = serde_json::from_slice(&bytes)?;

        if let Some(errors) = json.get("errors") {
            return Err(FetchError::GraphQl(format!("{errors:#}")));
        }

        Ok(json)
    }

    /// Run `query` and pull out `data.user`, failing when the user is absent.
    async fn user_query<T>(
        &self,
        username: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let json = self.graphql(query, variables).await?;
        let parsed: GraphQlResponse<T> = serde_json::from_value(json)?;

        parsed
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| FetchError::UserNotFound(username.to_string()))
    }

    /// Fetch id, display name and contribution years of `username`.
    pub async fn user_metadata(&self, username: &str) -> Result<UserMetadata, FetchError> {
        let user: MetadataUser = self
            .user_query(username, USER_METADATA_QUERY, json!({ "login": username }))
            .await?;

        Ok(UserMetadata {
            id: user.id,
            name: user.name,
            contribution_years: user.contributions_collection.contribution_years,
        })
    }

    /// Per-repository commit contributions of `username` for a single year.
    pub async fn year_contributions(
        &self,
        username: &str,
        year: i32,
    ) -> Result<Vec<RepositoryContribution>, FetchError> {
        tracing::debug!(username, year, "fetching contributions");

        let variables = json!({
            "login": username,
            "from": year_start(year),
            "maxRepositories": MAX_REPOSITORIES,
        });
        let user: ContributionsUser = self
            .user_query(username, YEAR_CONTRIBUTIONS_QUERY, variables)
            .await?;

        Ok(user
            .contributions_collection
            .commit_contributions_by_repository)
    }

    /// Fetch every year concurrently. The first failure fails the whole call.
    pub async fn contributions_by_year(
        &self,
        username: &str,
        years: &[i32],
    ) -> Result<Vec<Vec<RepositoryContribution>>, FetchError> {
        let requests = years
            .iter()
            .map(|&year| self.year_contributions(username, year));

        try_join_all(requests).await
    }

    /// Fetch and merge a user's contributions across all contribution years.
    pub async fn all_contributor_stats(&self, username: &str) -> Result<ContributorStats> {
        let result = self.collect_stats(username).await;
        if let Err(e) = &result {
            tracing::error!(username, error = %e, "error fetching contributor stats");
        }
        result
    }

    async fn collect_stats(&self, username: &str) -> Result<ContributorStats> {
        if username.trim().is_empty() {
            return Err(Error::InvalidUsername);
        }

        let user = self.user_metadata(username).await?;
        tracing::info!(
            username,
            years = user.contribution_years.len(),
            "resolved contribution years"
        );

        let per_year = self
            .contributions_by_year(username, &user.contribution_years)
            .await?;
        let repositories = stats::aggregate(per_year.into_iter().flatten());

        tracing::info!(
            username,
            repositories = repositories.len(),
            "aggregated contributions"
        );

        Ok(ContributorStats {
            id: user.id,
            name: user.name,
            repositories_contributed_to: repositories,
        })
    }
}

/// `YYYY-01-01T00:00:00Z` for the given calendar year.
fn year_start(year: i32) -> String {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| format!("{year:04}-01-01T00:00:00Z"))
}
