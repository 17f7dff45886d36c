use std::fmt;

use crate::error::ConfigError;

pub const TOKEN_VAR: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";
pub const GRAPHQL_URL_VAR: &str = "GITHUB_GRAPHQL_URL";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Settings for talking to the GitHub GraphQL API.
///
/// Built once at startup. A `Config` always carries a non-blank token, so a
/// client built from it never has to check for one again.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub graphql_url: String,
    pub user_agent: String,
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_VAR)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken { var: TOKEN_VAR })?;

        let graphql_url = lookup(GRAPHQL_URL_VAR)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());

        Ok(Self {
            token,
            graphql_url,
            user_agent: concat!("contrib-stats/", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("graphql_url", &self.graphql_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
