use reqwest::StatusCode;

/// Errors returned by the contributor stats operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("username must not be empty")]
    InvalidUsername,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Startup configuration problems. Raised before any request is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} environment variable not set")]
    MissingToken { var: &'static str },
}

/// Failure of a single GraphQL round trip.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error sending GraphQL request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API returned HTTP {}: {body}", .status.as_u16())]
    Status { status: StatusCode, body: String },

    #[error("GraphQL reported errors: {0}")]
    GraphQl(String),

    #[error("failed to decode GraphQL response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("GitHub user {0:?} not found")]
    UserNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
