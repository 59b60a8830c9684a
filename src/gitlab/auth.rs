//! GitLab Authentication
//!
//! GitLab accepts exactly one credential per request: a personal/project
//! access token, an OAuth2 bearer token, or a CI job token.

use reqwest::RequestBuilder;

/// Environment variable holding a personal access token
pub const PRIVATE_TOKEN_ENV: &str = "GITLAB_PRIVATE_TOKEN";
/// Environment variable holding an OAuth2 access token
pub const OAUTH_TOKEN_ENV: &str = "GITLAB_OAUTH_TOKEN";
/// Environment variable set by GitLab CI for job tokens
pub const JOB_TOKEN_ENV: &str = "CI_JOB_TOKEN";

/// Credentials attached to every request
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Anonymous,
    PrivateToken(String),
    OAuthToken(String),
    JobToken(String),
}

impl Credentials {
    /// Pick the first credential found in the environment.
    ///
    /// Private tokens win over OAuth tokens, which win over job tokens.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(token) = read(PRIVATE_TOKEN_ENV) {
            Self::PrivateToken(token)
        } else if let Some(token) = read(OAUTH_TOKEN_ENV) {
            Self::OAuthToken(token)
        } else if let Some(token) = read(JOB_TOKEN_ENV) {
            Self::JobToken(token)
        } else {
            Self::Anonymous
        }
    }

    /// Attach the credential header to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Anonymous => request,
            Self::PrivateToken(token) => request.header("PRIVATE-TOKEN", token),
            Self::OAuthToken(token) => request.bearer_auth(token),
            Self::JobToken(token) => request.header("JOB-TOKEN", token),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::PrivateToken(_) => "private-token",
            Self::OAuthToken(_) => "oauth",
            Self::JobToken(_) => "job-token",
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

// Security: never print token values
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials({})", self.kind())
    }
}
