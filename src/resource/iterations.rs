//! Group iterations

use super::fetcher::ListParams;
use super::manager::RestManager;
use super::object::RestObject;
use crate::gitlab::client::GitlabClient;
use crate::gitlab::error::GitlabError;
use serde_json::Value;

/// Iterations of a group (`/groups/{group_id}/iterations`)
pub fn group_iterations(client: &GitlabClient, group_id: impl Into<Value>) -> Result<RestManager, GitlabError> {
    RestManager::new(client, "group-iterations", Some(&RestObject::lazy("groups", group_id)))
}

/// Iteration states accepted by the `state` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationState {
    Opened,
    Upcoming,
    Current,
    Closed,
    All,
}

impl IterationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Upcoming => "upcoming",
            Self::Current => "current",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Filter for iterations in the given state
pub fn state_filter(state: IterationState) -> ListParams {
    ListParams::new().set("state", state.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::auth::Credentials;

    #[test]
    fn test_group_iterations_path() {
        let client = GitlabClient::new("https://gitlab.example.com", Credentials::Anonymous).unwrap();
        assert_eq!(group_iterations(&client, 12).unwrap().path(), "/groups/12/iterations");
    }

    #[test]
    fn test_state_filter() {
        let params = state_filter(IterationState::Current);
        assert_eq!(params.as_map()["state"], "current");
    }
}
