//! Issues
//!
//! Typed entry points for instance, group and project issues, plus the
//! per-issue actions (move, links, subscriptions, time tracking).

use super::manager::RestManager;
use super::object::RestObject;
use crate::gitlab::client::GitlabClient;
use crate::gitlab::error::GitlabError;
use serde_json::{json, Map, Value};
use std::ops::Deref;

/// Issues visible to the authenticated user (`/issues`)
pub fn issues(client: &GitlabClient) -> Result<RestManager, GitlabError> {
    RestManager::new(client, "issues", None)
}

/// Issues of a group (`/groups/{group_id}/issues`)
pub fn group_issues(client: &GitlabClient, group_id: impl Into<Value>) -> Result<RestManager, GitlabError> {
    RestManager::new(client, "group-issues", Some(&RestObject::lazy("groups", group_id)))
}

/// Issues of a project (`/projects/{project_id}/issues`)
pub fn project_issues(
    client: &GitlabClient,
    project_id: impl Into<Value>,
) -> Result<ProjectIssueManager, GitlabError> {
    let inner = RestManager::new(client, "project-issues", Some(&RestObject::lazy("projects", project_id)))?;
    Ok(ProjectIssueManager { inner })
}

fn no_params() -> Map<String, Value> {
    Map::new()
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Project issue manager: CRUD through [`RestManager`] plus issue actions
#[derive(Debug, Clone)]
pub struct ProjectIssueManager {
    inner: RestManager,
}

impl Deref for ProjectIssueManager {
    type Target = RestManager;

    fn deref(&self) -> &RestManager {
        &self.inner
    }
}

impl ProjectIssueManager {
    /// Move the issue to another project; the issue is refreshed from the response
    pub async fn move_to(&self, issue: &mut RestObject, to_project_id: impl Into<Value>) -> Result<(), GitlabError> {
        self.inner
            .object_action(issue, "move", &params(json!({ "to_project_id": to_project_id.into() })))
            .await?;
        Ok(())
    }

    /// Merge requests related to the issue
    pub async fn related_merge_requests(&self, issue: &mut RestObject) -> Result<Value, GitlabError> {
        self.inner.object_action(issue, "related_merge_requests", &no_params()).await
    }

    /// Merge requests that close the issue when merged
    pub async fn closed_by(&self, issue: &mut RestObject) -> Result<Value, GitlabError> {
        self.inner.object_action(issue, "closed_by", &no_params()).await
    }

    pub async fn participants(&self, issue: &mut RestObject) -> Result<Value, GitlabError> {
        self.inner.object_action(issue, "participants", &no_params()).await
    }

    pub async fn user_agent_detail(&self, issue: &mut RestObject) -> Result<Value, GitlabError> {
        self.inner.object_action(issue, "user_agent_detail", &no_params()).await
    }

    pub async fn subscribe(&self, issue: &mut RestObject) -> Result<(), GitlabError> {
        self.inner.object_action(issue, "subscribe", &no_params()).await?;
        Ok(())
    }

    pub async fn unsubscribe(&self, issue: &mut RestObject) -> Result<(), GitlabError> {
        self.inner.object_action(issue, "unsubscribe", &no_params()).await?;
        Ok(())
    }

    /// Add the issue to the current user's todo list
    pub async fn todo(&self, issue: &mut RestObject) -> Result<(), GitlabError> {
        self.inner.object_action(issue, "todo", &no_params()).await?;
        Ok(())
    }

    /// Time tracking stats; answered locally when the issue already carries them
    pub async fn time_stats(&self, issue: &mut RestObject) -> Result<Value, GitlabError> {
        if let Some(stats) = issue.attr("time_stats") {
            return Ok(stats.clone());
        }
        self.inner.object_action(issue, "time_stats", &no_params()).await
    }

    /// Set the time estimate, e.g. `3h30m`
    pub async fn time_estimate(&self, issue: &mut RestObject, duration: &str) -> Result<Value, GitlabError> {
        self.inner
            .object_action(issue, "time_estimate", &params(json!({ "duration": duration })))
            .await
    }

    pub async fn reset_time_estimate(&self, issue: &mut RestObject) -> Result<Value, GitlabError> {
        self.inner.object_action(issue, "reset_time_estimate", &no_params()).await
    }

    /// Add spent time, e.g. `1h`
    pub async fn add_spent_time(&self, issue: &mut RestObject, duration: &str) -> Result<Value, GitlabError> {
        self.inner
            .object_action(issue, "add_spent_time", &params(json!({ "duration": duration })))
            .await
    }

    pub async fn reset_spent_time(&self, issue: &mut RestObject) -> Result<Value, GitlabError> {
        self.inner.object_action(issue, "reset_spent_time", &no_params()).await
    }

    /// Links of one issue
    pub fn links(&self, issue: &RestObject) -> Result<IssueLinkManager, GitlabError> {
        let inner = self.inner.child(issue, "project-issue-links")?;
        Ok(IssueLinkManager { inner })
    }
}

/// Links between issues (`/projects/{project_id}/issues/{issue_iid}/links`)
#[derive(Debug, Clone)]
pub struct IssueLinkManager {
    inner: RestManager,
}

impl Deref for IssueLinkManager {
    type Target = RestManager;

    fn deref(&self) -> &RestManager {
        &self.inner
    }
}

impl IssueLinkManager {
    /// Link the parent issue to `target_issue_iid` in `target_project_id`.
    ///
    /// GitLab answers with both ends of the link; they are returned as
    /// `(source_issue, target_issue)` project-issue objects.
    pub async fn create_link(
        &self,
        target_project_id: impl Into<Value>,
        target_issue_iid: impl Into<Value>,
    ) -> Result<(RestObject, RestObject), GitlabError> {
        let data = params(json!({
            "target_project_id": target_project_id.into(),
            "target_issue_iid": target_issue_iid.into(),
        }));
        self.create_pair(&data).await
    }

    /// Create a link from raw attributes, returning `(source_issue, target_issue)`
    pub async fn create_pair(&self, data: &Map<String, Value>) -> Result<(RestObject, RestObject), GitlabError> {
        let mut response = self.inner.create_raw(data).await?;

        let mut take = |field: &str| {
            response
                .get_mut(field)
                .map(Value::take)
                .ok_or_else(|| GitlabError::UnexpectedResponse(format!("issue link response has no {}", field)))
        };
        let source = take("source_issue")?;
        let target = take("target_issue")?;

        Ok((
            self.inner.wrap_as("project-issues", source)?,
            self.inner.wrap_as("project-issues", target)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::auth::Credentials;

    fn client() -> GitlabClient {
        GitlabClient::new("https://gitlab.example.com", Credentials::Anonymous).unwrap()
    }

    #[test]
    fn test_issue_manager_paths() {
        let client = client();
        assert_eq!(issues(&client).unwrap().path(), "/issues");
        assert_eq!(group_issues(&client, 5).unwrap().path(), "/groups/5/issues");
        assert_eq!(project_issues(&client, "team/app").unwrap().path(), "/projects/team%2Fapp/issues");
    }

    #[test]
    fn test_links_manager_from_issue() {
        let manager = project_issues(&client(), 42).unwrap();
        let issue = manager.wrap(json!({"id": 900, "iid": 3, "project_id": 42})).unwrap();
        let links = manager.links(&issue).unwrap();
        assert_eq!(links.path(), "/projects/42/issues/3/links");
    }

    #[tokio::test]
    async fn test_time_stats_served_from_attributes() {
        let manager = project_issues(&client(), 42).unwrap();
        let mut issue = manager
            .wrap(json!({"iid": 3, "project_id": 42, "time_stats": {"time_estimate": 3600}}))
            .unwrap();
        let stats = manager.time_stats(&mut issue).await.unwrap();
        assert_eq!(stats["time_estimate"], 3600);
    }

    #[tokio::test]
    async fn test_create_link_requires_both_targets() {
        let manager = project_issues(&client(), 42).unwrap();
        let issue = manager.wrap(json!({"iid": 3, "project_id": 42})).unwrap();
        let links = manager.links(&issue).unwrap();

        let err = links
            .create_pair(&params(json!({"target_project_id": 7})))
            .await
            .unwrap_err();
        assert!(matches!(err, GitlabError::MissingAttributes { ref missing, .. } if missing == &["target_issue_iid"]));
    }
}
