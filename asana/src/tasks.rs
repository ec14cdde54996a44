//! Tasks API
//!
//! Listings go through `GET /tasks` filtered by project, section or
//! assignee. Asana hides completed tasks unless `completed_since` is given,
//! so every listing sends `completed_since=now` and drops completed tasks on
//! the client side when they were not asked for.

use crate::client::{segment, AsanaClient};
use crate::error::{AsanaError, Result};
use crate::pagination::{collect_pages, DataEnvelope};
use crate::types::{opt_fields, ResourceRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROJECT_LIST_FIELDS: &[&str] = &[
    "name",
    "completed",
    "completed_at",
    "completed_by.name",
    "created_at",
    "due_on",
    "due_at",
    "notes",
    "assignee.name",
    "assignee_section.name",
    "tags.name",
    "tags.color",
    "num_subtasks",
    "parent.name",
    "memberships.section.name",
    "resource_subtype",
    "start_on",
];

const SECTION_LIST_FIELDS: &[&str] = &[
    "name",
    "completed",
    "completed_at",
    "created_at",
    "due_on",
    "due_at",
    "notes",
    "assignee.name",
    "tags.name",
    "num_subtasks",
];

const ASSIGNEE_LIST_FIELDS: &[&str] = &[
    "name",
    "completed",
    "completed_at",
    "created_at",
    "due_on",
    "due_at",
    "notes",
    "projects.name",
    "assignee_section.name",
    "tags.name",
    "num_subtasks",
];

const DETAIL_FIELDS: &[&str] = &[
    "name",
    "completed",
    "completed_at",
    "completed_by.name",
    "created_at",
    "modified_at",
    "due_on",
    "due_at",
    "html_notes",
    "notes",
    "assignee.name",
    "assignee_section.name",
    "custom_fields",
    "followers.name",
    "parent.name",
    "projects.name",
    "tags.name",
    "tags.color",
    "workspace.name",
    "memberships.project.name",
    "memberships.section.name",
    "num_subtasks",
    "resource_subtype",
    "start_on",
    "start_at",
    "dependencies.name",
    "dependents.name",
];

/// Asana task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_subtype: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_subtasks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_section: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followers: Vec<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memberships: Vec<Membership>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<TaskCustomField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<ResourceRef>,
}

impl Task {
    /// Name of the section of the first membership, if any
    pub fn section_name(&self) -> Option<&str> {
        self.memberships
            .first()
            .and_then(|m| m.section.as_ref())
            .and_then(|s| s.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Project/section pair a task belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<ResourceRef>,
}

/// Custom field value as attached to a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskCustomField {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
}

/// Partial update of a task
///
/// Only the fields that are set are sent. For `assignee`, `due_on` and
/// `start_on`, `Some(None)` sends `null` and clears the value.
/// Tags are attached one by one through `addTag` after the field update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_on: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip)]
    pub tags: Vec<String>,
}

impl TaskUpdate {
    fn has_fields(&self) -> bool {
        self.name.is_some()
            || self.notes.is_some()
            || self.assignee.is_some()
            || self.due_on.is_some()
            || self.start_on.is_some()
            || self.completed.is_some()
    }

    /// True when nothing would be changed
    pub fn is_empty(&self) -> bool {
        !self.has_fields() && self.tags.is_empty()
    }
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    data: &'a TaskUpdate,
}

/// Reads and edits tasks
#[derive(Clone, Debug)]
pub struct TaskManager {
    client: AsanaClient,
}

impl TaskManager {
    pub fn new(client: AsanaClient) -> Self {
        Self { client }
    }

    /// Tasks of a project
    pub async fn list_by_project(
        &self,
        project: &str,
        include_completed: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Task>> {
        let query = vec![("project", project.to_string())];
        self.list(query, PROJECT_LIST_FIELDS, include_completed, limit)
            .await
    }

    /// Tasks of a section
    pub async fn list_by_section(
        &self,
        section: &str,
        include_completed: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Task>> {
        let query = vec![("section", section.to_string())];
        self.list(query, SECTION_LIST_FIELDS, include_completed, limit)
            .await
    }

    /// Tasks assigned to a user; Asana requires the workspace alongside
    pub async fn list_by_assignee(
        &self,
        assignee: &str,
        workspace: &str,
        include_completed: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Task>> {
        let query = vec![
            ("assignee", assignee.to_string()),
            ("workspace", workspace.to_string()),
        ];
        self.list(query, ASSIGNEE_LIST_FIELDS, include_completed, limit)
            .await
    }

    async fn list(
        &self,
        mut query: Vec<(&str, String)>,
        fields: &[&str],
        include_completed: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Task>> {
        query.push(("completed_since", "now".to_string()));
        if let Some(limit) = limit.filter(|l| *l > 0) {
            query.push(("limit", limit.to_string()));
        }
        query.push(("opt_fields", opt_fields(fields)));

        collect_pages(&self.client, "/tasks", &query, |task: &Task| {
            include_completed || !task.completed
        })
        .await
    }

    /// Full details of one task
    pub async fn get(&self, gid: &str) -> Result<Task> {
        let endpoint = format!("/tasks/{}", segment(gid));
        let response: DataEnvelope<Task> = self
            .client
            .get_json(&endpoint, &[("opt_fields", opt_fields(DETAIL_FIELDS))])
            .await?;
        Ok(response.data)
    }

    /// Applies `update` and returns the task as it is afterwards
    pub async fn update(&self, gid: &str, update: &TaskUpdate) -> Result<Task> {
        if update.is_empty() {
            return Err(AsanaError::Validation(
                "no task fields to update".to_string(),
            ));
        }

        let endpoint = format!("/tasks/{}", segment(gid));
        let mut updated = None;
        if update.has_fields() {
            let response: DataEnvelope<Task> = self
                .client
                .put_json(&endpoint, &UpdateRequest { data: update })
                .await?;
            updated = Some(response.data);
        }

        for tag in &update.tags {
            self.add_tag(gid, tag).await?;
        }

        tracing::info!("Updated task {}", gid);
        match updated {
            Some(task) if update.tags.is_empty() => Ok(task),
            _ => self.get(gid).await,
        }
    }

    /// Attaches an existing tag to a task
    pub async fn add_tag(&self, gid: &str, tag: &str) -> Result<()> {
        let endpoint = format!("/tasks/{}/addTag", segment(gid));
        let _: Value = self
            .client
            .post_form(&endpoint, &[("tag", tag.to_string())])
            .await?;
        Ok(())
    }

    pub async fn complete(&self, gid: &str) -> Result<Task> {
        self.set_completed(gid, true).await
    }

    pub async fn uncomplete(&self, gid: &str) -> Result<Task> {
        self.set_completed(gid, false).await
    }

    async fn set_completed(&self, gid: &str, completed: bool) -> Result<Task> {
        let update = TaskUpdate {
            completed: Some(completed),
            ..Default::default()
        };
        self.update(gid, &update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager(server: &MockServer) -> TaskManager {
        TaskManager::new(AsanaClient::with_base_url("test-token", server.uri()).unwrap())
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = TaskUpdate {
            name: Some("Renamed".into()),
            assignee: Some(None),
            due_on: Some(Some("2025-10-01".into())),
            tags: vec!["1".into()],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"name": "Renamed", "assignee": null, "due_on": "2025-10-01"})
        );
        assert!(!update.is_empty());
        assert!(TaskUpdate::default().is_empty());
    }

    #[test]
    fn test_section_name() {
        let task: Task = serde_json::from_value(json!({
            "gid": "1",
            "name": "t",
            "memberships": [{"section": {"gid": "s", "name": "Doing"}}]
        }))
        .unwrap();
        assert_eq!(task.section_name(), Some("Doing"));
        assert_eq!(Task::default().section_name(), None);
    }

    #[tokio::test]
    async fn test_list_by_project_paginates_and_hides_completed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("offset", "o2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"gid": "3", "name": "c", "completed": false}],
                "next_page": null
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("project", "p1"))
            .and(query_param("completed_since", "now"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"gid": "1", "name": "a", "completed": false},
                    {"gid": "2", "name": "b", "completed": true}
                ],
                "next_page": {"offset": "o2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tasks = manager(&server)
            .list_by_project("p1", false, Some(2))
            .await
            .unwrap();
        let gids: Vec<&str> = tasks.iter().map(|t| t.gid.as_str()).collect();
        assert_eq!(gids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_list_by_assignee_keeps_completed_when_asked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("assignee", "u1"))
            .and(query_param("workspace", "w1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"gid": "1", "completed": true}, {"gid": "2", "completed": false}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tasks = manager(&server)
            .list_by_assignee("u1", "w1", true, None)
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_get_unwraps_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"gid": "42", "name": "Ship", "assignee": {"gid": "u", "name": "Ana"}}
            })))
            .mount(&server)
            .await;

        let task = manager(&server).get("42").await.unwrap();
        assert_eq!(task.name, "Ship");
        assert_eq!(task.assignee.unwrap().label(), "Ana");
    }

    #[tokio::test]
    async fn test_get_propagates_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"errors": [{"message": "Bad request"}]})),
            )
            .mount(&server)
            .await;

        let err = manager(&server).get("42").await.unwrap_err();
        assert_eq!(err.to_string(), "API error (400): Bad request");
    }

    #[tokio::test]
    async fn test_complete_sends_completed_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/tasks/42"))
            .and(body_json(json!({"data": {"completed": true}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"gid": "42", "name": "Ship", "completed": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let task = manager(&server).complete("42").await.unwrap();
        assert!(task.completed);
    }

    #[tokio::test]
    async fn test_update_with_tags_refetches_task() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/tasks/42"))
            .and(body_json(json!({"data": {"notes": "n"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"gid": "42"}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tasks/42/addTag"))
            .and(body_string("tag=t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"gid": "42", "notes": "n", "tags": [{"gid": "t1", "name": "urgent"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = TaskUpdate {
            notes: Some("n".into()),
            tags: vec!["t1".into()],
            ..Default::default()
        };
        let task = manager(&server).update("42", &update).await.unwrap();
        assert_eq!(task.tags[0].name.as_deref(), Some("urgent"));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected_locally() {
        let server = MockServer::start().await;
        let err = manager(&server)
            .update("42", &TaskUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AsanaError::Validation(_)));
    }
}
