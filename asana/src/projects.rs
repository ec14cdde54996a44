//! Projects API

use crate::client::{segment, AsanaClient};
use crate::error::Result;
use crate::pagination::{collect_pages, DataEnvelope};
use crate::types::{opt_fields, ResourceRef};
use serde::{Deserialize, Serialize};

const LIST_FIELDS: &[&str] = &[
    "name",
    "archived",
    "created_at",
    "modified_at",
    "due_date",
    "start_on",
    "notes",
    "public",
    "color",
    "owner.name",
    "current_status.title",
    "current_status.color",
];

const DETAIL_FIELDS: &[&str] = &[
    "name",
    "archived",
    "created_at",
    "modified_at",
    "due_date",
    "start_on",
    "notes",
    "html_notes",
    "public",
    "color",
    "owner.name",
    "current_status",
    "team.name",
    "workspace.name",
    "followers.name",
    "members.name",
    "permalink_url",
    "default_view",
    "icon",
];

/// Asana project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followers: Vec<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ResourceRef>,
}

/// Latest status update posted on a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ProjectManager {
    client: AsanaClient,
}

impl ProjectManager {
    pub fn new(client: AsanaClient) -> Self {
        Self { client }
    }

    pub async fn list_by_workspace(
        &self,
        workspace: &str,
        archived: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Project>> {
        self.list(("workspace", workspace.to_string()), archived, limit)
            .await
    }

    pub async fn list_by_team(
        &self,
        team: &str,
        archived: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Project>> {
        self.list(("team", team.to_string()), archived, limit).await
    }

    async fn list(
        &self,
        scope: (&str, String),
        archived: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Project>> {
        let mut query = vec![scope, ("archived", archived.to_string())];
        if let Some(limit) = limit.filter(|l| *l > 0) {
            query.push(("limit", limit.to_string()));
        }
        query.push(("opt_fields", opt_fields(LIST_FIELDS)));

        collect_pages(&self.client, "/projects", &query, |_: &Project| true).await
    }

    pub async fn get(&self, gid: &str) -> Result<Project> {
        let endpoint = format!("/projects/{}", segment(gid));
        let response: DataEnvelope<Project> = self
            .client
            .get_json(&endpoint, &[("opt_fields", opt_fields(DETAIL_FIELDS))])
            .await?;
        Ok(response.data)
    }
}
