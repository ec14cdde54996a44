//! Workspaces API

use crate::client::{segment, AsanaClient};
use crate::error::Result;
use crate::pagination::{collect_pages, DataEnvelope};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_domains: Vec<String>,
    #[serde(default)]
    pub is_organization: bool,
}

impl Workspace {
    /// "organization" or "workspace"
    pub fn kind(&self) -> &'static str {
        if self.is_organization {
            "organization"
        } else {
            "workspace"
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkspaceManager {
    client: AsanaClient,
}

impl WorkspaceManager {
    pub fn new(client: AsanaClient) -> Self {
        Self { client }
    }

    /// Workspaces visible to the token's user
    pub async fn list(&self) -> Result<Vec<Workspace>> {
        let query = [(
            "opt_fields",
            "name,is_organization,email_domains".to_string(),
        )];
        collect_pages(&self.client, "/workspaces", &query, |_: &Workspace| true).await
    }

    pub async fn get(&self, gid: &str) -> Result<Workspace> {
        let endpoint = format!("/workspaces/{}", segment(gid));
        let response: DataEnvelope<Workspace> = self.client.get_json(&endpoint, &[]).await?;
        Ok(response.data)
    }
}
