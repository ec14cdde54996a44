//! Users API

use crate::client::{segment, AsanaClient};
use crate::error::Result;
use crate::pagination::{collect_pages, DataEnvelope};
use crate::types::ResourceRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<ResourceRef>,
}

#[derive(Clone, Debug)]
pub struct UserManager {
    client: AsanaClient,
}

impl UserManager {
    pub fn new(client: AsanaClient) -> Self {
        Self { client }
    }

    /// Members of a workspace, with their email
    pub async fn list_in_workspace(&self, workspace: &str) -> Result<Vec<User>> {
        let endpoint = format!("/workspaces/{}/users", segment(workspace));
        let query = [("opt_fields", "gid,name,email".to_string())];
        collect_pages(&self.client, &endpoint, &query, |_: &User| true).await
    }

    /// The user owning the access token
    pub async fn me(&self) -> Result<User> {
        let query = [("opt_fields", "gid,name,email,workspaces.name".to_string())];
        let response: DataEnvelope<User> = self.client.get_json("/users/me", &query).await?;
        Ok(response.data)
    }
}
