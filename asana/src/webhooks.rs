//! Asana Webhooks API
//!
//! A webhook pushes the events of one resource to a target URL. On creation
//! Asana performs a handshake with the target: it sends an `X-Hook-Secret`
//! header that the target must echo back and keep. Every later delivery is a
//! `POST` whose body is `{"events": [...]}` (same event shape as
//! `GET /events`) and whose `X-Hook-Signature` header is the hex encoded
//! HMAC-SHA256 of the raw body, keyed with that secret.
//!
//! ## Example
//!
//! ```rust,no_run
//! use asana::webhooks::{WebhookFilter, WebhookManager};
//! use asana::AsanaClient;
//!
//! # async fn example() -> asana::Result<()> {
//! let client = AsanaClient::new("personal_access_token")?;
//! let manager = WebhookManager::new(client);
//!
//! let filters = vec![WebhookFilter::new("task").with_action("changed")];
//! let webhook = manager
//!     .create("1200000000000000", "https://example.com/hooks/asana", &filters)
//!     .await?;
//! println!("webhook {} active: {}", webhook.gid, webhook.active);
//!
//! manager.delete(&webhook.gid).await?;
//! # Ok(())
//! # }
//! ```

use crate::client::{segment, AsanaClient};
use crate::error::{AsanaError, Result};
use crate::events::Event;
use crate::pagination::{collect_pages, DataEnvelope};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature
pub const SIGNATURE_HEADER: &str = "X-Hook-Signature";

/// Registered webhook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<WebhookResource>,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<WebhookFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_deletion_timestamp: Option<String>,
    #[serde(default)]
    pub is_workspace_webhook: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookResource {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Narrows the events a webhook delivers
///
/// An event is delivered when it matches at least one filter. A filter
/// without `action` matches every action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookFilter {
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl WebhookFilter {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    /// Restricts the filter to one action; `"all"` (or empty) removes the restriction
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        let action = action.into();
        self.action = match action.as_str() {
            "" | "all" => None,
            _ => Some(action),
        };
        self
    }

    pub fn with_resource_subtype(mut self, subtype: impl Into<String>) -> Self {
        let subtype = subtype.into();
        self.resource_subtype = (!subtype.is_empty()).then_some(subtype);
        self
    }
}

#[derive(Serialize)]
struct CreateData<'a> {
    resource: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "no_filters")]
    filters: &'a [WebhookFilter],
}

fn no_filters(filters: &&[WebhookFilter]) -> bool {
    filters.is_empty()
}

#[derive(Serialize)]
struct FiltersData<'a> {
    filters: &'a [WebhookFilter],
}

#[derive(Serialize)]
struct Request<T> {
    data: T,
}

/// Manages the token's webhooks
#[derive(Clone, Debug)]
pub struct WebhookManager {
    client: AsanaClient,
}

impl WebhookManager {
    pub fn new(client: AsanaClient) -> Self {
        Self { client }
    }

    /// Registers a webhook on `resource` delivering to `target`
    ///
    /// Asana completes the handshake with `target` before answering, so the
    /// target must already be reachable.
    pub async fn create(
        &self,
        resource: &str,
        target: &str,
        filters: &[WebhookFilter],
    ) -> Result<Webhook> {
        let request = Request {
            data: CreateData {
                resource,
                target,
                filters,
            },
        };
        let response: DataEnvelope<Webhook> = self.client.post_json("/webhooks", &request).await?;
        tracing::info!(
            "Created webhook {} for resource {} -> {}",
            response.data.gid,
            resource,
            target
        );
        Ok(response.data)
    }

    /// Webhooks of a workspace, optionally restricted to one resource
    pub async fn list(&self, workspace: Option<&str>, resource: Option<&str>) -> Result<Vec<Webhook>> {
        let mut query = Vec::new();
        if let Some(workspace) = workspace.filter(|w| !w.is_empty()) {
            query.push(("workspace", workspace.to_string()));
        }
        if let Some(resource) = resource.filter(|r| !r.is_empty()) {
            query.push(("resource", resource.to_string()));
        }
        collect_pages(&self.client, "/webhooks", &query, |_: &Webhook| true).await
    }

    pub async fn get(&self, gid: &str) -> Result<Webhook> {
        let endpoint = format!("/webhooks/{}", segment(gid));
        let response: DataEnvelope<Webhook> = self.client.get_json(&endpoint, &[]).await?;
        Ok(response.data)
    }

    pub async fn delete(&self, gid: &str) -> Result<()> {
        let endpoint = format!("/webhooks/{}", segment(gid));
        self.client.delete(&endpoint).await?;
        tracing::info!("Deleted webhook {}", gid);
        Ok(())
    }

    /// Replaces the webhook's filters; nothing else is sent
    pub async fn update_filters(&self, gid: &str, filters: &[WebhookFilter]) -> Result<Webhook> {
        let endpoint = format!("/webhooks/{}", segment(gid));
        let request = Request {
            data: FiltersData { filters },
        };
        let response: DataEnvelope<Webhook> = self.client.put_json(&endpoint, &request).await?;
        Ok(response.data)
    }
}

/// Body of a webhook delivery
///
/// The handshake request carries no events, hence the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookDelivery {
    #[serde(default)]
    pub events: Vec<Event>,
}

impl WebhookDelivery {
    /// Decodes a delivery after checking its signature
    pub fn from_signed(secret: &str, body: &[u8], signature: &str) -> Result<Self> {
        if !verify_signature(secret, body, signature) {
            return Err(AsanaError::Validation(format!(
                "{} does not match the delivery body",
                SIGNATURE_HEADER
            )));
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// Checks an `X-Hook-Signature` value against the raw delivery body
///
/// The comparison runs in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);

    mac.verify_slice(&expected).is_ok()
}
