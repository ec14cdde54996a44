//! Event stream synchronization
//!
//! Asana exposes the change history of a resource through `GET /events`,
//! driven by an opaque sync token:
//!
//! - a request without a token (or with an expired one) answers **412** and
//!   carries a fresh token in the body, along with the current backlog;
//! - a request with a valid token answers the events since that token plus
//!   the next token; `has_more` asks the caller to fetch again right away.
//!
//! [`EventManager`] wraps those rules: [`EventManager::fetch_page`] performs a
//! single request, [`EventManager::initialize_sync`] obtains a first token,
//! [`EventManager::get_events`] drains until `has_more` is false and
//! [`EventManager::poll`] keeps fetching in a background task.

mod poll;

pub use poll::Poller;

use crate::client::{api_error, AsanaClient};
use crate::error::{AsanaError, Result};
use crate::pagination::NextPage;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Author of an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUser {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Resource an event is about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventResource {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_subtype: Option<String>,
}

/// Parent of the changed resource (e.g. the project of an added task)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventParent {
    #[serde(default)]
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Field-level description of a change
///
/// The value slots depend on the changed field (text, enum option, user,
/// custom field...), so they stay as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_value: Option<Value>,
}

/// One change to a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<EventUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<EventResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EventParent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<EventChange>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl Event {
    /// JSON view of the event, as seen by filter expressions
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Opaque cursor into a resource's event stream
///
/// Only ever passed back verbatim. An empty token means "no cursor".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncToken(String);

impl SyncToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SyncToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for SyncToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// One answer of `GET /events`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub data: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<NextPage>,
    /// Set when the page came back with 412: the cursor sent was missing or
    /// expired and `sync` holds its replacement
    #[serde(skip)]
    pub expired: bool,
}

impl EventsPage {
    /// The page's cursor, if it carries a non-empty one
    pub fn sync_token(&self) -> Option<SyncToken> {
        self.sync
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(SyncToken::from)
    }
}

/// Result of draining a resource's event stream
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventBatch {
    /// Every event received, in page order then in-page order
    pub events: Vec<Event>,
    /// Cursor to resume from
    pub sync: SyncToken,
    /// True when the starting cursor (or an intermediate one) had expired
    pub expired: bool,
}

/// Reads the event streams of resources
#[derive(Clone, Debug)]
pub struct EventManager {
    client: AsanaClient,
}

impl EventManager {
    pub fn new(client: AsanaClient) -> Self {
        Self { client }
    }

    /// Performs exactly one `GET /events` request
    ///
    /// The token is omitted from the query when empty. A 412 answer carrying
    /// a fresh token comes back as a page with `expired = true`; a 412
    /// without one is an [`AsanaError::Api`] like every other error status.
    pub async fn fetch_page(&self, resource: &str, sync: &str) -> Result<EventsPage> {
        let mut query = vec![("resource", resource.to_string())];
        if !sync.is_empty() {
            query.push(("sync", sync.to_string()));
        }

        let (status, body) = self.client.get_raw("/events", &query).await?;

        if status == StatusCode::PRECONDITION_FAILED {
            return match serde_json::from_slice::<EventsPage>(&body) {
                Ok(mut page) if page.sync_token().is_some() => {
                    tracing::debug!("sync token for {} expired, server issued a new one", resource);
                    page.expired = true;
                    Ok(page)
                }
                _ => Err(api_error(status.as_u16(), &body)),
            };
        }

        if status.is_client_error() || status.is_server_error() {
            let error = api_error(status.as_u16(), &body);
            tracing::error!("Asana {}", error);
            return Err(error);
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Obtains a first sync token for `resource`
    ///
    /// Asana answers 412 to a token-less request; that answer is the expected
    /// outcome here. The returned page holds the new token and whatever
    /// backlog the server included.
    pub async fn initialize_sync(&self, resource: &str) -> Result<EventsPage> {
        let page = self.fetch_page(resource, "").await?;
        if page.sync_token().is_none() {
            return Err(AsanaError::MissingSyncToken(resource.to_string()));
        }

        tracing::debug!("Initialized sync token for resource {}", resource);
        Ok(page)
    }

    /// Fetches every event since `sync`, following `has_more` to the end
    ///
    /// Any error aborts the drain and nothing is returned.
    pub async fn get_events(&self, resource: &str, sync: &str) -> Result<EventBatch> {
        let mut batch = EventBatch {
            sync: SyncToken::from(sync),
            ..Default::default()
        };

        loop {
            let page = self.fetch_page(resource, batch.sync.as_str()).await?;
            let token = page.sync_token();
            batch.expired |= page.expired;
            batch.events.extend(page.data);

            match (token, page.has_more) {
                (Some(token), true) => batch.sync = token,
                (Some(token), false) => {
                    batch.sync = token;
                    break;
                }
                (None, true) => return Err(AsanaError::MissingSyncToken(resource.to_string())),
                (None, false) => break,
            }
        }

        tracing::debug!(
            "Fetched {} event(s) for resource {}",
            batch.events.len(),
            resource
        );
        Ok(batch)
    }

    /// Starts polling `resource` every `interval` in a background task
    ///
    /// With an empty `sync` the first cycle returns the current backlog.
    /// See [`Poller`] for the delivery and cancellation rules.
    pub fn poll(
        &self,
        resource: impl Into<String>,
        sync: impl Into<String>,
        interval: Duration,
    ) -> Poller {
        Poller::spawn(self.clone(), resource.into(), sync.into(), interval)
    }
}
