//! Asana API client
//!
//! Typed access to the Asana REST API (`https://app.asana.com/api/1.0`):
//!
//! - **Resources**: tasks, projects, workspaces, users and webhooks, one
//!   manager per resource, each built from an explicit [`AsanaClient`]
//! - **Events**: sync token handshake, full drain of a resource's event
//!   stream and background polling ([`events`])
//! - **Filters**: boolean expressions over events ([`filter`])
//!
//! # Example
//!
//! ```rust,no_run
//! use asana::{AsanaClient, EventFilter, EventManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AsanaClient::new(std::env::var("ASANA_PERSONAL_ACCESS_TOKEN")?)?;
//! let events = EventManager::new(client);
//!
//! // The first request has no token: Asana answers 412 with a fresh one
//! let first = events.initialize_sync("1200000000000000").await?;
//! let token = first.sync.unwrap_or_default();
//!
//! let filter = EventFilter::compile(r#"event.action == "changed""#)?;
//! let batch = events.get_events("1200000000000000", &token).await?;
//! for event in filter.apply(batch.events) {
//!     println!("{:?}", event.change);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod filter;
pub mod pagination;
pub mod projects;
pub mod tasks;
pub mod types;
pub mod users;
pub mod webhooks;
pub mod workspaces;

pub use client::AsanaClient;
pub use error::{AsanaError, Result};
pub use events::{Event, EventBatch, EventManager, EventsPage, Poller, SyncToken};
pub use filter::{EventFilter, FilterError};
pub use projects::{Project, ProjectManager};
pub use tasks::{Task, TaskManager, TaskUpdate};
pub use users::{User, UserManager};
pub use webhooks::{verify_signature, Webhook, WebhookDelivery, WebhookFilter, WebhookManager};
pub use workspaces::{Workspace, WorkspaceManager};
