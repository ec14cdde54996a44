//! Offset pagination for resource listings
//!
//! Listings (`GET /tasks`, `GET /projects`, ...) answer with
//! `{"data": [...], "next_page": {"offset": "...", "path": "...", "uri": "..."}}`.
//! The listing is exhausted when `next_page` is null/absent or carries an
//! empty offset. Pages are consumed strictly one after another: an offset
//! token is only valid for the request that follows it.

use crate::client::{AsanaClient, Query};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Pagination pointer returned with a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// One page of a resource listing
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub next_page: Option<NextPage>,
}

impl<T> ListPage<T> {
    /// Offset of the following page, `None` when the listing is exhausted
    pub fn next_offset(&self) -> Option<&str> {
        self.next_page
            .as_ref()
            .and_then(|page| page.offset.as_deref())
            .filter(|offset| !offset.is_empty())
    }
}

/// Envelope for single-resource answers (`{"data": {...}}`)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Fetches every page of a listing, keeping the items accepted by `keep`
///
/// Each request reuses `query` and adds `offset=<token>` from the previous
/// page. The first error aborts the walk and nothing is returned.
pub async fn collect_pages<T, F>(
    client: &AsanaClient,
    endpoint: &str,
    query: &Query<'_>,
    mut keep: F,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: FnMut(&T) -> bool,
{
    let mut items = Vec::new();
    let mut offset: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let mut params: Vec<(&str, String)> = query.to_vec();
        if let Some(token) = offset.take() {
            params.push(("offset", token));
        }

        let page: ListPage<T> = client.get_json(endpoint, &params).await?;
        pages += 1;

        let next = page.next_offset().map(str::to_string);
        items.extend(page.data.into_iter().filter(|item| keep(item)));

        match next {
            Some(token) => offset = Some(token),
            None => break,
        }
    }

    tracing::debug!("{}: {} item(s) across {} page(s)", endpoint, items.len(), pages);
    Ok(items)
}
