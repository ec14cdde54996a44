//! HTTP transport for the Asana API

use crate::error::{AsanaError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production endpoint of the Asana REST API
pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";

/// Query string pairs; values are form-encoded by reqwest
pub type Query<'a> = [(&'a str, String)];

/// Authenticated client for the Asana API
///
/// The token and base URL are fixed at construction. Cloning is cheap
/// (the inner `reqwest::Client` is reference counted), so one client can be
/// handed to every manager and to the background poller.
#[derive(Clone, Debug)]
pub struct AsanaClient {
    http_client: HttpClient,
    access_token: String,
    base_url: String,
}

impl AsanaClient {
    /// Creates a client against the production API
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom endpoint (mock servers, proxies)
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timeouts(access_token, base_url, 30, 5)
    }

    /// Creates a client with custom timeouts
    pub fn with_timeouts(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| AsanaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AsanaError::Config("access token is empty".to_string()));
        }

        Ok(Self {
            http_client,
            access_token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = self.build_url(endpoint);
        tracing::debug!("{} {}", method, url);

        self.http_client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(ACCEPT, "application/json")
    }

    /// Executes a GET and returns the status and body without judging the status
    ///
    /// The event core needs this to treat 412 as a regular answer.
    pub async fn get_raw(&self, endpoint: &str, query: &Query<'_>) -> Result<(StatusCode, Vec<u8>)> {
        let response = self.request(Method::GET, endpoint).query(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    /// Executes a GET and decodes the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &Query<'_>) -> Result<T> {
        let body = self
            .execute(self.request(Method::GET, endpoint).query(query))
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Executes a POST with a JSON body and decodes the JSON answer
    pub async fn post_json<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body)?;
        let body = self
            .execute(
                self.request(Method::POST, endpoint)
                    .header(CONTENT_TYPE, "application/json")
                    .body(payload),
            )
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Executes a form-encoded POST and decodes the JSON answer
    pub async fn post_form<T: DeserializeOwned>(&self, endpoint: &str, form: &Query<'_>) -> Result<T> {
        // reqwest::RequestBuilder::form sets the urlencoded content type
        let body = self
            .execute(self.request(Method::POST, endpoint).form(form))
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Executes a PUT with a JSON body and decodes the JSON answer
    pub async fn put_json<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body)?;
        let body = self
            .execute(
                self.request(Method::PUT, endpoint)
                    .header(CONTENT_TYPE, "application/json")
                    .body(payload),
            )
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Executes a DELETE; the (empty) answer body is discarded
    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, endpoint)).await?;
        Ok(())
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Vec<u8>> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_client_error() || status.is_server_error() {
            let error = api_error(status.as_u16(), &body);
            tracing::error!("Asana {}", error);
            return Err(error);
        }

        Ok(body.to_vec())
    }

    /// Token sent as bearer credential
    pub fn token(&self) -> &str {
        &self.access_token
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Normalizes an error answer into [`AsanaError::Api`]
///
/// Uses `errors[0].message` when the body is the standard envelope, the
/// trimmed raw body otherwise.
pub(crate) fn api_error(status: u16, body: &[u8]) -> AsanaError {
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next())
        .map(|detail| detail.message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    AsanaError::Api { status, message }
}

/// Percent-encodes one path segment (resource gids are opaque)
pub(crate) fn segment(gid: &str) -> String {
    urlencoding::encode(gid).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = AsanaClient::new("test-token").unwrap();
        assert_eq!(client.token(), "test-token");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let err = AsanaClient::new("  ").unwrap_err();
        assert!(matches!(err, AsanaError::Config(_)));
    }

    #[test]
    fn test_url_building() {
        let client = AsanaClient::with_base_url("t", "http://localhost:1234/api/").unwrap();
        assert_eq!(client.build_url("/tasks"), "http://localhost:1234/api/tasks");
        assert_eq!(client.build_url("tasks"), "http://localhost:1234/api/tasks");
    }

    #[test]
    fn test_api_error_uses_first_envelope_message() {
        let err = api_error(400, br#"{"errors":[{"message":"Bad request"},{"message":"x"}]}"#);
        match err {
            AsanaError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad request");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        let err = api_error(502, b"  upstream unavailable\n");
        assert_eq!(err.to_string(), "API error (502): upstream unavailable");

        let err = api_error(400, br#"{"errors":[]}"#);
        assert_eq!(err.to_string(), r#"API error (400): {"errors":[]}"#);
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("12345"), "12345");
        assert_eq!(segment("a/b"), "a%2Fb");
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_accept_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workspaces"))
            .and(header("authorization", "Bearer secret"))
            .and(header("accept", "application/json"))
            .and(query_param("opt_fields", "name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = AsanaClient::with_base_url("secret", server.uri()).unwrap();
        let value: Value = client
            .get_json("/workspaces", &[("opt_fields", "name".to_string())])
            .await
            .unwrap();
        assert_eq!(value, json!({"data": []}));
    }

    #[tokio::test]
    async fn test_error_status_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"errors": [{"message": "Bad request"}]})),
            )
            .mount(&server)
            .await;

        let client = AsanaClient::with_base_url("t", server.uri()).unwrap();
        let err = client.get_json::<Value>("/tasks", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "API error (400): Bad request");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = AsanaClient::with_base_url("t", server.uri()).unwrap();
        let err = client.get_json::<Value>("/users/me", &[]).await.unwrap_err();
        assert!(matches!(err, AsanaError::Json(_)));
    }

    #[tokio::test]
    async fn test_post_and_put_send_json() {
        let server = MockServer::start().await;
        let body = json!({"data": {"name": "x"}});
        Mock::given(method("POST"))
            .and(path("/webhooks"))
            .and(header("content-type", "application/json"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"gid": "1"}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/tasks/1"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"gid": "1"}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = AsanaClient::with_base_url("t", server.uri()).unwrap();
        let created: Value = client.post_json("/webhooks", &body).await.unwrap();
        assert_eq!(created["data"]["gid"], "1");
        let updated: Value = client.put_json("/tasks/1", &body).await.unwrap();
        assert_eq!(updated["data"]["gid"], "1");
    }

    #[tokio::test]
    async fn test_post_form_is_urlencoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks/1/addTag"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("tag=42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = AsanaClient::with_base_url("t", server.uri()).unwrap();
        let _: Value = client
            .post_form("/tasks/1/addTag", &[("tag", "42".to_string())])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_raw_does_not_judge_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(412).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = AsanaClient::with_base_url("t", server.uri()).unwrap();
        let (status, body) = client.get_raw("/events", &[]).await.unwrap();
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body, b"{}");
    }
}
