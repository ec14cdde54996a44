use super::{EventManager, EventsPage, Event};
use crate::error::AsanaError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Handle on a background polling task
///
/// Events arrive on `events` in page order. The channel holds a single
/// event, so the task waits for the consumer before fetching further.
/// Failed fetches are reported on `errors` and the task keeps polling with
/// the cursor it had.
///
/// Both channels close once the task stops, which happens on
/// [`cancel`](Self::cancel) or when either receiver is dropped.
pub struct Poller {
    pub events: mpsc::Receiver<Event>,
    pub errors: mpsc::Receiver<AsanaError>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    pub(super) fn spawn(
        manager: EventManager,
        resource: String,
        sync: String,
        interval: Duration,
    ) -> Self {
        let (events_tx, events) = mpsc::channel(1);
        let (errors_tx, errors) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let task = PollTask {
            manager,
            resource,
            sync,
            interval,
            events: events_tx,
            errors: errors_tx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(task.run());

        Self {
            events,
            errors,
            cancel,
            handle,
        }
    }

    /// Asks the task to stop; the channels close shortly after
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stops the task and waits for it to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!("Event poller task ended abnormally: {}", e);
        }
    }
}

struct PollTask {
    manager: EventManager,
    resource: String,
    sync: String,
    interval: Duration,
    events: mpsc::Sender<Event>,
    errors: mpsc::Sender<AsanaError>,
    cancel: CancellationToken,
}

impl PollTask {
    async fn run(mut self) {
        tracing::info!(
            "Polling events for resource {} every {:?}",
            self.resource,
            self.interval
        );

        while self.cycle().await {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Stopped polling events for resource {}", self.resource);
    }

    /// One fetch plus delivery; false when the task must stop
    async fn cycle(&mut self) -> bool {
        if self.cancel.is_cancelled() || self.events.is_closed() || self.errors.is_closed() {
            return false;
        }

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            fetched = self.manager.fetch_page(&self.resource, &self.sync) => fetched,
        };

        match fetched {
            Ok(page) => self.deliver(page).await,
            Err(e) => {
                tracing::warn!("Polling events for resource {} failed: {}", self.resource, e);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => false,
                    sent = self.errors.send(e) => sent.is_ok(),
                }
            }
        }
    }

    async fn deliver(&mut self, page: EventsPage) -> bool {
        if page.expired {
            tracing::warn!(
                "Sync token for resource {} expired, continuing with a fresh one",
                self.resource
            );
        }

        let token = page.sync_token();
        for event in page.data {
            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                sent = self.events.send(event) => sent,
            };
            if sent.is_err() {
                return false;
            }
        }

        if let Some(token) = token {
            self.sync = token.into_inner();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AsanaClient;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(5);

    /// Answers with the scripted responses in order, repeating the last one
    struct Script {
        calls: AtomicUsize,
        responses: Vec<ResponseTemplate>,
    }

    impl Script {
        fn new(responses: Vec<ResponseTemplate>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses,
            }
        }
    }

    impl Respond for Script {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let index = call.min(self.responses.len() - 1);
            self.responses[index].clone()
        }
    }

    fn manager(server: &MockServer) -> EventManager {
        EventManager::new(AsanaClient::with_base_url("test-token", server.uri()).unwrap())
    }

    fn event(gid: &str) -> serde_json::Value {
        json!({"action": "changed", "resource": {"gid": gid, "resource_type": "task"}})
    }

    async fn next_gid(poller: &mut Poller) -> String {
        let event = tokio::time::timeout(WAIT, poller.events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        event.resource.map(|r| r.gid).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_poll_delivers_events_in_order_across_cycles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(query_param_is_missing("sync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [event("e1"), event("e2")], "sync": "s1", "has_more": false
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(query_param("sync", "s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [event("e3")], "sync": "s2", "has_more": false
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(query_param("sync", "s2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [], "sync": "s2"})),
            )
            .mount(&server)
            .await;

        let mut poller = manager(&server).poll("123", "", Duration::from_millis(10));
        assert_eq!(next_gid(&mut poller).await, "e1");
        assert_eq!(next_gid(&mut poller).await, "e2");
        assert_eq!(next_gid(&mut poller).await, "e3");
        poller.shutdown().await;
    }

    #[tokio::test]
    async fn test_poll_reports_errors_and_keeps_going() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(Script::new(vec![
                ResponseTemplate::new(500).set_body_json(json!({"errors": [{"message": "Server Error"}]})),
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": [event("after-error")], "sync": "s1"})),
                ResponseTemplate::new(200).set_body_json(json!({"data": [], "sync": "s1"})),
            ]))
            .mount(&server)
            .await;

        let mut poller = manager(&server).poll("123", "s0", Duration::from_millis(10));

        let err = tokio::time::timeout(WAIT, poller.errors.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(err.to_string(), "API error (500): Server Error");
        assert_eq!(next_gid(&mut poller).await, "after-error");

        poller.shutdown().await;
    }

    #[tokio::test]
    async fn test_expired_cursor_is_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("sync", "stale"))
            .respond_with(
                ResponseTemplate::new(412).set_body_json(json!({"data": [], "sync": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("sync", "fresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [event("new")], "sync": "fresh"})),
            )
            .mount(&server)
            .await;

        let mut poller = manager(&server).poll("123", "stale", Duration::from_millis(10));
        assert_eq!(next_gid(&mut poller).await, "new");
        assert!(poller.errors.try_recv().is_err());
        poller.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancel_closes_both_channels() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "sync": "s1"})))
            .mount(&server)
            .await;

        let mut poller = manager(&server).poll("123", "", Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        poller.cancel();

        let closed = tokio::time::timeout(WAIT, poller.events.recv()).await.unwrap();
        assert!(closed.is_none());
        let closed = tokio::time::timeout(WAIT, poller.errors.recv()).await.unwrap();
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_blocked_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [event("1"), event("2"), event("3")], "sync": "s1"
            })))
            .mount(&server)
            .await;

        let poller = manager(&server).poll("123", "", Duration::from_millis(10));
        // Nobody reads: the task sits on the second send until cancelled
        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::time::timeout(WAIT, poller.shutdown())
            .await
            .expect("poller did not stop");
    }
}
