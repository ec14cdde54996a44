use std::future::Future;

use asana::{Event, EventBatch, EventFilter, EventManager, Poller};

use super::{compile_filter, filter_events};
use crate::cli::EventsCommand;
use crate::config::Settings;
use crate::output::{format_sync, print_json, print_text};
use crate::utils::logging::{
    log_poll_error, log_shutdown_requested, log_sync_expired, log_sync_initialized,
};
use crate::utils::{parse_duration, AppError, AppResult};

pub async fn run(command: EventsCommand, settings: &Settings) -> AppResult<()> {
    let manager = EventManager::new(settings.client()?);

    match command {
        EventsCommand::Get { gid, sync, filter } => {
            let filter = compile_filter(filter.as_deref())?;
            let batch = fetch(&manager, &gid, sync.as_deref().unwrap_or(""), filter.as_ref()).await?;
            print_json(&batch)
        }
        EventsCommand::Sync { gid } => {
            let batch = refresh(&manager, &gid).await?;
            print_text(&format_sync(&batch))?;
            eprintln!(
                "Use it with: asana events get --gid {} --sync {}",
                gid, batch.sync
            );
            Ok(())
        }
        EventsCommand::Poll {
            gid,
            sync,
            interval,
            filter,
        } => {
            let filter = compile_filter(filter.as_deref())?;
            let interval = match interval {
                Some(text) => parse_duration(&text)?,
                None => settings.poll_interval()?,
            };
            if interval.is_zero() {
                return Err(AppError::Validation(
                    "poll interval must be greater than zero".to_string(),
                ));
            }

            let sync = match sync.filter(|s| !s.is_empty()) {
                Some(sync) => sync,
                None => {
                    eprintln!("No sync token given, fetching one for resource {}...", gid);
                    let batch = refresh(&manager, &gid).await?;
                    eprintln!(
                        "Got sync token {} ({} event(s) in current state)",
                        batch.sync,
                        batch.events.len()
                    );
                    batch.sync.into_inner()
                }
            };

            eprintln!("Polling events for {} every {:?}, Ctrl+C to stop", gid, interval);

            let poller = manager.poll(gid.as_str(), sync, interval);
            forward(poller, &gid, filter.as_ref(), shutdown_signal(), |event| {
                print_json(event)
            })
            .await
        }
    }
}

/// `events get`: every event since `sync`, narrowed by the filter
async fn fetch(
    manager: &EventManager,
    resource: &str,
    sync: &str,
    filter: Option<&EventFilter>,
) -> AppResult<EventBatch> {
    let mut batch = manager.get_events(resource, sync).await?;
    if batch.expired && !sync.is_empty() {
        log_sync_expired(resource);
    }
    batch.events = filter_events(filter, batch.events);
    Ok(batch)
}

/// Fresh token for `resource` plus the backlog that came with it
async fn refresh(manager: &EventManager, resource: &str) -> AppResult<EventBatch> {
    let page = manager.initialize_sync(resource).await?;
    let sync = page.sync_token().unwrap_or_default();
    log_sync_initialized(resource, page.data.len());

    Ok(EventBatch {
        events: page.data,
        sync,
        expired: page.expired,
    })
}

/// Hands polled events to `sink` until `shutdown` resolves or the poller stops
///
/// Poll errors are logged and polling continues. The poller is shut down
/// before returning, including when `sink` fails.
async fn forward<S, F>(
    mut poller: Poller,
    resource: &str,
    filter: Option<&EventFilter>,
    shutdown: S,
    mut sink: F,
) -> AppResult<()>
where
    S: Future<Output = ()>,
    F: FnMut(&Event) -> AppResult<()>,
{
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                log_shutdown_requested();
                break Ok(());
            }
            event = poller.events.recv() => match event {
                Some(event) => {
                    if filter.map_or(true, |f| f.matches(&event)) {
                        if let Err(e) = sink(&event) {
                            break Err(e);
                        }
                    }
                }
                None => break Ok(()),
            },
            error = poller.errors.recv() => match error {
                Some(error) => log_poll_error(resource, &error.to_string()),
                None => break Ok(()),
            },
        }
    };

    poller.shutdown().await;
    result
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::debug!("received Ctrl+C"),
        _ = terminate => tracing::debug!("received SIGTERM"),
    }
}
