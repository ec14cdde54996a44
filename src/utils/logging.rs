use tracing::{debug, error, info, warn};

pub fn log_config_loaded(run_mode: &str, base_url: &str) {
    debug!("Configuration loaded for run mode {} (API: {})", run_mode, base_url);
}

pub fn log_command(command: &str) {
    debug!("Running command: {}", command);
}

pub fn log_sync_initialized(resource: &str, backlog: usize) {
    info!("Sync token initialized for {} ({} event(s) in current state)", resource, backlog);
}

pub fn log_sync_expired(resource: &str) {
    warn!(
        "Sync token for {} was invalid or too old; a fresh one was issued and earlier events may be missing",
        resource
    );
}

pub fn log_poll_error(resource: &str, error: &str) {
    warn!("Error polling events for {}: {}", resource, error);
}

pub fn log_shutdown_requested() {
    info!("Shutdown requested, stopping poller");
}

pub fn log_filtered(kept: usize, total: usize) {
    debug!("Filter kept {} of {} event(s)", kept, total);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}
