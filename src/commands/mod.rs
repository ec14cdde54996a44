pub mod events;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod webhooks;
pub mod workspaces;

use asana::{Event, EventFilter};

use crate::cli::Commands;
use crate::config::Settings;
use crate::utils::logging::{log_command, log_filtered};
use crate::utils::AppResult;

/// Runs one parsed command against the configured API
pub async fn run(command: Commands, settings: &Settings) -> AppResult<()> {
    log_command(command.name());

    match command {
        Commands::Task(cmd) => tasks::run(cmd, settings.client()?).await,
        Commands::Project(cmd) => projects::run(cmd, settings.client()?).await,
        Commands::Workspace(cmd) => workspaces::run(cmd, settings.client()?).await,
        Commands::User(cmd) => users::run(cmd, settings.client()?).await,
        Commands::Webhook(cmd) => webhooks::run(cmd, settings).await,
        Commands::Events(cmd) => events::run(cmd, settings).await,
    }
}

/// Compiles `-f` when given; a blank expression counts as absent
pub(crate) fn compile_filter(expression: Option<&str>) -> AppResult<Option<EventFilter>> {
    match expression.map(str::trim).filter(|e| !e.is_empty()) {
        Some(expression) => Ok(Some(EventFilter::compile(expression)?)),
        None => Ok(None),
    }
}

pub(crate) fn filter_events(filter: Option<&EventFilter>, events: Vec<Event>) -> Vec<Event> {
    match filter {
        Some(filter) => {
            let total = events.len();
            let kept = filter.apply(events);
            log_filtered(kept.len(), total);
            kept
        }
        None => events,
    }
}
