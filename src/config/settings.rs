use crate::utils::{parse_duration, AppError, AppResult};
use asana::client::DEFAULT_BASE_URL;
use asana::AsanaClient;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub asana: AsanaSettings,
    pub events: EventsSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AsanaSettings {
    #[serde(default)]
    pub token: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EventsSettings {
    /// Humanized, e.g. `5s`
    pub poll_interval: String,
}

/// Values given on the command line; they win over every other source
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub token: Option<String>,
    pub base_url: Option<String>,
}

impl Settings {
    /// Loads settings from, in increasing priority:
    /// built-in defaults, `config/default`, `config/<RUN_MODE>`,
    /// `ASANA_CLI__*` variables, `ASANA_PERSONAL_ACCESS_TOKEN`, CLI flags
    pub fn new(overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let run_mode = Self::run_mode();

        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("ASANA_CLI").separator("__"));

        if let Ok(token) = std::env::var("ASANA_PERSONAL_ACCESS_TOKEN") {
            if !token.is_empty() {
                builder = builder.set_override("asana.token", token)?;
            }
        }

        Self::finish(builder, overrides)
    }

    pub fn run_mode() -> String {
        std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into())
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("asana.base_url", DEFAULT_BASE_URL)?
            .set_default("asana.timeout_secs", 30)?
            .set_default("events.poll_interval", "5s")
    }

    fn finish(
        mut builder: ConfigBuilder<DefaultState>,
        overrides: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        if let Some(token) = overrides.token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.set_override("asana.token", token)?;
        }
        if let Some(base_url) = overrides.base_url.as_deref().filter(|u| !u.is_empty()) {
            builder = builder.set_override("asana.base_url", base_url)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Builds the API client; fails when no token was configured anywhere
    pub fn client(&self) -> AppResult<AsanaClient> {
        let token = self
            .asana
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(AppError::MissingToken)?;

        Ok(AsanaClient::with_timeouts(
            token,
            self.asana.base_url.as_str(),
            self.asana.timeout_secs,
            5,
        )?)
    }

    /// Default interval of `events poll`
    pub fn poll_interval(&self) -> AppResult<Duration> {
        parse_duration(&self.events.poll_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(builder: ConfigBuilder<DefaultState>, overrides: CliOverrides) -> Settings {
        Settings::finish(builder, &overrides).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = load(Settings::defaults().unwrap(), CliOverrides::default());
        assert_eq!(settings.asana.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.asana.timeout_secs, 30);
        assert_eq!(settings.asana.token, None);
        assert_eq!(settings.poll_interval().unwrap(), Duration::from_secs(5));
        assert!(matches!(settings.client(), Err(AppError::MissingToken)));
    }

    #[test]
    fn test_cli_overrides_win() {
        let builder = Settings::defaults()
            .unwrap()
            .set_override("asana.token", "from-file")
            .unwrap();
        let settings = load(
            builder,
            CliOverrides {
                token: Some("from-flag".into()),
                base_url: Some("http://localhost:9999".into()),
            },
        );
        assert_eq!(settings.asana.token.as_deref(), Some("from-flag"));

        let client = settings.client().unwrap();
        assert_eq!(client.token(), "from-flag");
        assert_eq!(client.base_url(), "http://localhost:9999");
    }

    #[test]
    fn test_empty_override_keeps_lower_source() {
        let builder = Settings::defaults()
            .unwrap()
            .set_override("asana.token", "from-env")
            .unwrap();
        let settings = load(
            builder,
            CliOverrides {
                token: Some(String::new()),
                base_url: None,
            },
        );
        assert_eq!(settings.asana.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_bad_poll_interval() {
        let builder = Settings::defaults()
            .unwrap()
            .set_override("events.poll_interval", "soon")
            .unwrap();
        let settings = load(builder, CliOverrides::default());
        assert!(matches!(settings.poll_interval(), Err(AppError::Validation(_))));
    }
}
