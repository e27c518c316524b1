use auth_identity::IdentityConfig;
use config_engine::{ConfigEngine, ConfigError, ConfigSource, ConfigValidator};
use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables read by [`TrackerConfig::load`]
pub const ENV_PREFIX: &str = "TRACKER_";

pub const WIKI_CONTENT_ADDED: &str = "wiki_content_added";
pub const WIKI_CONTENT_UPDATED: &str = "wiki_content_updated";

/// Events that can be switched on in `notified_events`
pub const KNOWN_EVENTS: [&str; 9] = [
    "issue_added",
    "issue_updated",
    "news_added",
    "document_added",
    "file_added",
    "message_posted",
    WIKI_CONTENT_ADDED,
    WIKI_CONTENT_UPDATED,
    "time_entry_added",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub notified_events: Vec<String>,
    /// Journals rewritten per batch when a user is deleted
    pub user_deletion_batch_size: usize,
    pub principal_search_page_limit: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            notified_events: vec![
                "issue_added".to_string(),
                "issue_updated".to_string(),
                WIKI_CONTENT_ADDED.to_string(),
                WIKI_CONTENT_UPDATED.to_string(),
            ],
            user_deletion_batch_size: 1000,
            principal_search_page_limit: 10,
        }
    }
}

impl TrackerSettings {
    pub fn notifies(&self, event: &str) -> bool {
        self.notified_events.iter().any(|e| e == event)
    }
}

/// Complete configuration of a tracker deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub identity: IdentityConfig,
    pub logging: LoggerConfig,
    pub tracker: TrackerSettings,
}

impl TrackerConfig {
    /// Defaults, then the optional TOML file, then `TRACKER_*` variables
    pub fn load(path: Option<&Path>) -> config_engine::Result<Self> {
        let mut engine = ConfigEngine::new();
        if let Some(path) = path {
            engine = engine.add_source(ConfigSource::toml(path));
        }
        engine
            .add_source(ConfigSource::env(ENV_PREFIX))
            .extract_validated()
    }
}

impl ConfigValidator for TrackerConfig {
    fn validate(&self) -> config_engine::Result<()> {
        if self.tracker.user_deletion_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "tracker.user_deletion_batch_size must be positive".to_string(),
            ));
        }
        if self.tracker.principal_search_page_limit == 0 {
            return Err(ConfigError::ValidationError(
                "tracker.principal_search_page_limit must be positive".to_string(),
            ));
        }
        if let Some(unknown) = self
            .tracker
            .notified_events
            .iter()
            .find(|e| !KNOWN_EVENTS.contains(&e.as_str()))
        {
            return Err(ConfigError::ValidationError(format!(
                "unknown notified event: {}",
                unknown
            )));
        }
        if self.identity.password_min_length == 0 {
            return Err(ConfigError::ValidationError(
                "identity.password_min_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
