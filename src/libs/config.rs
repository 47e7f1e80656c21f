//! Configuration management for tickethours.
//!
//! Settings are stored as pretty-printed JSON (`config.json`) in the
//! platform data directory resolved by [`DataStorage`]. A missing file is
//! not an error: the defaults describe a single-project setup where
//! authenticated users may view and add hours.
//!
//! ```rust,no_run
//! use tickethours::libs::config::Config;
//!
//! let config = Config::read()?;
//! println!("Reporting on {}", config.project_name);
//! # Ok::<(), tickethours::libs::error::HoursError>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::error::Result;
use crate::libs::messages::Message;
use crate::libs::permission::{Capability, Permissions};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};

/// Configuration file name used for storing application settings.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Session id / user name of unauthenticated callers.
pub const ANONYMOUS: &str = "anonymous";

/// Capability grants, resolved per user.
///
/// A user listed under `users` gets exactly those capabilities; any other
/// authenticated user falls back to `authenticated`, and `anonymous` applies
/// to callers without an identity.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PermissionConfig {
    pub anonymous: Vec<Capability>,
    pub authenticated: Vec<Capability>,
    #[serde(default)]
    pub users: BTreeMap<String, Vec<Capability>>,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        PermissionConfig {
            anonymous: vec![Capability::TicketView, Capability::TicketViewHours],
            authenticated: vec![Capability::TicketView, Capability::TicketViewHours, Capability::TicketAddHours],
            users: BTreeMap::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Shown in report titles and CSV headers.
    pub project_name: String,

    /// Absolute URL of the tracker, used for feed links and GUIDs.
    pub base_url: String,

    /// Ticket query applied when a report request carries no constraints.
    pub default_query: String,

    /// Lifetime of the session-cached ticket list, in seconds.
    pub query_cache_ttl: u64,

    /// Include child tickets (ticket relations) in per-ticket sums.
    #[serde(default)]
    pub relations: bool,

    /// Identity used by the CLI when `--user` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,

    #[serde(default)]
    pub permissions: PermissionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project_name: "My Project".to_string(),
            base_url: "http://localhost/tracker".to_string(),
            default_query: "status!=bogus".to_string(),
            query_cache_ttl: 3600,
            relations: false,
            default_user: None,
            permissions: PermissionConfig::default(),
        }
    }
}

impl Config {
    /// Reads configuration from the default data directory.
    pub fn read() -> Result<Config> {
        Self::read_from(&DataStorage::new())
    }

    /// Reads configuration from `storage`, falling back to defaults when the
    /// file does not exist yet.
    pub fn read_from(storage: &DataStorage) -> Result<Config> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&DataStorage::new())
    }

    pub fn save_to(&self, storage: &DataStorage) -> Result<()> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// How long a session's cached ticket list stays valid.
    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.query_cache_ttl)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::hours(1))
    }

    /// Capabilities of `user`; `None` means the caller is anonymous.
    pub fn permissions_for(&self, user: Option<&str>) -> Permissions {
        match user {
            None | Some(ANONYMOUS) => Permissions::new(self.permissions.anonymous.iter().copied()),
            Some(name) => match self.permissions.users.get(name) {
                Some(caps) => Permissions::new(caps.iter().copied()),
                None => Permissions::new(self.permissions.authenticated.iter().copied()),
            },
        }
    }

    /// Runs the interactive setup wizard, starting from the current values.
    pub fn init() -> anyhow::Result<Config> {
        let current = Config::read()?;
        let theme = ColorfulTheme::default();

        let project_name: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptProjectName.to_string())
            .default(current.project_name.clone())
            .interact_text()?;
        let base_url: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptBaseUrl.to_string())
            .default(current.base_url.clone())
            .interact_text()?;
        let default_user: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptDefaultUser.to_string())
            .default(current.default_user.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        let default_query: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptDefaultQuery.to_string())
            .default(current.default_query.clone())
            .interact_text()?;
        let query_cache_ttl: u64 = Input::with_theme(&theme)
            .with_prompt(Message::PromptCacheTtl.to_string())
            .default(current.query_cache_ttl)
            .interact_text()?;
        let relations = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptRelations.to_string())
            .default(current.relations)
            .interact()?;

        Ok(Config {
            project_name,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_query,
            query_cache_ttl,
            relations,
            default_user: Some(default_user).filter(|u| !u.trim().is_empty()),
            permissions: current.permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_users_get_exact_grants() {
        let mut config = Config::default();
        config.permissions.users.insert("boss".to_string(), vec![Capability::TracAdmin]);

        assert!(config.permissions_for(Some("boss")).has(Capability::TracAdmin));
        assert!(config.permissions_for(Some("joe")).has(Capability::TicketAddHours));
        assert!(!config.permissions_for(Some("joe")).has(Capability::TracAdmin));
        assert!(!config.permissions_for(None).has(Capability::TicketAddHours));
        assert!(!config.permissions_for(Some(ANONYMOUS)).has(Capability::TicketAddHours));
    }

    #[test]
    fn save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DataStorage::at(dir.path());
        assert_eq!(Config::read_from(&storage).unwrap(), Config::default());

        let mut config = Config::default();
        config.project_name = "Widgets".to_string();
        config.relations = true;
        config.save_to(&storage).unwrap();

        let read = Config::read_from(&storage).unwrap();
        assert_eq!(read.project_name, "Widgets");
        assert!(read.relations);
    }

    #[test]
    fn unrepresentable_cache_ttl_falls_back_to_an_hour() {
        let mut config = Config::default();
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(1));

        config.query_cache_ttl = 90;
        assert_eq!(config.cache_ttl(), chrono::Duration::seconds(90));

        config.query_cache_ttl = u64::MAX;
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(1));
        config.query_cache_ttl = i64::MAX as u64;
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(1));
    }
}
