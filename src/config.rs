// Settings for the repository layer.
//
// Sources, later ones win:
// - built-in defaults
// - `time_entries.toml` in the working directory, when present
// - environment variables prefixed `TIME_ENTRIES_` (for example `TIME_ENTRIES_DEFAULT_PAGE_SIZE`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "time_entries.toml";
pub const ENV_PREFIX: &str = "TIME_ENTRIES_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] figment::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_container_id")]
    pub container_id: String,
    #[serde(default = "default_partition_key")]
    pub partition_key: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_latest_entries_limit")]
    pub latest_entries_limit: i64,
    /// Minutes, UTC minus local time.
    #[serde(default = "default_timezone_offset")]
    pub default_timezone_offset: i32,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_container_id() -> String {
    "time_entry".to_string()
}

fn default_partition_key() -> String {
    "tenant_id".to_string()
}

fn default_page_size() -> i64 {
    9999
}

fn default_latest_entries_limit() -> i64 {
    20
}

fn default_timezone_offset() -> i32 {
    300
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            container_id: default_container_id(),
            partition_key: default_partition_key(),
            default_page_size: default_page_size(),
            latest_entries_limit: default_latest_entries_limit(),
            default_timezone_offset: default_timezone_offset(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::figment().extract()?)
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[rstest]
    fn it_should_fall_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load().expect("load failed");
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.default_page_size, 9999);
            assert_eq!(settings.default_timezone_offset, 300);
            Ok(())
        });
    }

    #[rstest]
    fn it_should_let_the_file_and_environment_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                    container_id = "entries"
                    default_page_size = 50
                "#,
            )?;
            jail.set_env("TIME_ENTRIES_DEFAULT_PAGE_SIZE", "25");
            jail.set_env("TIME_ENTRIES_DEFAULT_TIMEZONE_OFFSET", "-60");
            let settings = Settings::load().expect("load failed");
            assert_eq!(settings.container_id, "entries");
            assert_eq!(settings.default_page_size, 25);
            assert_eq!(settings.default_timezone_offset, -60);
            assert_eq!(settings.latest_entries_limit, 20);
            Ok(())
        });
    }

    #[rstest]
    fn it_should_report_malformed_values() {
        Jail::expect_with(|jail| {
            jail.set_env("TIME_ENTRIES_DEFAULT_PAGE_SIZE", "many");
            let result = Settings::load();
            assert!(matches!(result, Err(ConfigError::Load(_))));
            Ok(())
        });
    }
}
