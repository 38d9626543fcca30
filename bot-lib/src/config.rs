use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

#[serde_as]
#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct Config {
    /// The guild to register slash commands in. Registered globally if unset.
    pub guild_id: Option<u64>,
    /// Prefix for text commands, eg. `!school join harvard`
    #[serde(default = "get_default_prefix")]
    pub prefix: String,
    /// Replaces the body of `help` when set.
    pub help_text: Option<Arc<String>>,
    /// Where the guild settings are stored.
    #[serde(default = "get_default_db_path")]
    pub db_path: PathBuf,
    /// How long a member has to pick their school.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "get_default_selection_timeout")]
    pub selection_timeout: Duration,
    /// A school's channels are only created once this many members hold its role.
    #[serde(default)]
    pub min_members_for_group: usize,
    #[serde(default)]
    pub layout: GroupLayout,
    #[serde(default)]
    pub lookup: LookupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            guild_id: None,
            prefix: get_default_prefix(),
            help_text: None,
            db_path: get_default_db_path(),
            selection_timeout: get_default_selection_timeout(),
            min_members_for_group: 0,
            layout: GroupLayout::default(),
            lookup: LookupConfig::default(),
        }
    }
}

impl Config {
    /// Fetches the config from the config file in the root directory.
    pub fn create_from_file(config_path: impl AsRef<Path>) -> Result<Config> {
        let file = std::fs::read_to_string(config_path).wrap_err("Could not read config file")?;

        toml::from_str(&file).wrap_err("Could not parse config file")
    }

    /// Reloads the config file and updates the configuration.
    pub fn reload(&mut self, config_path: impl AsRef<Path>) {
        match Config::create_from_file(config_path) {
            Ok(config) => *self = config,
            Err(e) => tracing::error!("Keeping the old config: {:?}", e),
        }
    }
}

fn get_default_prefix() -> String {
    String::from("!")
}

fn get_default_db_path() -> PathBuf {
    PathBuf::from("schoolgate.db")
}

const fn get_default_selection_timeout() -> Duration {
    Duration::from_secs(30)
}

/// The channels created inside a school's own category.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    pub text_channels: Vec<String>,
    pub voice_channels: u8,
}

impl Default for GroupLayout {
    fn default() -> Self {
        Self {
            text_channels: vec![String::from("classroom")],
            voice_channels: 5,
        }
    }
}

/// Where the list of known schools comes from.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LookupConfig {
    /// A JSON file in the world universities format, read once on startup.
    Local { path: PathBuf },
    /// A world universities style API, queried as `{url}/search?name=...`
    Remote { url: String },
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig::Local {
            path: PathBuf::from("school_list.json"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_deserialize_properly() {
        let test_input = r#"
guild_id = 690552296983232554
prefix = "?"
selection_timeout = 45
min_members_for_group = 3

[layout]
text_channels = ["classroom", "homework"]
voice_channels = 2

[lookup]
source = "remote"
url = "http://universities.hipolabs.com"
"#;

        let config: Config = toml::from_str(test_input).unwrap();

        assert_eq!(
            config,
            Config {
                guild_id: Some(690552296983232554),
                prefix: "?".to_owned(),
                selection_timeout: Duration::from_secs(45),
                min_members_for_group: 3,
                layout: GroupLayout {
                    text_channels: vec!["classroom".to_owned(), "homework".to_owned()],
                    voice_channels: 2,
                },
                lookup: LookupConfig::Remote {
                    url: "http://universities.hipolabs.com".to_owned()
                },
                ..Default::default()
            }
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.selection_timeout, Duration::from_secs(30));
        assert_eq!(
            config.lookup,
            LookupConfig::Local {
                path: PathBuf::from("school_list.json")
            }
        );
    }

    #[test]
    fn local_lookup_needs_a_path() {
        let result = toml::from_str::<Config>("[lookup]\nsource = \"local\"\n");

        assert!(result.is_err());
    }
}
