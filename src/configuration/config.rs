#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiURL,
    ConfigFile,
    CustomerDomain,
    PollInterval,
    PollTimeout,
    RequestTimeout,
    SessionID,
    UserID,
}

impl ConfigKey {
    /// Keys holding a millisecond count.
    pub fn is_millis(&self) -> bool {
        return matches!(
            self,
            ConfigKey::PollInterval | ConfigKey::PollTimeout | ConfigKey::RequestTimeout
        );
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn duration(key: ConfigKey) -> Result<Duration> {
        let val = Config::get(key);
        if let Ok(millis) = val.parse::<u64>() {
            return Ok(Duration::from_millis(millis));
        }

        bail!(format!(
            "Config key '{key}' must be a number of milliseconds, got '{val}'"
        ));
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::UserID {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "anonymous".to_string();
            }

            return user;
        }

        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("crewchat/config.toml");

        let res = match key {
            ConfigKey::ApiURL => "http://127.0.0.1:8012",
            ConfigKey::CustomerDomain => "example.com",
            ConfigKey::PollInterval => "2000",
            ConfigKey::PollTimeout => "60000",
            ConfigKey::RequestTimeout => "10000",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
            ConfigKey::SessionID => "",
            ConfigKey::UserID => "",
        };

        return res.to_string();
    }

    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val_int) = val.as_integer() {
                        if key.is_millis() && val_int < 0 {
                            bail!(format!(
                                "config.toml has an invalid value for key '{key}': {val_int}\nValue must be a positive number of milliseconds."
                            ));
                        }
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if key.is_millis() && val_str.parse::<u64>().is_err() {
                            bail!(format!(
                                "config.toml has an invalid value for key '{key}': {val_str}\nValue must be a positive number of milliseconds."
                            ));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            api_url = Config::get(ConfigKey::ApiURL),
            user_id = Config::get(ConfigKey::UserID),
            session_id = Config::get(ConfigKey::SessionID),
            poll_interval = Config::get(ConfigKey::PollInterval),
            poll_timeout = Config::get(ConfigKey::PollTimeout),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::SessionID || key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::UserID {
                    return Some(
                        "# User id that owns your sessions. Defaults to $USER.\n# user-id = \"\""
                            .to_string(),
                    );
                }

                let key_str = key.to_string();
                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key_str.as_str()))?;

                let description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
