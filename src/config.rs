use crate::api::practicum::{ClientOptions, Credentials};
use crate::api::storage::DEFAULT_COOKIE_DIR;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Config {
    pub account: AccountConfig,
    pub client: ClientConfig,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AccountConfig {
    pub login: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_file: Option<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        AccountConfig {
            login: "user".to_string(),
            password: "secret".to_string(),
            dump_file: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClientConfig {
    pub cookie_dir: String,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            cookie_dir: DEFAULT_COOKIE_DIR.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.account.login, &self.account.password)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            cookie_dir: PathBuf::from(&self.client.cookie_dir),
            dump_file: self.account.dump_file.clone(),
            ..ClientOptions::default()
        }
    }

    /// 无法识别的日志级别按 info 处理
    pub fn log_level(&self) -> LevelFilter {
        self.client.log_level.parse().unwrap_or(LevelFilter::INFO)
    }
}

pub async fn load_config(path: &str) -> Result<Config> {
    let config_contents = tokio::fs::read_to_string(path).await?;
    let config: Config = toml::from_str(&config_contents)?;
    Ok(config)
}

pub async fn save_config(path: &str, config: &Config) -> Result<()> {
    let config_contents = toml::to_string_pretty(config)?;
    tokio::fs::write(path, config_contents).await?;
    Ok(())
}
