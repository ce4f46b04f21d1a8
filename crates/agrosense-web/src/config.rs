//! Server configuration, loaded from a TOML file with environment overrides.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Optional `HTTP-Referer` / `X-Title` attribution headers.
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            referer: None,
            title: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "z-ai/glm-4.5-air:free".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

impl Config {
    /// Load from the file named by `AGROSENSE_CONFIG` (default
    /// `agrosense.toml`). A missing file means defaults. `PORT` overrides
    /// the configured port either way.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var("AGROSENSE_CONFIG").unwrap_or_else(|_| "agrosense.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw)?
        } else {
            tracing::debug!("no config file at {}, using defaults", path);
            Config::default()
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse()?;
        }

        Ok(config)
    }
}
