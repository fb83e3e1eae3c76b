use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const CONFIG_FILE: &str = "reconlab.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_api_host")]
    pub api_host: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Origins allowed by CORS, in addition to the API's own address.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_simulation_delay_ms")]
    pub simulation_delay_ms: u64,

    /// Wait between the termination signal and the forced kill, and again after it.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    #[serde(default)]
    pub dirsearch: DirsearchConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirsearchConfig {
    #[serde(default = "default_dirsearch_dir")]
    pub install_dir: PathBuf,

    #[serde(default = "default_wordlist")]
    pub wordlist: PathBuf,

    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub deepseek_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}
fn default_api_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}
fn default_simulation_delay_ms() -> u64 {
    2000
}
fn default_kill_grace_ms() -> u64 {
    5000
}
fn default_dirsearch_dir() -> PathBuf {
    PathBuf::from("/opt/dirsearch")
}
fn default_wordlist() -> PathBuf {
    PathBuf::from("/usr/share/wordlists/dirb/common.txt")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            api_port: default_api_port(),
            cors_origins: default_cors_origins(),
            simulation_delay_ms: default_simulation_delay_ms(),
            kill_grace_ms: default_kill_grace_ms(),
            dirsearch: DirsearchConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Default for DirsearchConfig {
    fn default() -> Self {
        Self {
            install_dir: default_dirsearch_dir(),
            wordlist: default_wordlist(),
            output_dir: None,
        }
    }
}

impl DirsearchConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.install_dir.join("outputs"))
    }
}

impl ChatConfig {
    /// Environment keys win over file keys.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let pick = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        if let Some(key) = pick("OPENROUTER_API_KEY") {
            self.openrouter_api_key = Some(key);
        }
        if let Some(key) = pick("DEEPSEEK_API_KEY") {
            self.deepseek_api_key = Some(key);
        }
        if let Some(key) = pick("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
    }

    pub fn key_for(&self, provider: &str) -> Option<&str> {
        match provider {
            "openrouter" => self.openrouter_api_key.as_deref(),
            "deepseek" => self.deepseek_api_key.as_deref(),
            "openai" => self.openai_api_key.as_deref(),
            _ => None,
        }
    }
}

impl GatewayConfig {
    pub async fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let config_path = data_dir.as_ref().join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .with_context(|| format!("reading {}", config_path.display()))?;
            toml::from_str::<GatewayConfig>(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?
        } else {
            info!("No {} found, using defaults.", CONFIG_FILE);
            Self::default()
        };
        config.chat.apply_env(|var| std::env::var(var).ok());

        info!(
            "Loaded gateway config: api={}:{}, dirsearch={}, kill_grace={}ms",
            config.api_host,
            config.api_port,
            config.dirsearch.install_dir.display(),
            config.kill_grace_ms
        );
        Ok(config)
    }

    pub fn simulation_delay(&self) -> Duration {
        Duration::from_millis(self.simulation_delay_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}
