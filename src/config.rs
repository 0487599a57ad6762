use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub ephemeris: EphemerisConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_renderer_url")]
    pub url: String,
    #[serde(default = "default_renderer_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Largest image body accepted from the renderer.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            url: default_renderer_url(),
            timeout: default_renderer_timeout(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EphemerisConfig {
    /// Pins the ayanamsa in degrees instead of using the Lahiri model.
    #[serde(default)]
    pub fixed_ayanamsa: Option<f64>,
}

fn default_renderer_url() -> String {
    "https://vaultoftheheavens.com/VOTH_ChartCreator/BasicPrintout.aspx".to_string()
}

fn default_renderer_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_image_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            timeout: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_llm_timeout() -> Duration {
    Duration::from_secs(60)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    DeriveChart,
    RenderChart,
    GenerateReading,
}

impl Permission {
    pub const ALL: [Permission; 3] = [
        Permission::DeriveChart,
        Permission::RenderChart,
        Permission::GenerateReading,
    ];

    /// What the permission allows, phrased for refusal messages.
    pub fn action(self) -> &'static str {
        match self {
            Permission::DeriveChart => "derive chart parameters",
            Permission::RenderChart => "render chart images",
            Permission::GenerateReading => "request readings",
        }
    }
}

/// Accepts humantime strings such as `30s` or `1m 30s`.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Reads `path` when given, otherwise uses built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}
