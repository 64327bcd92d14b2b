use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::quiz::SessionSettings;
use crate::source::sampler::{PoolSpec, default_pools};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Questions between ad breaks. 0 disables ads.
    #[serde(default = "default_ad_frequency")]
    pub ad_frequency: usize,
    #[serde(default = "default_session_duration_secs")]
    pub session_duration_secs: u32,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u32,
    /// Session length when no pools are configured.
    #[serde(default = "default_flat_count")]
    pub flat_count: usize,
    #[serde(default = "default_ai_question_count")]
    pub ai_question_count: usize,
    #[serde(default = "default_ad_dismiss_secs")]
    pub ad_dismiss_secs: u64,
    #[serde(default = "default_low_time_warning_secs")]
    pub low_time_warning_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_path: Option<String>,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default = "default_pools")]
    pub pools: Vec<PoolSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_theme() -> String {
    "detran".to_string()
}
fn default_ad_frequency() -> usize {
    10
}
fn default_session_duration_secs() -> u32 {
    40 * 60
}
fn default_pass_threshold() -> u32 {
    70
}
fn default_flat_count() -> usize {
    30
}
fn default_ai_question_count() -> usize {
    10
}
fn default_ad_dismiss_secs() -> u64 {
    5
}
fn default_low_time_warning_secs() -> u32 {
    5 * 60
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}
fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            ad_frequency: default_ad_frequency(),
            session_duration_secs: default_session_duration_secs(),
            pass_threshold: default_pass_threshold(),
            flat_count: default_flat_count(),
            ai_question_count: default_ai_question_count(),
            ad_dismiss_secs: default_ad_dismiss_secs(),
            low_time_warning_secs: default_low_time_warning_secs(),
            bank_path: None,
            generator: GeneratorConfig::default(),
            pools: default_pools(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("simulado")
            .join("config.toml")
    }

    /// Clamp values a hand-edited file can get wrong.
    pub fn normalize(&mut self) {
        if self.pass_threshold > 100 {
            warn!(value = self.pass_threshold, "pass_threshold above 100, clamping");
            self.pass_threshold = 100;
        }
        if self.session_duration_secs == 0 {
            warn!("session_duration_secs is zero, using default");
            self.session_duration_secs = default_session_duration_secs();
        }
        if self.ai_question_count == 0 {
            self.ai_question_count = default_ai_question_count();
        }
        if self.flat_count == 0 {
            self.flat_count = default_flat_count();
        }
        let before = self.pools.len();
        self.pools.retain(|p| !p.categories.is_empty());
        if self.pools.len() != before {
            warn!(dropped = before - self.pools.len(), "ignoring pools without categories");
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            ad_frequency: self.ad_frequency,
            duration_secs: self.session_duration_secs,
            pass_threshold: self.pass_threshold,
            ad_dismiss_after: Duration::from_secs(self.ad_dismiss_secs),
        }
    }

    pub fn standard_session_len(&self) -> usize {
        if self.pools.is_empty() {
            self.flat_count
        } else {
            self.pools.iter().map(|p| p.target).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.ad_frequency, 10);
        assert_eq!(config.session_duration_secs, 2400);
        assert_eq!(config.pass_threshold, 70);
        assert_eq!(config.pools.len(), 5);
        assert_eq!(config.standard_session_len(), 30);
        assert_eq!(config.generator.timeout_secs, 30);
        assert!(config.bank_path.is_none());
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
ad_frequency = 5
theme = "noite"

[generator]
model = "gemini-2.5-flash"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ad_frequency, 5);
        assert_eq!(config.theme, "noite");
        assert_eq!(config.generator.model, "gemini-2.5-flash");
        assert_eq!(config.generator.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.session_duration_secs, 2400);
    }

    #[test]
    fn test_config_custom_pools() {
        let toml_str = r#"
[[pools]]
name = "tudo"
categories = ["Legislação", "Mecânica"]
target = 8
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pools.len(), 1);
        assert_eq!(config.standard_session_len(), 8);
    }

    #[test]
    fn test_config_empty_pools_fall_back_to_flat_count() {
        let config: Config = toml::from_str("pools = []\nflat_count = 12").unwrap();
        assert_eq!(config.standard_session_len(), 12);
    }

    #[test]
    fn test_normalize_clamps_bad_values() {
        let mut config = Config::default();
        config.pass_threshold = 250;
        config.session_duration_secs = 0;
        config.ai_question_count = 0;
        config.pools.push(PoolSpec {
            name: "vazio".to_string(),
            categories: Vec::new(),
            target: 3,
        });
        config.normalize();
        assert_eq!(config.pass_threshold, 100);
        assert_eq!(config.session_duration_secs, 2400);
        assert_eq!(config.ai_question_count, 10);
        assert_eq!(config.pools.len(), 5);
    }

    #[test]
    fn test_config_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.ad_frequency = 5;
        config.bank_path = Some("/tmp/banco.json".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.ad_frequency, 5);
        assert_eq!(loaded.bank_path.as_deref(), Some("/tmp/banco.json"));
        assert_eq!(loaded.pools.len(), config.pools.len());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.theme, "detran");
    }

    #[test]
    fn test_session_settings_mirror_config() {
        let mut config = Config::default();
        config.ad_frequency = 5;
        config.ad_dismiss_secs = 3;
        let settings = config.session_settings();
        assert_eq!(settings.ad_frequency, 5);
        assert_eq!(settings.ad_dismiss_after, Duration::from_secs(3));
        assert_eq!(settings.duration_secs, 2400);
    }
}
