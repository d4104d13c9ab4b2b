use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub ai_model: AiModelConfig,
    pub crew: CrewConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiModelConfig {
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for AiModelConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.1".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            timeout_secs: 600,
        }
    }
}

impl AiModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CrewConfig {
    /// Echo each agent's output to stdout as soon as its task finishes.
    pub verbose: bool,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self { verbose: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub results_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_file: PathBuf::from("output/teacher_assistant_results.txt"),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load the config file if present, fall back to defaults otherwise,
    /// then apply `OLLAMA_ENDPOINT` / `OLLAMA_MODEL` from the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_overrides(
            std::env::var("OLLAMA_ENDPOINT").ok(),
            std::env::var("OLLAMA_MODEL").ok(),
        );

        Ok(config)
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, model: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.ai_model.endpoint = endpoint;
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.ai_model.model = model;
        }
    }

    /// Check that the model backend is usable before any agent runs.
    pub fn validate(&self) -> Result<()> {
        let ai = &self.ai_model;

        if !ai.provider.eq_ignore_ascii_case("ollama") {
            anyhow::bail!("Unsupported AI provider '{}' (only 'ollama' is available)", ai.provider);
        }
        if ai.model.trim().is_empty() {
            anyhow::bail!("No model configured. Set [ai_model].model or OLLAMA_MODEL");
        }
        if !(ai.endpoint.starts_with("http://") || ai.endpoint.starts_with("https://")) {
            anyhow::bail!("Invalid Ollama endpoint '{}': expected an http(s) URL", ai.endpoint);
        }
        if ai.timeout_secs == 0 {
            anyhow::bail!("[ai_model].timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parsing() {
        let toml_str = r#"
            [ai_model]
            provider = "ollama"
            model = "mistral"
            endpoint = "http://gpu-box:11434"
            temperature = 0.4
            top_p = 0.8
            timeout_secs = 120

            [crew]
            verbose = false

            [output]
            results_file = "./results/plan.txt"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ai_model.model, "mistral");
        assert_eq!(config.ai_model.timeout(), Duration::from_secs(120));
        assert!(!config.crew.verbose);
        assert_eq!(config.output.results_file, PathBuf::from("./results/plan.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[ai_model]\nmodel = \"phi3\"\n").unwrap();
        assert_eq!(config.ai_model.model, "phi3");
        assert_eq!(config.ai_model.endpoint, "http://localhost:11434");
        assert!(config.crew.verbose);
        assert_eq!(
            config.output.results_file,
            PathBuf::from("output/teacher_assistant_results.txt")
        );
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ai_model.provider, "ollama");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://remote:11434".to_string()), Some(" ".to_string()));
        assert_eq!(config.ai_model.endpoint, "http://remote:11434");
        assert_eq!(config.ai_model.model, "llama3.1");
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.ai_model.endpoint = "localhost:11434".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ai_model.model = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ai_model.provider = "openai".to_string();
        assert!(config.validate().is_err());
    }
}
