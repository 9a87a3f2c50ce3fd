use crate::agents::orchestrator::SavingsTable;
use crate::agents::router::{Category, RouterStrategy};
use crate::llm::{CallPolicy, ModelSettings};
use crate::log_debug;
use crate::providers::Provider;

use anyhow::{Context, Result, anyhow};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration structure for the Hagglz service
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Default LLM provider
    #[serde(default)]
    pub default_provider: Provider,
    /// Provider-specific model configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Routing, savings and per-step model settings
    #[serde(default)]
    pub negotiation: NegotiationConfig,
    /// LLM call limits
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Flag indicating if this config is from a project file
    #[serde(skip)]
    pub is_project_config: bool,
}

/// Provider-specific configuration structure.
///
/// API keys are deliberately absent: they are read from the provider
/// environment variables only.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Model used by the specialist steps
    #[serde(default)]
    pub model: String,
    /// Cheaper model used for bill classification
    pub classification_model: Option<String>,
}

impl ProviderConfig {
    pub fn default_for(provider: Provider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            classification_model: None,
        }
    }
}

/// Model override for one specialist step, keyed as `<category>.<step>`
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct StepOverride {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct NegotiationConfig {
    #[serde(default)]
    pub router: RouterStrategy,
    #[serde(default)]
    pub savings_table: SavingsTable,
    #[serde(default)]
    pub steps: HashMap<String, StepOverride>,
}

/// Performance and execution configuration
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PerformanceConfig {
    /// Timeout for a single LLM call in seconds
    #[serde(default = "default_llm_timeout_seconds")]
    pub llm_timeout_seconds: u64,
    /// Retries after a failed LLM call
    #[serde(default)]
    pub llm_max_retries: usize,
    /// Whether to enable verbose logging (includes HTTP requests/responses)
    #[serde(default)]
    pub verbose_logging: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            llm_timeout_seconds: default_llm_timeout_seconds(),
            llm_max_retries: 0,
            verbose_logging: false,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MemoryConfig {
    /// Negotiations scoring above this confidence are remembered
    #[serde(default = "default_store_threshold")]
    pub store_threshold: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            store_threshold: default_store_threshold(),
        }
    }
}

fn default_llm_timeout_seconds() -> u64 {
    60
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_store_threshold() -> f64 {
    0.7
}

/// Project configuration filename
pub const PROJECT_CONFIG_FILENAME: &str = ".hagglzconfig";

impl Config {
    /// Load the personal configuration, then merge the project file from the
    /// working directory on top
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;

        let project_dir = std::env::current_dir().context("Unable to determine working directory")?;
        match Self::load_project_config(&project_dir) {
            Ok(Some(project_config)) => config.merge_with_project_config(project_config),
            Ok(None) => {}
            Err(e) => log_debug!("Ignoring project configuration: {}", e),
        }

        log_debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults when it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    /// Load the project configuration in `dir`, if there is one
    pub fn load_project_config(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(PROJECT_CONFIG_FILENAME);
        if !config_path.exists() {
            return Ok(None);
        }

        let config_str = fs::read_to_string(&config_path)
            .map_err(|e| anyhow!("Failed to read project config file: {}", e))?;
        let mut config: Self = toml::from_str(&config_str).map_err(|e| {
            anyhow!(
                "Invalid project configuration file format: {}. Please check your {} file for syntax errors.",
                e,
                PROJECT_CONFIG_FILENAME
            )
        })?;

        config.is_project_config = true;
        Ok(Some(config))
    }

    /// Merge this config with project-specific config, with project config
    /// taking precedence wherever it differs from the defaults
    pub fn merge_with_project_config(&mut self, project_config: Self) {
        log_debug!("Merging with project configuration");
        let defaults = Self::default();

        if project_config.default_provider != defaults.default_provider {
            self.default_provider = project_config.default_provider;
        }

        for (provider, proj_provider_config) in project_config.providers {
            let entry = self.providers.entry(provider.clone()).or_insert_with(|| {
                provider
                    .parse::<Provider>()
                    .map(ProviderConfig::default_for)
                    .unwrap_or_default()
            });

            if !proj_provider_config.model.is_empty() {
                entry.model = proj_provider_config.model;
            }
            if proj_provider_config.classification_model.is_some() {
                entry.classification_model = proj_provider_config.classification_model;
            }
        }

        let negotiation = project_config.negotiation;
        if negotiation.router != defaults.negotiation.router {
            self.negotiation.router = negotiation.router;
        }
        if negotiation.savings_table != defaults.negotiation.savings_table {
            self.negotiation.savings_table = negotiation.savings_table;
        }
        self.negotiation.steps.extend(negotiation.steps);

        if project_config.performance != defaults.performance {
            self.performance = project_config.performance;
        }
        if project_config.server != defaults.server {
            self.server = project_config.server;
        }
        if project_config.memory != defaults.memory {
            self.memory = project_config.memory;
        }
    }

    /// Save the configuration to the personal config file
    pub fn save(&self) -> Result<()> {
        // Don't save project configs to personal config file
        if self.is_project_config {
            return Ok(());
        }

        let config_path = Self::get_config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, self.to_toml()?)?;
        log_debug!("Configuration saved: {:?}", self);
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let mut path =
            config_dir().ok_or_else(|| anyhow!("Unable to determine config directory"))?;
        path.push("hagglz");
        path.push("config.toml");
        Ok(path)
    }

    pub fn get_provider_config(&self, provider: Provider) -> Option<&ProviderConfig> {
        self.providers.get(provider.name())
    }

    /// Model used for generative steps on `provider`
    pub fn model_for(&self, provider: Provider) -> String {
        self.get_provider_config(provider)
            .map(|config| config.model.clone())
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    /// Settings for the LLM bill classifier
    pub fn classification_settings(&self) -> ModelSettings {
        let provider = self.default_provider;
        let model = self
            .get_provider_config(provider)
            .and_then(|config| config.classification_model.clone())
            .unwrap_or_else(|| provider.default_classification_model().to_string());
        ModelSettings::new(provider, model, 0.0)
    }

    /// Settings for one specialist step, applying any `<category>.<step>`
    /// override on top of the specialist defaults
    pub fn step_settings(
        &self,
        category: Category,
        step: &str,
        provider: Provider,
        temperature: f64,
    ) -> ModelSettings {
        let key = format!("{}.{}", category.as_ref().to_lowercase(), step);
        let step_override = self.negotiation.steps.get(&key);

        let provider = step_override
            .and_then(|o| o.provider)
            .unwrap_or(provider);
        let model = step_override
            .and_then(|o| o.model.clone())
            .unwrap_or_else(|| self.model_for(provider));
        let temperature = step_override
            .and_then(|o| o.temperature)
            .unwrap_or(temperature);

        ModelSettings::new(provider, model, temperature)
    }

    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_secs(self.performance.llm_timeout_seconds),
            max_retries: self.performance.llm_max_retries,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let providers = Provider::ALL
            .iter()
            .map(|provider| (provider.name().to_string(), ProviderConfig::default_for(*provider)))
            .collect();

        Self {
            default_provider: Provider::default(),
            providers,
            negotiation: NegotiationConfig::default(),
            performance: PerformanceConfig::default(),
            server: ServerConfig::default(),
            memory: MemoryConfig::default(),
            is_project_config: false,
        }
    }
}
