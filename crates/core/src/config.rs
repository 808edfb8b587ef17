use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::generation::VariationStrategy;
use crate::messages::ControllerMode;
use crate::Settings;

/// Configuration manager for chuloopa settings
/// Keeps the schema, its validation and the persisted values apart. Settings
/// are stored in chuloopa.json in the working directory by default
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

/// Available configuration options with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub files: FilesConfigSchema,
    pub generation: GenerationConfigSchema,
    pub watcher: WatcherConfigSchema,
    pub osc: OscConfigSchema,
    pub backend: BackendConfigSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfigSchema {
    pub file_suffix: ConfigOption<String>,
    pub in_place: ConfigOption<bool>,
    pub backup_original: ConfigOption<bool>,
    pub clear_variations_on_track_cleared: ConfigOption<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfigSchema {
    pub strategy: ConfigOption<VariationStrategy>,
    pub mode: ConfigOption<ControllerMode>,
    pub initial_spice: ConfigOption<f32>,
    pub variations_per_pass: ConfigOption<u32>,
    pub max_stored_variations: ConfigOption<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfigSchema {
    pub debounce_ms: ConfigOption<u64>,
    pub settle_delay_ms: ConfigOption<u64>,
    pub poll_interval_ms: ConfigOption<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscConfigSchema {
    pub osc_enabled: ConfigOption<bool>,
    pub osc_listen_port: ConfigOption<u16>,
    pub osc_send_port: ConfigOption<u16>,
    pub osc_address_prefix: ConfigOption<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfigSchema {
    pub gemini_model: ConfigOption<String>,
    pub api_key_env: ConfigOption<String>,
    pub temperature: ConfigOption<f32>,
    pub backend_timeout_secs: ConfigOption<u64>,
}

/// Configuration option with validation and available choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOption<T> {
    pub default: T,
    pub valid_range: Option<(T, T)>,
    pub valid_choices: Option<Vec<T>>,
    pub description: String,
    pub requires_restart: bool,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    errors: &mut Vec<String>,
    name: &str,
    option: &ConfigOption<T>,
    value: &T,
) {
    if let Some((min, max)) = &option.valid_range {
        if value < min || value > max {
            errors.push(format!("{} must be between {} and {}", name, min, max));
        }
    }
}

impl ConfigManager {
    /// Create a new configuration manager
    /// If no path is provided, defaults to 'chuloopa.json' in the current working directory
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("chuloopa.json"));

        Self {
            config_path,
            settings: Settings::default(),
        }
    }

    /// Load settings from configuration file
    /// Writes and returns default settings if the file doesn't exist
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}. Using defaults for new settings.",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        Self::validate_settings(&config_file.settings).map_err(ConfigError::ValidationError)?;

        self.settings = config_file.settings;
        Ok(self.settings.clone())
    }

    /// Save current settings to configuration file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        let created_at = self.existing_created_at().unwrap_or_else(|| now.clone());

        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at,
            modified_at: now,
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    fn existing_created_at(&self) -> Option<String> {
        let content = fs::read_to_string(&self.config_path).ok()?;
        let existing: ConfigFile = serde_json::from_str(&content).ok()?;
        Some(existing.created_at)
    }

    /// Update settings and save to file
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        Self::validate_settings(&settings).map_err(ConfigError::ValidationError)?;
        self.settings = settings;
        self.save()
    }

    /// Get current settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get configuration schema with available options
    pub fn schema() -> ConfigSchema {
        let defaults = Settings::default();

        ConfigSchema {
            files: FilesConfigSchema {
                file_suffix: ConfigOption {
                    default: defaults.file_suffix,
                    valid_range: None,
                    valid_choices: None,
                    description: "Suffix that marks a file as a drum pattern".to_string(),
                    requires_restart: true,
                },
                in_place: ConfigOption {
                    default: defaults.in_place,
                    valid_range: None,
                    valid_choices: None,
                    description: "Overwrite the source pattern instead of writing variation files"
                        .to_string(),
                    requires_restart: false,
                },
                backup_original: ConfigOption {
                    default: defaults.backup_original,
                    valid_range: None,
                    valid_choices: None,
                    description: "Copy the source to <file>.backup before the first pass"
                        .to_string(),
                    requires_restart: false,
                },
                clear_variations_on_track_cleared: ConfigOption {
                    default: defaults.clear_variations_on_track_cleared,
                    valid_range: None,
                    valid_choices: None,
                    description: "Delete stored variations when the looper clears its track"
                        .to_string(),
                    requires_restart: false,
                },
            },
            generation: GenerationConfigSchema {
                strategy: ConfigOption {
                    default: defaults.strategy,
                    valid_range: None,
                    valid_choices: Some(VariationStrategy::ALL.to_vec()),
                    description: "How variations are produced".to_string(),
                    requires_restart: false,
                },
                mode: ConfigOption {
                    default: defaults.mode,
                    valid_range: None,
                    valid_choices: Some(vec![ControllerMode::Autonomous, ControllerMode::Mediated]),
                    description: "Whether file changes start generation on their own".to_string(),
                    requires_restart: true,
                },
                initial_spice: ConfigOption {
                    default: defaults.initial_spice,
                    valid_range: Some((0.0, 1.0)),
                    valid_choices: None,
                    description: "Variation intensity used until the looper sends one".to_string(),
                    requires_restart: true,
                },
                variations_per_pass: ConfigOption {
                    default: defaults.variations_per_pass,
                    valid_range: Some((1, 16)),
                    valid_choices: None,
                    description: "Variation files written by each generation pass".to_string(),
                    requires_restart: false,
                },
                max_stored_variations: ConfigOption {
                    default: defaults.max_stored_variations,
                    valid_range: Some((1, 64)),
                    valid_choices: None,
                    description: "Variation slots per track before the oldest is overwritten"
                        .to_string(),
                    requires_restart: false,
                },
            },
            watcher: WatcherConfigSchema {
                debounce_ms: ConfigOption {
                    default: defaults.debounce_ms,
                    valid_range: Some((0, 60_000)),
                    valid_choices: None,
                    description: "Ignore repeated changes to one file within this window"
                        .to_string(),
                    requires_restart: true,
                },
                settle_delay_ms: ConfigOption {
                    default: defaults.settle_delay_ms,
                    valid_range: Some((0, 10_000)),
                    valid_choices: None,
                    description: "Wait after a change before reading the file".to_string(),
                    requires_restart: true,
                },
                poll_interval_ms: ConfigOption {
                    default: defaults.poll_interval_ms,
                    valid_range: Some((10, 10_000)),
                    valid_choices: None,
                    description: "How often the track directory is scanned".to_string(),
                    requires_restart: true,
                },
            },
            osc: OscConfigSchema {
                osc_enabled: ConfigOption {
                    default: defaults.osc_enabled,
                    valid_range: None,
                    valid_choices: None,
                    description: "Listen for and send OSC control messages".to_string(),
                    requires_restart: true,
                },
                osc_listen_port: ConfigOption {
                    default: defaults.osc_listen_port,
                    valid_range: Some((1024, 65535)),
                    valid_choices: None,
                    description: "UDP port for incoming control messages".to_string(),
                    requires_restart: true,
                },
                osc_send_port: ConfigOption {
                    default: defaults.osc_send_port,
                    valid_range: Some((1024, 65535)),
                    valid_choices: None,
                    description: "UDP port the looper listens on".to_string(),
                    requires_restart: true,
                },
                osc_address_prefix: ConfigOption {
                    default: defaults.osc_address_prefix,
                    valid_range: None,
                    valid_choices: None,
                    description: "Address prefix shared by all control messages".to_string(),
                    requires_restart: true,
                },
            },
            backend: BackendConfigSchema {
                gemini_model: ConfigOption {
                    default: defaults.gemini_model,
                    valid_range: None,
                    valid_choices: None,
                    description: "Gemini model used by the generative strategy".to_string(),
                    requires_restart: true,
                },
                api_key_env: ConfigOption {
                    default: defaults.api_key_env,
                    valid_range: None,
                    valid_choices: None,
                    description: "Environment variable holding the API key".to_string(),
                    requires_restart: true,
                },
                temperature: ConfigOption {
                    default: defaults.temperature,
                    valid_range: Some((0.0, 1.0)),
                    valid_choices: None,
                    description: "Sampling temperature for the generative backend".to_string(),
                    requires_restart: false,
                },
                backend_timeout_secs: ConfigOption {
                    default: defaults.backend_timeout_secs,
                    valid_range: Some((1, 600)),
                    valid_choices: None,
                    description: "Seconds before a backend call counts as failed".to_string(),
                    requires_restart: false,
                },
            },
        }
    }

    /// Validate settings against schema
    pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let schema = Self::schema();

        // Files
        if settings.file_suffix.is_empty() {
            errors.push("file_suffix must not be empty".to_string());
        }
        if settings.tracked_file.as_os_str().is_empty() {
            errors.push("tracked_file must not be empty".to_string());
        }

        // Generation
        if let Some(choices) = &schema.generation.strategy.valid_choices {
            if !choices.contains(&settings.strategy) {
                errors.push(format!("strategy must be one of: {:?}", choices));
            }
        }
        check_range(
            &mut errors,
            "initial_spice",
            &schema.generation.initial_spice,
            &settings.initial_spice,
        );
        check_range(
            &mut errors,
            "variations_per_pass",
            &schema.generation.variations_per_pass,
            &settings.variations_per_pass,
        );
        check_range(
            &mut errors,
            "max_stored_variations",
            &schema.generation.max_stored_variations,
            &settings.max_stored_variations,
        );
        if settings.variations_per_pass > settings.max_stored_variations {
            errors.push("variations_per_pass must not exceed max_stored_variations".to_string());
        }

        // Watcher
        check_range(
            &mut errors,
            "debounce_ms",
            &schema.watcher.debounce_ms,
            &settings.debounce_ms,
        );
        check_range(
            &mut errors,
            "settle_delay_ms",
            &schema.watcher.settle_delay_ms,
            &settings.settle_delay_ms,
        );
        check_range(
            &mut errors,
            "poll_interval_ms",
            &schema.watcher.poll_interval_ms,
            &settings.poll_interval_ms,
        );

        // OSC
        check_range(
            &mut errors,
            "osc_listen_port",
            &schema.osc.osc_listen_port,
            &settings.osc_listen_port,
        );
        check_range(
            &mut errors,
            "osc_send_port",
            &schema.osc.osc_send_port,
            &settings.osc_send_port,
        );
        if !settings.osc_address_prefix.starts_with('/') {
            errors.push("osc_address_prefix must start with '/'".to_string());
        }

        // Backend
        check_range(
            &mut errors,
            "temperature",
            &schema.backend.temperature,
            &settings.temperature,
        );
        check_range(
            &mut errors,
            "backend_timeout_secs",
            &schema.backend.backend_timeout_secs,
            &settings.backend_timeout_secs,
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Reset settings to defaults
    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.settings = Settings::default();
        self.save()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    ReadError(String),
    WriteError(String),
    ParseError(String),
    SerializeError(String),
    ValidationError(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "Failed to read config file: {}", msg),
            ConfigError::WriteError(msg) => write!(f, "Failed to write config file: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config file: {}", msg),
            ConfigError::SerializeError(msg) => write!(f, "Failed to serialize config: {}", msg),
            ConfigError::ValidationError(errors) => {
                write!(f, "Config validation errors: {}", errors.join(", "))
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_config_manager_new() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let manager = ConfigManager::new(Some(config_path.clone()));
        assert_eq!(manager.config_path(), config_path);
        assert_eq!(manager.settings(), &Settings::default());
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("chuloopa.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));
        let settings = manager.load().unwrap();

        assert_eq!(settings, Settings::default());
        assert!(config_path.exists());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));

        let mut settings = Settings::default();
        settings.strategy = VariationStrategy::Densify;
        settings.mode = ControllerMode::Mediated;
        settings.osc_send_port = 6001;
        settings.rng_seed = Some(42);

        manager.update_settings(settings.clone()).unwrap();

        // Load into new manager
        let mut manager2 = ConfigManager::new(Some(config_path));
        let loaded_settings = manager2.load().unwrap();

        assert_eq!(loaded_settings, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.json");
        fs::write(
            &config_path,
            r#"{
                "version": "0.0.0",
                "settings": { "strategy": "gemini", "debounce_ms": 500 },
                "created_at": "2025-01-01T00:00:00Z",
                "modified_at": "2025-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new(Some(config_path));
        let settings = manager.load().unwrap();

        assert_eq!(settings.strategy, VariationStrategy::Generative);
        assert_eq!(settings.debounce_ms, 500);
        assert_eq!(settings.osc_listen_port, 5000);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.json");
        fs::write(
            &config_path,
            r#"{
                "version": "0.0.0",
                "settings": { "strategy": "wobble" },
                "created_at": "",
                "modified_at": ""
            }"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new(Some(config_path));
        assert!(matches!(manager.load(), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_created_at_survives_save() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("stamps.json");
        fs::write(
            &config_path,
            r#"{
                "version": "0.0.0",
                "settings": {},
                "created_at": "2025-01-01T00:00:00Z",
                "modified_at": "2025-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new(Some(config_path.clone()));
        manager.load().unwrap();
        manager.reset_to_defaults().unwrap();

        let saved: ConfigFile =
            serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(saved.created_at, "2025-01-01T00:00:00Z");
        assert_ne!(saved.modified_at, "2025-01-01T00:00:00Z");
        assert_eq!(saved.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();

        // Valid settings should pass
        assert!(ConfigManager::validate_settings(&settings).is_ok());

        settings.initial_spice = 1.5;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        settings.initial_spice = 0.5;
        settings.osc_listen_port = 80;
        settings.temperature = 2.0;
        let errors = ConfigManager::validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);

        let mut settings = Settings::default();
        settings.variations_per_pass = 4;
        settings.max_stored_variations = 3;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.osc_address_prefix = "chuloopa/".to_string();
        assert!(ConfigManager::validate_settings(&settings).is_err());
    }

    #[test]
    fn test_update_rejects_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new(Some(temp_dir.path().join("c.json")));

        let mut settings = Settings::default();
        settings.poll_interval_ms = 0;
        assert!(matches!(
            manager.update_settings(settings),
            Err(ConfigError::ValidationError(_))
        ));
        assert_eq!(manager.settings(), &Settings::default());
    }

    #[test]
    fn test_schema_completeness() {
        let schema = ConfigManager::schema();

        assert_eq!(schema.generation.strategy.default, VariationStrategy::Generative);
        assert_eq!(schema.osc.osc_listen_port.default, 5000);
        assert_eq!(schema.osc.osc_send_port.default, 5001);
        assert!(!schema.backend.gemini_model.description.is_empty());
        assert!(schema.watcher.debounce_ms.valid_range.is_some());
    }
}
