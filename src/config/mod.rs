//! Configuration management for Kasool

pub mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::claude::ClaudeModel;
use crate::progress::ProgressPolicy;
use crate::quiz::QuizFallback;

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Interface and content language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Arabic
    #[default]
    #[serde(rename = "ar")]
    Arabic,
    /// French
    #[serde(rename = "fr")]
    French,
}

impl Language {
    /// Short code used in config files and on the command line
    pub fn code(&self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::French => "fr",
        }
    }

    /// Name of the language, used when instructing the generation service
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::Arabic => "Arabic",
            Self::French => "French",
        }
    }

    /// Parse a language code
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ar" | "arabic" => Some(Self::Arabic),
            "fr" | "french" | "français" => Some(Self::French),
            _ => None,
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown language: {}. Options: ar, fr", s))
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content language for prompts, labels and the assistant
    pub language: Language,

    /// Model used for quiz generation and the assistant
    pub model: ClaudeModel,

    /// Upper bound on a single generation request, in seconds
    pub request_timeout_secs: u64,

    /// External catalog file; the built-in catalog is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Progress accounting constants
    pub progress: ProgressPolicy,

    /// What to do when a generated quiz cannot be understood
    pub quiz_fallback: QuizFallback,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::default(),
            model: ClaudeModel::default(),
            request_timeout_secs: 30,
            catalog_path: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            progress: ProgressPolicy::default(),
            quiz_fallback: QuizFallback::default(),
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "kasool").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "kasool").context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Get the progress store path
    pub fn progress_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("progress.json"))
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_arabic() {
        let config = Config::default();
        assert_eq!(config.language, Language::Arabic);
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn default_progress_policy_matches_portal_rules() {
        let config = Config::default();
        assert_eq!(config.progress.opened_marker, 5);
        assert_eq!(config.progress.quiz_bonus, 50);
        assert_eq!(config.progress.reading.interval_secs, 60);
    }

    #[test]
    fn config_serializes_language_code() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""language":"ar""#));
        assert!(!json.contains("catalog_path"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let json = r#"{"language":"fr","request_timeout_secs":10}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.language, Language::French);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.progress.quiz_bonus, 50);
        assert_eq!(config.quiz_fallback, QuizFallback::Error);
    }

    #[test]
    fn zero_timeout_is_floored() {
        let config = Config { request_timeout_secs: 0, ..Default::default() };
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn language_parse() {
        assert_eq!(Language::parse("AR"), Some(Language::Arabic));
        assert_eq!(Language::parse("fr"), Some(Language::French));
        assert_eq!(Language::parse("en"), None);
    }

    #[test]
    fn language_code_matches_config_value() {
        for language in [Language::Arabic, Language::French] {
            assert_eq!(Language::parse(language.code()), Some(language));
            let json = serde_json::to_string(&language).unwrap();
            assert_eq!(json, format!("\"{}\"", language.code()));
        }
    }
}
