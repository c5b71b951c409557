//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::rewrite::error::{RewriteError, RewriteResult};

/// Tunables of the rewrite engine. Never part of the synchronized settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineOptions {
    pub debounce_ms: u64,
    pub batch_size: usize,
    pub min_text_length: usize,
    pub max_words: usize,
    pub regex_size_limit: usize,
    pub fallback_replacement: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            debounce_ms: constants::DEBOUNCE.as_millis() as u64,
            batch_size: constants::BATCH_SIZE,
            min_text_length: constants::MIN_TEXT_LENGTH,
            max_words: constants::MAX_WORDS,
            regex_size_limit: constants::REGEX_SIZE_LIMIT,
            fallback_replacement: constants::DEFAULT_REPLACEMENT.to_string(),
        }
    }
}

impl EngineOptions {
    /// 验证配置
    pub fn validate(&self) -> RewriteResult<()> {
        if self.batch_size == 0 {
            return Err(RewriteError::Config("batch_size must be greater than 0".to_string()));
        }

        if self.max_words == 0 {
            return Err(RewriteError::Config("max_words must be greater than 0".to_string()));
        }

        if self.fallback_replacement.trim().is_empty() {
            return Err(RewriteError::Config(
                "fallback_replacement must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{engine, EnvVar};

        if let Ok(debounce) = engine::DebounceMs::get() {
            self.debounce_ms = debounce;
        }

        if let Ok(batch_size) = engine::BatchSize::get() {
            self.batch_size = batch_size;
        }

        if let Ok(min_len) = engine::MinTextLength::get() {
            self.min_text_length = min_len;
        }

        if let Ok(max_words) = engine::MaxWords::get() {
            self.max_words = max_words;
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    options: EngineOptions,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> RewriteResult<Self> {
        let mut options = Self::load_options()?;
        options.apply_env_overrides();
        options.validate()?;

        Ok(Self { options })
    }

    /// 从指定文件创建
    pub fn from_file(path: &str) -> RewriteResult<Self> {
        let mut options = Self::load_from_file(path)?;
        options.apply_env_overrides();
        options.validate()?;

        Ok(Self { options })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn into_options(self) -> EngineOptions {
        self.options
    }

    fn load_options() -> RewriteResult<EngineOptions> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("loading engine options from {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::debug!("no options file found, using defaults");
        Ok(EngineOptions::default())
    }

    fn load_from_file(path: &str) -> RewriteResult<EngineOptions> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RewriteError::Config(format!("failed to read {}: {}", path, e)))?;

        if path.ends_with(".toml") {
            Ok(toml::from_str(&content)?)
        } else {
            serde_json::from_str(&content)
                .map_err(|e| RewriteError::Config(format!("failed to parse {}: {}", path, e)))
        }
    }
}
