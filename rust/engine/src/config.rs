use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::betting::BettingMode;
use crate::player::DEFAULT_TIME_BANK_SECS;
use crate::variant::Variant;

/// Rules a table plays under. Changes only apply from the next hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub variant: Variant,
    pub betting_mode: BettingMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub table_id: String,
    pub small_blind: u64,
    pub big_blind: u64,
    pub time_bank_secs: u32,
    /// Seeds the engine's randomness; `None` draws from the OS.
    pub seed: Option<u64>,
    pub engine: EngineConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_id: "table-1".into(),
            small_blind: 5,
            big_blind: 10,
            time_bank_secs: DEFAULT_TIME_BANK_SECS,
            seed: None,
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl TableConfig {
    pub fn new(table_id: impl Into<String>, small_blind: u64, big_blind: u64) -> Self {
        Self {
            table_id: table_id.into(),
            small_blind,
            big_blind,
            ..Self::default()
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.engine.variant = variant;
        self
    }

    pub fn with_betting_mode(mut self, mode: BettingMode) -> Self {
        self.engine.betting_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses a TOML table config. Keys left out keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let f: FileConfig = toml::from_str(s)?;
        let mut cfg = Self::default();
        if let Some(v) = f.table_id {
            cfg.table_id = v;
        }
        if let Some(v) = f.small_blind {
            cfg.small_blind = v;
        }
        if let Some(v) = f.big_blind {
            cfg.big_blind = v;
        }
        if let Some(v) = f.time_bank_secs {
            cfg.time_bank_secs = v;
        }
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
        }
        if let Some(v) = f.variant {
            cfg.engine.variant = v
                .parse()
                .map_err(ConfigError::Invalid)?;
        }
        if let Some(v) = f.betting_mode {
            cfg.engine.betting_mode = v
                .parse()
                .map_err(ConfigError::Invalid)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_id.trim().is_empty() {
            return Err(ConfigError::Invalid("table_id must not be empty".into()));
        }
        if self.small_blind == 0 || self.big_blind == 0 {
            return Err(ConfigError::Invalid("blinds must be >0".into()));
        }
        if self.small_blind > self.big_blind {
            return Err(ConfigError::Invalid(
                "small_blind must not exceed big_blind".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    table_id: Option<String>,
    #[serde(default)]
    small_blind: Option<u64>,
    #[serde(default)]
    big_blind: Option<u64>,
    #[serde(default)]
    time_bank_secs: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    variant: Option<String>,
    #[serde(default)]
    betting_mode: Option<String>,
}
