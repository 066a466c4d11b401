//! Bot configuration stored in `tithe.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::data::{SeedKind, default_patch_names};
use crate::core::layout::{DEFAULT_PATCHES, clamp_patch_count};
use crate::farm::FarmSettings;
use crate::io::executor::{DEFAULT_PROXIMITY, ExecutorConfig};
use crate::io::wait::WaitConfig;
use crate::looping::LoopConfig;
use crate::step::StepConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tithe.toml";

/// Bot configuration (TOML).
///
/// Missing fields take their defaults, so an empty file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    /// Working-set size. Values outside `1..=20` are clamped with a warning.
    pub patches: usize,

    pub seed: SeedKind,

    /// Entity name fragments that identify farm patches.
    pub patch_names: Vec<String>,

    pub timing: TimingConfig,

    pub executor: ExecutorSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum time between two ticks.
    pub tick_interval_ms: u64,

    /// Skip traversal when no game tick arrived for this long. Unset disables
    /// stall detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stall_timeout_ms: Option<u64>,

    /// Ceiling for the delay after consecutive leaf failures.
    pub backoff_max_ms: u64,

    /// Idle heartbeat while crops grow.
    pub cooldown_ms: u64,

    /// Stop after this many ticks. Unset runs until stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 600,
            stall_timeout_ms: None,
            backoff_max_ms: 5_000,
            cooldown_ms: 5_000,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorSection {
    /// Walk toward targets farther than this many tiles.
    pub proximity: f64,

    /// Post-interaction selection wait.
    pub wait_timeout_ms: u64,
    pub poll_ms: u64,
    pub max_poll_ms: u64,

    /// How long a leaf waits for its action to show up in the game.
    pub leaf_wait_ms: u64,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            proximity: DEFAULT_PROXIMITY,
            wait_timeout_ms: 1_000,
            poll_ms: 100,
            max_poll_ms: 400,
            leaf_wait_ms: 5_000,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            patches: DEFAULT_PATCHES,
            seed: SeedKind::default(),
            patch_names: default_patch_names(),
            timing: TimingConfig::default(),
            executor: ExecutorSection::default(),
        }
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.patch_names.is_empty() || self.patch_names.iter().any(|n| n.trim().is_empty()) {
            return Err(anyhow!("patch_names must be a non-empty array of names"));
        }
        let timing = &self.timing;
        if timing.tick_interval_ms == 0 {
            return Err(anyhow!("timing.tick_interval_ms must be > 0"));
        }
        if timing.stall_timeout_ms == Some(0) {
            return Err(anyhow!("timing.stall_timeout_ms must be > 0 when set"));
        }
        if timing.backoff_max_ms < timing.tick_interval_ms {
            return Err(anyhow!(
                "timing.backoff_max_ms must be >= timing.tick_interval_ms"
            ));
        }
        if timing.cooldown_ms == 0 {
            return Err(anyhow!("timing.cooldown_ms must be > 0"));
        }
        let executor = &self.executor;
        if !executor.proximity.is_finite() || executor.proximity <= 0.0 {
            return Err(anyhow!("executor.proximity must be a positive number"));
        }
        if executor.wait_timeout_ms == 0 || executor.poll_ms == 0 || executor.leaf_wait_ms == 0 {
            return Err(anyhow!(
                "executor.wait_timeout_ms, poll_ms and leaf_wait_ms must be > 0"
            ));
        }
        if executor.max_poll_ms < executor.poll_ms {
            return Err(anyhow!("executor.max_poll_ms must be >= executor.poll_ms"));
        }
        Ok(())
    }

    /// Working-set size after clamping.
    pub fn patch_count(&self) -> usize {
        clamp_patch_count(self.patches)
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            tick_interval: Duration::from_millis(self.timing.tick_interval_ms),
            backoff_max: Duration::from_millis(self.timing.backoff_max_ms),
            max_ticks: self.timing.max_ticks,
            step: StepConfig {
                stall_timeout: self.timing.stall_timeout_ms.map(Duration::from_millis),
            },
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            proximity: self.executor.proximity,
            wait: WaitConfig::new(
                Duration::from_millis(self.executor.wait_timeout_ms),
                Duration::from_millis(self.executor.poll_ms),
                Duration::from_millis(self.executor.max_poll_ms),
            ),
        }
    }

    pub fn farm_settings(&self) -> FarmSettings {
        FarmSettings {
            seed: self.seed,
            cooldown: Duration::from_millis(self.timing.cooldown_ms),
            leaf_wait: Duration::from_millis(self.executor.leaf_wait_ms),
            patch_names: self.patch_names.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BotConfig::default()`.
pub fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        let cfg = BotConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BotConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &BotConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ConfigDir;

    #[test]
    fn load_missing_returns_default() {
        let dir = ConfigDir::new().expect("dir");
        let cfg = load_config(&dir.config_path()).expect("load");
        assert_eq!(cfg, BotConfig::default());
        assert_eq!(cfg.patch_count(), 16);
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = ConfigDir::new().expect("dir");
        let cfg = BotConfig {
            patches: 20,
            seed: SeedKind::Logavano,
            timing: TimingConfig {
                stall_timeout_ms: Some(3_000),
                max_ticks: Some(10),
                ..TimingConfig::default()
            },
            ..BotConfig::default()
        };
        let path = dir.write(&cfg).expect("write");
        assert_eq!(load_config(&path).expect("load"), cfg);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = ConfigDir::new().expect("dir");
        let path = dir
            .write_raw("seed = \"bologano\"\n\n[timing]\ntick_interval_ms = 300\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.seed, SeedKind::Bologano);
        assert_eq!(cfg.timing.tick_interval_ms, 300);
        assert_eq!(cfg.timing.cooldown_ms, 5_000);
        assert_eq!(cfg.patch_names, default_patch_names());
    }

    #[test]
    fn out_of_range_patches_are_clamped_not_rejected() {
        let cfg = BotConfig {
            patches: 0,
            ..BotConfig::default()
        };
        cfg.validate().expect("valid");
        assert_eq!(cfg.patch_count(), 1);
        let cfg = BotConfig {
            patches: 64,
            ..BotConfig::default()
        };
        assert_eq!(cfg.patch_count(), 20);
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let dir = ConfigDir::new().expect("dir");
        let path = dir
            .write_raw("[timing]\ntick_interval_ms = 0\n")
            .expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("tick_interval_ms must be > 0"));

        let cfg = BotConfig {
            executor: ExecutorSection {
                poll_ms: 0,
                ..ExecutorSection::default()
            },
            ..BotConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_seed_fails_to_parse() {
        let dir = ConfigDir::new().expect("dir");
        let path = dir.write_raw("seed = \"potato\"\n").expect("write");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn conversions_carry_durations() {
        let cfg = BotConfig::default();
        let loop_config = cfg.loop_config();
        assert_eq!(loop_config.tick_interval, Duration::from_millis(600));
        assert_eq!(loop_config.step.stall_timeout, None);
        assert_eq!(cfg.executor_config(), ExecutorConfig::default());
        assert_eq!(cfg.farm_settings(), FarmSettings::default());
    }
}
