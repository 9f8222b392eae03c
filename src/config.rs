//! Application configuration.
//!
//! The configuration is loaded from a JSON file at
//! `$XDG_CONFIG_HOME/edgetile/config.json`.  The schema is split into a
//! `"tiling"` section (geometry thresholds and minimum tile sizes) and a
//! `"timing"` section (cooldowns, deferred-check delays and retry budgets).
//!
//! # Example
//!
//! ```json
//! {
//!   "tiling": {
//!     "edge_threshold": 10,
//!     "top_threshold": 10,
//!     "min_tile_width": 300,
//!     "min_tile_height": 200
//!   },
//!   "timing": {
//!     "swap_cooldown_ms": 500,
//!     "verify_retries": 5
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Zone detection and tile size limits.
    #[serde(default)]
    pub tiling: TilingConfig,

    /// Cooldowns, deferred-check delays and retry budgets.
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Zone detection and tile size limits, in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Distance from a side edge within which a drag targets that side.
    pub edge_threshold: i32,
    /// Distance from the top edge within which a drag targets fullscreen.
    pub top_threshold: i32,
    /// Smallest width a full tile may be resized to.
    pub min_tile_width: i32,
    /// Smallest height a quarter tile may be resized to.
    pub min_tile_height: i32,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 10,
            top_threshold: 10,
            min_tile_width: 300,
            min_tile_height: 200,
        }
    }
}

/// Timing of deferred work.
///
/// All durations are in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long a resize pair ignores its own echoed size changes after a
    /// propagated write.
    pub resize_guard_ms: u64,
    /// Delay between the end of a resize gesture and the settle pass.
    pub settle_delay_ms: u64,
    /// Settle corrections attempted before falling back to a retile.
    pub settle_retries: u32,
    /// Delay before re-reading geometry after a quarter split.
    pub verify_delay_ms: u64,
    /// Split corrections attempted before the final unchecked write.
    pub verify_retries: u32,
    /// Minimum time between two swaps involving the same window.
    pub swap_cooldown_ms: u64,
    /// Pointer poll interval while a drag is active.
    pub drag_poll_ms: u64,
    /// Delay before the source workspace is retiled after a migration.
    pub retile_delay_ms: u64,
    /// Duration handed to the motion system for tile animations.
    pub animation_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            resize_guard_ms: 50,
            settle_delay_ms: 100,
            settle_retries: 3,
            verify_delay_ms: 50,
            verify_retries: 5,
            swap_cooldown_ms: 500,
            drag_poll_ms: 50,
            retile_delay_ms: 100,
            animation_ms: 250,
        }
    }
}

impl TimingConfig {
    pub fn resize_guard(&self) -> Duration {
        Duration::from_millis(self.resize_guard_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    pub fn swap_cooldown(&self) -> Duration {
        Duration::from_millis(self.swap_cooldown_ms)
    }

    pub fn drag_poll(&self) -> Duration {
        Duration::from_millis(self.drag_poll_ms)
    }

    pub fn retile_delay(&self) -> Duration {
        Duration::from_millis(self.retile_delay_ms)
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "tiling": {
                "edge_threshold": 4,
                "top_threshold": 6,
                "min_tile_width": 400,
                "min_tile_height": 250
            },
            "timing": {
                "resize_guard_ms": 20,
                "settle_delay_ms": 80,
                "settle_retries": 2,
                "verify_delay_ms": 30,
                "verify_retries": 7,
                "swap_cooldown_ms": 750,
                "drag_poll_ms": 16,
                "retile_delay_ms": 200,
                "animation_ms": 0
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.tiling.edge_threshold, 4);
        assert_eq!(cfg.tiling.top_threshold, 6);
        assert_eq!(cfg.tiling.min_tile_width, 400);
        assert_eq!(cfg.tiling.min_tile_height, 250);
        assert_eq!(cfg.timing.swap_cooldown(), Duration::from_millis(750));
        assert_eq!(cfg.timing.verify_retries, 7);
        assert_eq!(cfg.timing.drag_poll_ms, 16);
        assert_eq!(cfg.timing.animation_ms, 0);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        let td = TilingConfig::default();
        assert_eq!(cfg.tiling.edge_threshold, td.edge_threshold);
        assert_eq!(cfg.tiling.min_tile_width, td.min_tile_width);
        assert_eq!(cfg.tiling.min_tile_height, td.min_tile_height);
        let md = TimingConfig::default();
        assert_eq!(cfg.timing.swap_cooldown_ms, md.swap_cooldown_ms);
        assert_eq!(cfg.timing.settle_retries, md.settle_retries);
    }

    #[test]
    fn default_swap_cooldown_is_half_a_second() {
        assert_eq!(
            TimingConfig::default().swap_cooldown(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn deserialize_partial_timing() {
        let json = r#"{ "timing": { "verify_delay_ms": 10 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.timing.verify_delay_ms, 10);
        assert_eq!(cfg.timing.verify_retries, TimingConfig::default().verify_retries);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "tiling": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("edgetile-no-such-config.json");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("config error:"));
    }
}
