//! Session tuning knobs

use crate::error::{Error, Result};
use questflow_core::Tick;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Timing parameters for one session
///
/// Every field has a default, so a RON document only needs the fields it
/// changes:
///
/// ```
/// use questflow_session::SessionConfig;
///
/// let config = SessionConfig::from_ron("(ticks_in_game: 30)").unwrap();
/// assert_eq!(config.ticks_in_game, 30);
/// assert_eq!(config.chest_window_ticks, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Length of a game in ticks
    pub ticks_in_game: Tick,
    /// Real-time length of one tick
    pub tick_period_ms: u64,
    /// Ticks the chest stays takeable after the key is taken
    pub chest_window_ticks: Tick,
    /// Ticks the tile overwrites stay applied
    pub tile_apply_ticks: Tick,
    /// Ticks the original tiles stay restored
    pub tile_restore_ticks: Tick,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ticks_in_game: 90,
            tick_period_ms: 1000,
            chest_window_ticks: 4,
            tile_apply_ticks: 4,
            tile_restore_ticks: 6,
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from RON
    pub fn from_ron(content: &str) -> Result<Self> {
        let config: SessionConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Real-time length of one tick
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Reject values a session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_period_ms == 0 {
            return Err(Error::InvalidConfig(
                "tick_period_ms must be positive".to_string(),
            ));
        }
        if self.ticks_in_game == 0 {
            return Err(Error::InvalidConfig(
                "ticks_in_game must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.ticks_in_game, 90);
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert_eq!(config.tile_apply_ticks, 4);
        assert_eq!(config.tile_restore_ticks, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_ron_fills_missing_fields() {
        let config = SessionConfig::from_ron("(tick_period_ms: 250)").unwrap();
        assert_eq!(config.tick_period(), Duration::from_millis(250));
        assert_eq!(config.ticks_in_game, 90);
    }

    #[test]
    fn test_rejects_zero_period() {
        let result = SessionConfig::from_ron("(tick_period_ms: 0)");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
