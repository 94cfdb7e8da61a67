//! Player configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use splice_core::{Result, SpliceError};

/// Settings for opening a device and running the playback engine.
///
/// `None` for the rate or channel count means "whatever the device
/// prefers".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output device name. `"default"` picks the host's default output.
    pub device: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    /// Device frames rendered per playback cycle.
    pub period_frames: usize,
    /// Device buffer capacity in frames.
    pub buffer_frames: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            device: "default".into(),
            sample_rate: Some(48_000),
            channels: Some(2),
            period_frames: 1024,
            buffer_frames: 4096,
        }
    }
}

impl PlayerConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SpliceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SpliceError::Config(e.to_string()))
    }

    /// Reject settings no device could satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.period_frames == 0 {
            return Err(SpliceError::Config("period_frames must be positive".into()));
        }
        if self.buffer_frames < self.period_frames {
            return Err(SpliceError::Config(format!(
                "buffer_frames ({}) must hold at least one period ({})",
                self.buffer_frames, self.period_frames
            )));
        }
        if self.sample_rate == Some(0) {
            return Err(SpliceError::Config("sample_rate must be positive".into()));
        }
        if self.channels == Some(0) {
            return Err(SpliceError::Config("channels must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.device, "default");
        assert_eq!(cfg.sample_rate, Some(48_000));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg = PlayerConfig::from_json_str(r#"{ "channels": null, "period_frames": 256 }"#).unwrap();
        assert_eq!(cfg.channels, None);
        assert_eq!(cfg.period_frames, 256);
        assert_eq!(cfg.buffer_frames, 4096);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            PlayerConfig::from_json_str(r#"{ "period_frames": 0 }"#),
            Err(SpliceError::Config(_))
        ));
        assert!(PlayerConfig::from_json_str(r#"{ "period_frames": 8192 }"#).is_err());
        assert!(PlayerConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_round_trip_through_json() {
        let cfg = PlayerConfig {
            device: "hw:1".into(),
            sample_rate: None,
            ..Default::default()
        };
        let json = cfg.to_json_string().unwrap();
        assert_eq!(PlayerConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            PlayerConfig::from_json_file("/nonexistent/splice.json"),
            Err(SpliceError::Io(_))
        ));
    }
}
