use crate::core_modules::pixel::pixel::HUE_SCALE;
use crate::pipeline::PipelineConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Everything the detector loop's initializer owns.
///
/// Every field has a default, so an empty TOML document (or no document at all)
/// yields the stock blue-can detector on camera 0.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub device_index: i32,
    #[serde(default = "default_key_wait_ms")]
    pub key_wait_ms: u64,
    #[serde(default = "default_preview")]
    pub preview: bool,
    #[serde(default)]
    pub detection: PipelineConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_points_per_second")]
    pub points_per_second_detected: f64,
    #[serde(default = "default_points_per_second")]
    pub points_per_second_missing: f64,
    #[serde(default = "default_max_frame_step_ms")]
    pub max_frame_step_ms: u64,
    #[serde(default = "default_state_change_cooldown_ms")]
    pub state_change_cooldown_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            key_wait_ms: default_key_wait_ms(),
            preview: default_preview(),
            detection: PipelineConfig::default(),
            scoring: ScoringConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points_per_second_detected: default_points_per_second(),
            points_per_second_missing: default_points_per_second(),
            max_frame_step_ms: default_max_frame_step_ms(),
            state_change_cooldown_ms: default_state_change_cooldown_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DetectorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn key_wait(&self) -> Duration {
        Duration::from_millis(self.key_wait_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.detection.ratio_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "detection.ratio_threshold must be within [0, 1], got {threshold}"
            )));
        }

        let range = &self.detection.color_range;
        for (name, hue) in [("lower", range.lower.hue), ("upper", range.upper.hue)] {
            if hue as i32 > HUE_SCALE {
                return Err(ConfigError::Invalid(format!(
                    "detection.color_range.{name} hue must be at most {HUE_SCALE}, got {hue}"
                )));
            }
        }
        if range.lower.saturation > range.upper.saturation {
            return Err(ConfigError::Invalid(
                "detection.color_range saturation lower bound exceeds upper bound".into(),
            ));
        }
        if range.lower.value > range.upper.value {
            return Err(ConfigError::Invalid(
                "detection.color_range value lower bound exceeds upper bound".into(),
            ));
        }

        // A zero wait blocks the key poll until a key arrives.
        if self.key_wait_ms == 0 {
            return Err(ConfigError::Invalid("key_wait_ms must be at least 1".into()));
        }

        for (name, rate) in [
            ("points_per_second_detected", self.scoring.points_per_second_detected),
            ("points_per_second_missing", self.scoring.points_per_second_missing),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "scoring.{name} must be a non-negative number, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_key_wait_ms() -> u64 {
    1
}
fn default_preview() -> bool {
    true
}
fn default_points_per_second() -> f64 {
    1.0
}
fn default_max_frame_step_ms() -> u64 {
    100
}
fn default_state_change_cooldown_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_range::color_range::BLUE_RANGE;
    use crate::core_modules::pixel::pixel::Hsv;

    #[test]
    fn empty_document_gives_stock_detector() {
        let config = DetectorConfig::from_toml("").unwrap();
        assert_eq!(config.device_index, 0);
        assert_eq!(config.key_wait_ms, 1);
        assert!(config.preview);
        assert_eq!(config.detection.color_range, BLUE_RANGE);
        assert_eq!(config.detection.ratio_threshold, 0.05);
        assert_eq!(config.scoring.state_change_cooldown_ms, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_partial_overrides() {
        let config = DetectorConfig::from_toml(
            r#"
            device_index = 2
            preview = false

            [detection]
            ratio_threshold = 0.1

            [detection.color_range]
            lower = [100, 90, 70]
            upper = [120, 250, 250]

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.device_index, 2);
        assert!(!config.preview);
        assert_eq!(config.detection.ratio_threshold, 0.1);
        assert_eq!(config.detection.color_range.lower, Hsv::new(100, 90, 70));
        assert_eq!(config.detection.color_range.upper, Hsv::new(120, 250, 250));
        assert_eq!(config.scoring.points_per_second_detected, 1.0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        let err = DetectorConfig::from_toml("[detection]\nratio_threshold = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_hue_above_scale() {
        let err = DetectorConfig::from_toml(
            "[detection.color_range]\nlower = [90, 80, 60]\nupper = [200, 255, 255]",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_saturation() {
        let err = DetectorConfig::from_toml(
            "[detection.color_range]\nlower = [90, 200, 60]\nupper = [130, 100, 255]",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_key_wait() {
        let err = DetectorConfig::from_toml("key_wait_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_channel_values_out_of_byte_range() {
        let err = DetectorConfig::from_toml(
            "[detection.color_range]\nlower = [90, 80, 60]\nupper = [130, 256, 255]",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DetectorConfig::load(Path::new("/nonexistent/beer_tracker.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile(..)));
    }

    #[test]
    fn default_config_validates() {
        DetectorConfig::default().validate().unwrap();
    }
}
