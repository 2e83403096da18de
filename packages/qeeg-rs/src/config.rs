use crate::error::{QeegError, Result};
use crate::types::{canonical_bands, FrequencyBand, BROADBAND_HIGH_HZ, BROADBAND_LOW_HZ};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for one analysis invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Welch segment duration in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: f64,

    /// Fraction of a segment shared with the next one, in [0, 1)
    #[serde(default = "default_overlap")]
    pub overlap: f64,

    /// Butterworth order of each half (high-pass and low-pass) of the band-pass
    #[serde(default = "default_filter_order")]
    pub filter_order: usize,

    /// Band-pass low corner and normalization range lower edge (Hz)
    #[serde(default = "default_broadband_low")]
    pub broadband_low_hz: f64,

    /// Band-pass high corner and normalization range upper edge (Hz)
    #[serde(default = "default_broadband_high")]
    pub broadband_high_hz: f64,

    /// Bands to report, in report order
    #[serde(default = "default_bands")]
    pub bands: Vec<FrequencyBand>,

    /// Relative power above which a (channel, band) pair is annotated
    #[serde(default = "default_threshold")]
    pub interpretation_threshold: f64,

    /// Characters of each auxiliary document shown in the clinical report
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Analyze channels on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_window_seconds() -> f64 {
    2.0
}
fn default_overlap() -> f64 {
    0.5
}
fn default_filter_order() -> usize {
    4
}
fn default_broadband_low() -> f64 {
    BROADBAND_LOW_HZ
}
fn default_broadband_high() -> f64 {
    BROADBAND_HIGH_HZ
}
fn default_bands() -> Vec<FrequencyBand> {
    canonical_bands().to_vec()
}
fn default_threshold() -> f64 {
    0.3
}
fn default_preview_chars() -> usize {
    500
}
fn default_parallel() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            overlap: default_overlap(),
            filter_order: default_filter_order(),
            broadband_low_hz: default_broadband_low(),
            broadband_high_hz: default_broadband_high(),
            bands: default_bands(),
            interpretation_threshold: default_threshold(),
            preview_chars: default_preview_chars(),
            parallel: default_parallel(),
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded analysis config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn broadband(&self) -> FrequencyBand {
        FrequencyBand {
            name: "Broadband".to_string(),
            low_hz: self.broadband_low_hz,
            high_hz: self.broadband_high_hz,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            return Err(QeegError::InvalidConfig(format!(
                "window_seconds must be positive, got {}",
                self.window_seconds
            )));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(QeegError::InvalidConfig(format!(
                "overlap must be in [0, 1), got {}",
                self.overlap
            )));
        }
        if self.filter_order == 0 || self.filter_order > 8 {
            return Err(QeegError::InvalidConfig(format!(
                "filter_order must be in 1..=8, got {}",
                self.filter_order
            )));
        }
        self.broadband()
            .validate()
            .map_err(|e| QeegError::InvalidConfig(e.to_string()))?;
        if self.bands.is_empty() {
            return Err(QeegError::InvalidConfig(
                "at least one band must be configured".to_string(),
            ));
        }
        for (i, band) in self.bands.iter().enumerate() {
            band.validate()?;
            if self.bands[..i].iter().any(|b| b.name == band.name) {
                return Err(QeegError::InvalidConfig(format!(
                    "duplicate band name '{}'",
                    band.name
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.interpretation_threshold) {
            return Err(QeegError::InvalidConfig(format!(
                "interpretation_threshold must be in [0, 1], got {}",
                self.interpretation_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_seconds, 2.0);
        assert_eq!(config.bands.len(), 5);
        assert_eq!(config.interpretation_threshold, 0.3);
        assert_eq!(config.preview_chars, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"window_seconds": 4.0, "parallel": false}"#).unwrap();
        assert_eq!(config.window_seconds, 4.0);
        assert!(!config.parallel);
        assert_eq!(config.overlap, 0.5);
        assert_eq!(config.bands[2].name, "Alpha");
    }

    #[test]
    fn test_custom_bands_from_json() {
        let json = r#"{"bands": [{"name": "Low", "low_hz": 1.0, "high_hz": 10.0},
                                 {"name": "High", "low_hz": 10.0, "high_hz": 40.0}]}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.bands[1].name, "High");
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.overlap = 1.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.window_seconds = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.bands.push(config.bands[0].clone());
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.interpretation_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qeeg.json");
        std::fs::write(&path, r#"{"interpretation_threshold": 0.25}"#).unwrap();
        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.interpretation_threshold, 0.25);
    }
}
