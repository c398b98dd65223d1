//! Configuration management for the analysis components
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Window sizes, overlap
//! ratios, frequency bounds, and envelope time constants can be adjusted
//! via the config file for rapid experimentation. Values are stored as
//! written; each analyzer clips to its documented valid range when the
//! value is applied.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{log_config_error, ConfigError};

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub zero_crossing: ZeroCrossingConfig,
    pub spectral: SpectralConfig,
    pub pitch: PitchConfig,
    pub envelope: EnvelopeConfig,
}

/// Zero-crossing rate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroCrossingConfig {
    /// Analysis window length in samples
    pub window_size: usize,
    /// Fraction of the window shared by successive frames, in [0, 1]
    pub overlap: f64,
}

impl Default for ZeroCrossingConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            overlap: 0.0,
        }
    }
}

/// Spectral descriptor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Analysis window length in samples
    pub window_size: usize,
    /// Fraction of the window shared by successive frames, in [0, 1]
    pub overlap: f64,
    /// Lower bound of the analyzed frequency band in Hz
    pub min_freq: f64,
    /// Upper bound of the analyzed frequency band in Hz; 0 selects the
    /// Nyquist frequency
    pub max_freq: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            overlap: 0.0,
            min_freq: 0.0,
            max_freq: 0.0,
        }
    }
}

/// Pitch estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Analysis window length in samples
    pub window_size: usize,
    /// Fraction of the window shared by successive frames, in [0, 1]
    pub overlap: f64,
    /// Octave-error bias in [0, 1]; larger values favor shorter lags
    pub tolerance: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            overlap: 0.0,
            tolerance: 0.2,
        }
    }
}

/// Envelope follower parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Attack time constant in seconds
    pub attack: f64,
    /// Release time constant in seconds
    pub release: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.005,
            release: 0.05,
        }
    }
}

impl Default for AnalysisConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            zero_crossing: ZeroCrossingConfig::default(),
            spectral: SpectralConfig::default(),
            pitch: PitchConfig::default(),
            envelope: EnvelopeConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// Any failure falls back to the defaults with a warning, so a missing
    /// or malformed file never takes the audio path down.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log_config_error(&err);
                    log::warn!("[Config] Using defaults for {:?}", path.as_ref());
                    Self::default()
                }
            },
            Err(err) => {
                let err = ConfigError::ReadFailed {
                    path: path.as_ref().display().to_string(),
                    details: err.to_string(),
                };
                log_config_error(&err);
                log::warn!("[Config] Using defaults for {:?}", path.as_ref());
                Self::default()
            }
        }
    }

    /// Parse configuration from a JSON string
    ///
    /// # Returns
    /// * `Ok(AnalysisConfig)` - Parsed configuration
    /// * `Err(ConfigError)` - If the JSON is invalid
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::ParseFailed {
            details: err.to_string(),
        })
    }
}
