// Mimic DSP - Streaming Audio Feature Analysis
// Real-time descriptors for driving physically informed sound synthesis
//
// Every analyzer is fed one sample at a time and allocates only at
// construction, so the per-sample path is safe inside an audio callback.

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use analysis::{
    EnvelopeFollower, PitchEstimate, PitchEstimator, SpectralFeatureExtractor, SpectralFeatures,
    ZeroCrossingDetector,
};
pub use config::{
    AnalysisConfig, EnvelopeConfig, PitchConfig, SpectralConfig, ZeroCrossingConfig,
};
pub use error::{log_config_error, ConfigError, ErrorCode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzers_construct_from_default_config() {
        let config = AnalysisConfig::default();

        let mut zero_crossing = ZeroCrossingDetector::with_config(&config.zero_crossing);
        let mut spectral = SpectralFeatureExtractor::with_config(44100.0, &config.spectral);
        let mut pitch = PitchEstimator::with_config(44100.0, &config.pitch);
        let mut envelope = EnvelopeFollower::with_config(44100.0, &config.envelope);

        assert_eq!(zero_crossing.window_size(), 1024);
        assert_eq!(spectral.hop_size(), 1024);
        assert_eq!(pitch.window_size(), 1024);

        assert!(zero_crossing.process(0.0).is_none());
        assert!(spectral.process(0.0).is_none());
        assert!(pitch.process(0.0).is_none());
        assert_eq!(envelope.process(0.0), 0.0);
    }
}
