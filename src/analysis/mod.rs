// Analysis module - streaming audio descriptors
//
// Four independent analyzers, each driven one sample at a time from the
// audio callback:
// - ZeroCrossingDetector: sign transitions over the window
// - SpectralFeatureExtractor: statistical moments, flatness, flux, and
//   onset strength of the magnitude spectrum
// - PitchEstimator: NSDF fundamental-frequency tracking
// - EnvelopeFollower: attack/release amplitude tracking, every sample
//
// The windowed analyzers share the mirrored circular buffer and hop
// discipline in `window`; none of the analyzers depend on each other.

mod window;

pub mod envelope;
pub mod pitch;
pub mod spectral;
pub mod zero_crossing;

pub use envelope::EnvelopeFollower;
pub use pitch::{PitchEstimate, PitchEstimator};
pub use spectral::{SpectralFeatureExtractor, SpectralFeatures};
pub use zero_crossing::ZeroCrossingDetector;
