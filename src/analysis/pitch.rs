// PitchEstimator - NSDF-based fundamental frequency tracking
//
// Streaming pitch detection after McLeod & Wyvill, "A smarter way to find
// pitch" (2005):
//
// 1. Copy the window into a zero-padded double-length buffer
// 2. Autocorrelate through a forward/inverse FFT pair (Wiener-Khinchin)
// 3. Normalize into the NSDF, shedding the energy that leaves the
//    overlapped region as the lag grows
// 4. Skip the initial non-negative run, then pick local maxima with
//    parabolic interpolation and a linear lag bias against octave errors

use std::sync::Arc;

use log::{debug, warn};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::analysis::window::SlidingWindow;
use crate::config::PitchConfig;

/// Fraction of the window searched for periodicity peaks.
const SEEK_FRACTION: f64 = 0.85;

/// Fallback rate when construction receives an unusable sample rate.
const FALLBACK_SAMPLE_RATE: f64 = 44100.0;

/// A pitch estimate for one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PitchEstimate {
    /// Estimated fundamental frequency in Hz; 0.0 when no peak qualifies
    pub frequency: f64,
    /// Interpolated NSDF peak value, close to 1.0 for a clean periodic
    /// signal; 0.0 when no peak qualifies
    pub clarity: f64,
}

/// Streaming fundamental-frequency estimation over a sliding window.
///
/// The head sample of every analysis window is overridden with 1.0 before
/// the transform, a long-standing trait of this estimator that also keeps
/// the NSDF denominator strictly positive on silent input (silence cleanly
/// reports frequency 0, clarity 0).
pub struct PitchEstimator {
    sample_rate: f64,
    window: SlidingWindow,
    tolerance: f64,
    fft_fwd: Arc<dyn Fft<f64>>,
    fft_inv: Arc<dyn Fft<f64>>,
    fft_buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    win: Vec<f64>,
    nsdf: Vec<f64>,
    seek: usize,
}

impl PitchEstimator {
    /// Create an estimator for the given sample rate and analysis window
    /// length in samples.
    pub fn new(sample_rate: f64, window_size: usize) -> Self {
        Self::with_config(
            sample_rate,
            &PitchConfig {
                window_size,
                ..PitchConfig::default()
            },
        )
    }

    /// Create an estimator with explicit configuration parameters.
    pub fn with_config(sample_rate: f64, config: &PitchConfig) -> Self {
        let window = SlidingWindow::new(config.window_size);
        let size = window.size();

        let mut planner = FftPlanner::new();
        let fft_fwd = planner.plan_fft_forward(2 * size);
        let fft_inv = planner.plan_fft_inverse(2 * size);
        let scratch_len = fft_fwd
            .get_inplace_scratch_len()
            .max(fft_inv.get_inplace_scratch_len());

        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            warn!(
                "[Pitch] Invalid sample rate {}, falling back to {}",
                sample_rate, FALLBACK_SAMPLE_RATE
            );
            FALLBACK_SAMPLE_RATE
        };

        let seek = (SEEK_FRACTION * size as f64) as usize;
        let mut estimator = Self {
            sample_rate,
            window,
            tolerance: 0.2,
            fft_fwd,
            fft_inv,
            fft_buffer: vec![Complex::new(0.0, 0.0); 2 * size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            win: vec![0.0; size],
            nsdf: vec![0.0; seek],
            seek,
        };
        estimator.set_overlap(config.overlap);
        estimator.set_tolerance(config.tolerance);

        debug!(
            "[Pitch] window={} hop={} seek={} rate={}",
            estimator.window.size(),
            estimator.window.hop(),
            estimator.seek,
            estimator.sample_rate
        );
        estimator
    }

    /// Set the fraction of the window shared by successive frames.
    pub fn set_overlap(&mut self, overlap: f64) {
        if !overlap.is_finite() {
            warn!("[Pitch] Ignoring non-finite overlap {}", overlap);
            return;
        }
        self.window.set_overlap(overlap);
        debug!("[Pitch] overlap={} hop={}", overlap, self.window.hop());
    }

    /// Bias against octave errors, in [0, 1]. 0 always takes the highest
    /// NSDF peak; larger values increasingly favor shorter lags.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        if !tolerance.is_finite() {
            warn!("[Pitch] Ignoring non-finite tolerance {}", tolerance);
            return;
        }
        self.tolerance = tolerance.clamp(0.0, 1.0);
    }

    /// Replace the sample rate used to convert lags into frequencies.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            warn!("[Pitch] Ignoring invalid sample rate {}", sample_rate);
            return;
        }
        self.sample_rate = sample_rate;
        debug!("[Pitch] rate={}", sample_rate);
    }

    /// Push one sample; returns the pitch estimate when a frame is due.
    pub fn process(&mut self, sample: f64) -> Option<PitchEstimate> {
        if !self.window.push(sample) {
            return None;
        }
        Some(self.analyze())
    }

    /// Clear signal state while keeping the configuration.
    pub fn reset(&mut self) {
        self.window.reset();
        self.win.fill(0.0);
        self.nsdf.fill(0.0);
    }

    pub fn window_size(&self) -> usize {
        self.window.size()
    }

    pub fn hop_size(&self) -> usize {
        self.window.hop()
    }

    fn analyze(&mut self) -> PitchEstimate {
        let size = self.window.size();

        self.win.copy_from_slice(self.window.frame());
        self.win[0] = 1.0;

        for (slot, &x) in self.fft_buffer.iter_mut().zip(&self.win) {
            *slot = Complex::new(x, 0.0);
        }
        for slot in self.fft_buffer[size..].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft_fwd
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);
        for c in self.fft_buffer.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.fft_inv
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        // The norm starts at the zero-lag autocorrelation and sheds the
        // energy of the two samples leaving the overlapped region per lag,
        // scaled by the window size to match the unnormalized transforms.
        let mut norm = self.fft_buffer[0].re;
        for i in 0..self.seek {
            self.nsdf[i] = self.fft_buffer[i].re / norm;
            let j = size - i - 1;
            norm -= (self.win[i] * self.win[i] + self.win[j] * self.win[j]) * size as f64;
        }

        // Skip past the zero-lag peak before hunting for maxima
        let mut i = 1;
        while i < self.seek && self.nsdf[i] >= 0.0 {
            i += 1;
        }

        let mut estimate = PitchEstimate {
            frequency: 0.0,
            clarity: 0.0,
        };
        let mut best_biased = 0.0;
        while i + 1 < self.seek {
            if self.nsdf[i - 1] < self.nsdf[i] && self.nsdf[i] > self.nsdf[i + 1] {
                let a = self.nsdf[i - 1];
                let b = self.nsdf[i];
                let c = self.nsdf[i + 1];
                let offset = 0.5 * (c - a) / (2.0 * b - a - c);
                let peak = b + 0.5 * offset * (c - a);
                let rebias = 1.0 - (i as f64 * self.tolerance) / self.seek as f64;
                let biased = rebias * peak;
                if biased > best_biased {
                    estimate.frequency = self.sample_rate / (i as f64 + offset);
                    estimate.clarity = peak;
                    best_biased = biased;
                }
            }
            i += 1;
        }
        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    fn last_estimate(estimator: &mut PitchEstimator, signal: &[f64]) -> Option<PitchEstimate> {
        signal
            .iter()
            .filter_map(|&s| estimator.process(s))
            .last()
    }

    #[test]
    fn test_pure_sine_pitch() {
        let sample_rate = 44100.0;
        let mut estimator = PitchEstimator::new(sample_rate, 1024);

        let signal = generate_sine(440.0, sample_rate, 1024);
        let estimate = last_estimate(&mut estimator, &signal).unwrap();

        println!(
            "440 Hz sine: frequency={:.2} clarity={:.4}",
            estimate.frequency, estimate.clarity
        );
        assert!(
            (estimate.frequency - 440.0).abs() < 4.4,
            "Frequency {} more than 1% from 440 Hz",
            estimate.frequency
        );
        assert!(
            estimate.clarity > 0.9 && estimate.clarity < 1.1,
            "Clarity {} not close to 1 for a clean sinusoid",
            estimate.clarity
        );
    }

    #[test]
    fn test_tracks_low_and_high_tones() {
        let sample_rate = 44100.0;

        for freq in [110.0, 330.0, 1760.0] {
            let mut estimator = PitchEstimator::new(sample_rate, 1024);
            let signal = generate_sine(freq, sample_rate, 1024);
            let estimate = last_estimate(&mut estimator, &signal).unwrap();

            assert!(
                (estimate.frequency - freq).abs() < freq * 0.01,
                "Estimated {} for a {} Hz tone",
                estimate.frequency,
                freq
            );
        }
    }

    #[test]
    fn test_silence_reports_no_pitch() {
        let mut estimator = PitchEstimator::new(48000.0, 512);
        let estimate = last_estimate(&mut estimator, &vec![0.0; 1024]).unwrap();

        assert_eq!(estimate.frequency, 0.0);
        assert_eq!(estimate.clarity, 0.0);
    }

    #[test]
    fn test_noise_degrades_clarity() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let sample_rate = 44100.0;
        let clean = generate_sine(440.0, sample_rate, 1024);

        let mut estimator = PitchEstimator::new(sample_rate, 1024);
        let clean_estimate = last_estimate(&mut estimator, &clean).unwrap();

        let mut rng = StdRng::seed_from_u64(0x5EED);
        let noisy: Vec<f64> = clean
            .iter()
            .map(|&s| s + rng.gen_range(-0.5..0.5))
            .collect();
        let mut estimator = PitchEstimator::new(sample_rate, 1024);
        let noisy_estimate = last_estimate(&mut estimator, &noisy).unwrap();

        println!(
            "clarity: clean={:.4} noisy={:.4}",
            clean_estimate.clarity, noisy_estimate.clarity
        );
        assert!(
            (noisy_estimate.frequency - 440.0).abs() < 440.0 * 0.02,
            "Noise should not derail the estimate, got {}",
            noisy_estimate.frequency
        );
        assert!(noisy_estimate.clarity < clean_estimate.clarity);
        assert!(noisy_estimate.clarity > 0.5);
    }

    #[test]
    fn test_tolerance_extremes_keep_clean_tone() {
        let sample_rate = 44100.0;
        let signal = generate_sine(330.0, sample_rate, 1024);

        for tolerance in [-3.0, 0.0, 0.5, 1.0, 7.0] {
            let mut estimator = PitchEstimator::new(sample_rate, 1024);
            estimator.set_tolerance(tolerance);
            let estimate = last_estimate(&mut estimator, &signal).unwrap();

            assert!(
                (estimate.frequency - 330.0).abs() < 3.3,
                "Tolerance {} broke a clean tone ({})",
                tolerance,
                estimate.frequency
            );
        }
    }

    #[test]
    fn test_frame_cadence_with_overlap() {
        let sample_rate = 44100.0;
        let mut estimator = PitchEstimator::new(sample_rate, 1024);
        estimator.set_overlap(0.5);
        assert_eq!(estimator.hop_size(), 512);

        let signal = generate_sine(440.0, sample_rate, 2048);
        let estimates: Vec<PitchEstimate> =
            signal.iter().filter_map(|&s| estimator.process(s)).collect();

        assert_eq!(estimates.len(), 4, "One estimate per 512-sample hop");
        let last = estimates.last().unwrap();
        assert!((last.frequency - 440.0).abs() < 4.4);
    }

    #[test]
    fn test_sample_rate_scales_reported_pitch() {
        let signal = generate_sine(440.0, 44100.0, 1024);

        let mut estimator = PitchEstimator::new(44100.0, 1024);
        let base = last_estimate(&mut estimator, &signal).unwrap();

        // Same waveform declared at twice the rate reads an octave up
        let mut estimator = PitchEstimator::new(44100.0, 1024);
        estimator.set_sample_rate(88200.0);
        let doubled = last_estimate(&mut estimator, &signal).unwrap();

        assert!(
            (doubled.frequency - 2.0 * base.frequency).abs() < base.frequency * 0.02,
            "Expected {} to be twice {}",
            doubled.frequency,
            base.frequency
        );
    }

    #[test]
    fn test_reset_restarts_cadence() {
        let sample_rate = 44100.0;
        let mut estimator = PitchEstimator::new(sample_rate, 512);
        for &s in &generate_sine(440.0, sample_rate, 300) {
            estimator.process(s);
        }

        estimator.reset();
        let estimates: Vec<PitchEstimate> = generate_sine(220.0, sample_rate, 512)
            .iter()
            .filter_map(|&s| estimator.process(s))
            .collect();

        assert_eq!(estimates.len(), 1, "Full window required again after reset");
        assert!(
            (estimates[0].frequency - 220.0).abs() < 2.2,
            "Stale samples leaked through reset, got {}",
            estimates[0].frequency
        );
    }
}
