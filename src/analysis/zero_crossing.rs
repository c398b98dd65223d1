// ZeroCrossingDetector - windowed zero-crossing rate
//
// Counts sign transitions over the analysis window. The cheapest of the
// analyzers; no transform involved.

use log::{debug, warn};

use crate::analysis::window::SlidingWindow;
use crate::config::ZeroCrossingConfig;

/// Streaming zero-crossing rate over a sliding window.
///
/// Samples are pushed one at a time; every hop the detector reports the
/// number of sign transitions in the current window divided by the window
/// size. A sample exactly at zero is treated as nonnegative against the
/// previous sample and nonpositive against the next, so it never counts as
/// two transitions on its own.
pub struct ZeroCrossingDetector {
    window: SlidingWindow,
}

impl ZeroCrossingDetector {
    /// Create a detector with the given analysis window length in samples.
    pub fn new(window_size: usize) -> Self {
        let window = SlidingWindow::new(window_size);
        debug!(
            "[ZeroCrossing] window={} hop={}",
            window.size(),
            window.hop()
        );
        Self { window }
    }

    /// Create a detector from configuration values.
    pub fn with_config(config: &ZeroCrossingConfig) -> Self {
        let mut detector = Self::new(config.window_size);
        detector.set_overlap(config.overlap);
        detector
    }

    /// Set the fraction of the window shared by successive frames.
    pub fn set_overlap(&mut self, overlap: f64) {
        if !overlap.is_finite() {
            warn!("[ZeroCrossing] Ignoring non-finite overlap {}", overlap);
            return;
        }
        self.window.set_overlap(overlap);
        debug!(
            "[ZeroCrossing] overlap={} hop={}",
            overlap,
            self.window.hop()
        );
    }

    /// Push one sample; returns the zero-crossing rate when a frame is due.
    pub fn process(&mut self, sample: f64) -> Option<f64> {
        if !self.window.push(sample) {
            return None;
        }

        let frame = self.window.frame();
        let mut transitions = 0usize;
        for i in 1..frame.len() {
            if (frame[i - 1] >= 0.0 && frame[i] < 0.0)
                || (frame[i - 1] <= 0.0 && frame[i] > 0.0)
            {
                transitions += 1;
            }
        }

        Some(transitions as f64 / self.window.size() as f64)
    }

    /// Clear the window and restart the hop cycle.
    pub fn reset(&mut self) {
        self.window.reset();
    }

    pub fn window_size(&self) -> usize {
        self.window.size()
    }

    pub fn hop_size(&self) -> usize {
        self.window.hop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(detector: &mut ZeroCrossingDetector, signal: &[f64]) -> Vec<f64> {
        signal.iter().filter_map(|&s| detector.process(s)).collect()
    }

    #[test]
    fn test_alternating_signal_rate() {
        let size = 64;
        let mut detector = ZeroCrossingDetector::new(size);

        let signal: Vec<f64> = (0..size).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let rates = drive(&mut detector, &signal);

        assert_eq!(rates.len(), 1);
        let expected = (size - 1) as f64 / size as f64;
        assert_eq!(rates[0], expected, "Alternating signal has size-1 transitions");
    }

    #[test]
    fn test_silence_and_dc_have_no_crossings() {
        let mut detector = ZeroCrossingDetector::new(32);
        let rates = drive(&mut detector, &vec![0.0; 32]);
        assert_eq!(rates, vec![0.0]);

        let mut detector = ZeroCrossingDetector::new(32);
        let rates = drive(&mut detector, &vec![0.7; 32]);
        assert_eq!(rates, vec![0.0]);
    }

    #[test]
    fn test_exact_zero_counts_once() {
        // 1 -> 0 is not a transition, 0 -> -1 is.
        let mut detector = ZeroCrossingDetector::new(4);
        let rates = drive(&mut detector, &[1.0, 0.0, -1.0, -1.0]);

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0], 1.0 / 4.0);
    }

    #[test]
    fn test_sine_rate_tracks_frequency() {
        let sample_rate = 48000.0;
        let freq = 1000.0;
        let size = 1024;
        let mut detector = ZeroCrossingDetector::new(size);

        let signal: Vec<f64> = (0..size)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
            .collect();
        let rates = drive(&mut detector, &signal);

        assert_eq!(rates.len(), 1);
        // A sinusoid crosses zero twice per cycle.
        let expected = 2.0 * freq / sample_rate;
        assert!(
            (rates[0] - expected).abs() < 0.005,
            "Rate {} too far from expected {}",
            rates[0],
            expected
        );
    }

    #[test]
    fn test_emission_cadence_with_overlap() {
        let size = 64;
        let mut detector = ZeroCrossingDetector::new(size);
        detector.set_overlap(0.5);
        assert_eq!(detector.hop_size(), 32);

        let signal: Vec<f64> = (0..128)
            .map(|i| if (i / 3) % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let rates = drive(&mut detector, &signal);

        assert_eq!(rates.len(), 4, "One frame per 32-sample hop");
    }

    #[test]
    fn test_reset_restarts_cadence() {
        let mut detector = ZeroCrossingDetector::new(16);
        for i in 0..10 {
            detector.process(i as f64);
        }

        detector.reset();
        let rates = drive(&mut detector, &vec![1.0; 16]);
        assert_eq!(rates.len(), 1, "Full window required again after reset");
        assert_eq!(rates[0], 0.0);
    }
}
