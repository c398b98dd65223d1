// SpectralFeatureExtractor - streaming spectral descriptors
//
// This module computes a bank of spectral statistics over a sliding window,
// once per hop:
//
// 1. Scale the window by 2 and apply a Hann taper
// 2. Forward FFT; keep the window_size/2 + 1 real-spectrum bins
// 3. Swap current/previous magnitude and whitened-magnitude buffers
// 4. First pass over [min_bin, max_bin): magnitudes, whitener update,
//    whitened magnitudes, magnitude sum and log-sum, weighted centroid
// 5. Second pass: normalized central moments (spread, skewness, kurtosis),
//    flux against the previous normalized spectrum, onset strength from
//    positive whitened-magnitude differences
// 6. Finalize: flatness = geometric mean / arithmetic mean, excess
//    kurtosis, flux square root, onset per bin

use std::sync::Arc;

use log::{debug, warn};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::analysis::window::{hann_window, SlidingWindow};
use crate::config::SpectralConfig;

/// Floor for the whitener envelope, keeping the whitening division away
/// from zero on silent bins.
const WHITENER_FLOOR: f64 = 1e-6;

/// Fallback rate when construction receives an unusable sample rate.
const FALLBACK_SAMPLE_RATE: f64 = 44100.0;

/// One frame of spectral descriptors.
///
/// All values are finite for any input signal; frames with no in-band
/// energy (or an empty bin range) report zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SpectralFeatures {
    /// Mean magnitude over the analyzed bin range
    pub magnitude: f64,
    /// Spectral centroid as a normalized in-band position in [0, 1]
    pub brightness: f64,
    /// Standard deviation of the normalized spectrum around the centroid
    pub spread: f64,
    /// Third standardized moment of the normalized spectrum
    pub skewness: f64,
    /// Excess kurtosis of the normalized spectrum
    pub kurtosis: f64,
    /// Geometric over arithmetic mean of in-band magnitudes, in [0, 1]
    pub flatness: f64,
    /// Root of the summed squared change between successive normalized spectra
    pub flux: f64,
    /// Mean positive whitened-magnitude difference (onset strength)
    pub onset: f64,
}

/// Streaming spectral feature extraction over a sliding window.
pub struct SpectralFeatureExtractor {
    sample_rate: f64,
    window: SlidingWindow,
    hann: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
    fft_buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    // Magnitude and whitened-magnitude history, swapped by reference each
    // frame so no per-frame copies happen
    ampli_curr: Vec<f64>,
    ampli_prev: Vec<f64>,
    white_curr: Vec<f64>,
    white_prev: Vec<f64>,
    // Decaying per-bin running maximum used to normalize onset strength
    whitener: Vec<f64>,
    decay: f64,
    min_freq: f64,
    max_freq: f64,
    min_bin: usize,
    max_bin: usize,
}

impl SpectralFeatureExtractor {
    /// Create an extractor for the given sample rate and analysis window
    /// length in samples.
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz (e.g., 44100.0)
    /// * `window_size` - Analysis window length in samples
    pub fn new(sample_rate: f64, window_size: usize) -> Self {
        Self::with_config(
            sample_rate,
            &SpectralConfig {
                window_size,
                ..SpectralConfig::default()
            },
        )
    }

    /// Create an extractor with explicit configuration parameters.
    pub fn with_config(sample_rate: f64, config: &SpectralConfig) -> Self {
        let window = SlidingWindow::new(config.window_size);
        let size = window.size();
        let fft_size = size / 2 + 1;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        let hann = hann_window(size);
        let sample_rate = sanitize_sample_rate(sample_rate);

        let mut extractor = Self {
            sample_rate,
            window,
            hann,
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
            ampli_curr: vec![0.0; fft_size],
            ampli_prev: vec![0.0; fft_size],
            white_curr: vec![0.0; fft_size],
            white_prev: vec![0.0; fft_size],
            whitener: vec![1.0; fft_size],
            decay: 1.0,
            min_freq: 0.0,
            max_freq: 0.0,
            min_bin: 0,
            max_bin: fft_size,
        };
        extractor.set_overlap(config.overlap);
        extractor.set_min_freq(config.min_freq);
        extractor.set_max_freq(config.max_freq);

        debug!(
            "[Spectral] window={} hop={} bins=[{}..{}) rate={}",
            extractor.window.size(),
            extractor.window.hop(),
            extractor.min_bin,
            extractor.max_bin,
            extractor.sample_rate
        );
        extractor
    }

    /// Set the fraction of the window shared by successive frames. The hop
    /// and the whitener decay follow.
    pub fn set_overlap(&mut self, overlap: f64) {
        if !overlap.is_finite() {
            warn!("[Spectral] Ignoring non-finite overlap {}", overlap);
            return;
        }
        self.window.set_overlap(overlap);
        self.refresh_decay();
        debug!(
            "[Spectral] overlap={} hop={} decay={:.6}",
            overlap,
            self.window.hop(),
            self.decay
        );
    }

    /// Lower bound of the analyzed frequency band in Hz.
    pub fn set_min_freq(&mut self, freq: f64) {
        if !freq.is_finite() {
            warn!("[Spectral] Ignoring non-finite min frequency {}", freq);
            return;
        }
        self.min_freq = freq;
        self.refresh_band();
        debug!(
            "[Spectral] min_freq={} bins=[{}..{})",
            freq, self.min_bin, self.max_bin
        );
    }

    /// Upper bound of the analyzed frequency band in Hz. Zero or negative
    /// selects the Nyquist frequency.
    pub fn set_max_freq(&mut self, freq: f64) {
        if !freq.is_finite() {
            warn!("[Spectral] Ignoring non-finite max frequency {}", freq);
            return;
        }
        self.max_freq = freq;
        self.refresh_band();
        debug!(
            "[Spectral] max_freq={} bins=[{}..{})",
            freq, self.min_bin, self.max_bin
        );
    }

    /// Replace the sample rate, re-deriving the frequency band bins and the
    /// whitener decay from the stored parameters.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            warn!("[Spectral] Ignoring invalid sample rate {}", sample_rate);
            return;
        }
        self.sample_rate = sample_rate;
        self.refresh_decay();
        self.refresh_band();
        debug!(
            "[Spectral] rate={} bins=[{}..{}) decay={:.6}",
            sample_rate, self.min_bin, self.max_bin, self.decay
        );
    }

    /// Push one sample; returns the feature frame when one is due.
    pub fn process(&mut self, sample: f64) -> Option<SpectralFeatures> {
        if !self.window.push(sample) {
            return None;
        }
        Some(self.analyze())
    }

    /// Clear signal state (window, spectra, whitener) while keeping the
    /// configured window, band, and decay.
    pub fn reset(&mut self) {
        self.window.reset();
        self.ampli_curr.fill(0.0);
        self.ampli_prev.fill(0.0);
        self.white_curr.fill(0.0);
        self.white_prev.fill(0.0);
        self.whitener.fill(1.0);
    }

    pub fn window_size(&self) -> usize {
        self.window.size()
    }

    pub fn hop_size(&self) -> usize {
        self.window.hop()
    }

    /// First analyzed bin (inclusive).
    pub fn min_bin(&self) -> usize {
        self.min_bin
    }

    /// One past the last analyzed bin.
    pub fn max_bin(&self) -> usize {
        self.max_bin
    }

    fn analyze(&mut self) -> SpectralFeatures {
        let span = self.max_bin.saturating_sub(self.min_bin);
        if span == 0 {
            return SpectralFeatures::default();
        }
        let span_f = span as f64;

        std::mem::swap(&mut self.ampli_curr, &mut self.ampli_prev);
        std::mem::swap(&mut self.white_curr, &mut self.white_prev);

        let frame = self.window.frame();
        for ((slot, &x), &w) in self.fft_buffer.iter_mut().zip(frame).zip(&self.hann) {
            *slot = Complex::new(2.0 * x * w, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let mut sum = 0.0;
        let mut log_sum = 0.0;
        let mut brightness = 0.0;
        for i in self.min_bin..self.max_bin {
            let mag = self.fft_buffer[i].norm();
            self.ampli_curr[i] = mag;
            self.whitener[i] = WHITENER_FLOOR.max((self.decay * self.whitener[i]).max(mag));
            self.white_curr[i] = mag / self.whitener[i];
            sum += mag;
            log_sum += mag.ln();
            brightness += mag * ((i - self.min_bin) as f64 + 0.5) / span_f;
        }

        let magnitude = sum / span_f;
        let brightness = if sum > 0.0 { brightness / sum } else { 0.0 };

        let mut spread = 0.0;
        let mut skewness = 0.0;
        let mut kurtosis = 0.0;
        let mut flux = 0.0;
        let mut onset = 0.0;
        for i in self.min_bin..self.max_bin {
            if sum > 0.0 {
                self.ampli_curr[i] /= sum;
            }
            let dev = ((i - self.min_bin) as f64 + 0.5) / span_f - brightness;
            spread += dev.powi(2) * self.ampli_curr[i];
            skewness += dev.powi(3) * self.ampli_curr[i];
            kurtosis += dev.powi(4) * self.ampli_curr[i];
            flux += (self.ampli_curr[i] - self.ampli_prev[i]).powi(2);
            onset += (self.white_curr[i] - self.white_prev[i]).max(0.0);
        }

        let spread = spread.sqrt();
        let (skewness, kurtosis) = if spread > 0.0 {
            (
                skewness / spread.powi(3),
                kurtosis / spread.powi(4) - 3.0,
            )
        } else {
            // Single-bin or silent frames have no meaningful shape moments
            (0.0, 0.0)
        };
        let flatness = if sum > 0.0 {
            (log_sum / span_f).exp() / (sum / span_f)
        } else {
            0.0
        };

        SpectralFeatures {
            magnitude,
            brightness,
            spread,
            skewness,
            kurtosis,
            flatness,
            flux: flux.sqrt(),
            onset: onset / span_f,
        }
    }

    fn refresh_decay(&mut self) {
        let time_step = 1.0 / self.sample_rate;
        self.decay = 10f64.powf(-0.12 * time_step * self.window.hop() as f64);
    }

    fn refresh_band(&mut self) {
        let size = self.window.size() as f64;
        let time_step = 1.0 / self.sample_rate;
        self.min_bin = (self.min_freq * time_step * size)
            .clamp(0.0, (self.window.size() / 2) as f64) as usize;

        let max_freq = if self.max_freq <= 0.0 {
            self.sample_rate / 2.0
        } else {
            self.max_freq
        };
        self.max_bin = (max_freq * time_step * size + 1.0)
            .clamp(1.0, (self.window.size() / 2 + 1) as f64) as usize;
    }
}

fn sanitize_sample_rate(sample_rate: f64) -> f64 {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        warn!(
            "[Spectral] Invalid sample rate {}, falling back to {}",
            sample_rate, FALLBACK_SAMPLE_RATE
        );
        FALLBACK_SAMPLE_RATE
    }
}
