// EnvelopeFollower - attack/release amplitude tracking
//
// One-pole smoothing of the rectified signal. The coefficient switches per
// sample: the attack coefficient while the input magnitude is above the
// current envelope, the release coefficient while it is below. Unlike the
// windowed analyzers, the follower produces an output on every sample.

use log::{debug, warn};

use crate::config::EnvelopeConfig;

/// Fallback rate when construction receives an unusable sample rate.
const FALLBACK_SAMPLE_RATE: f64 = 44100.0;

/// Streaming amplitude envelope with separate attack and release times.
///
/// Time constants are set in seconds and converted to per-sample one-pole
/// coefficients as `exp(-1 / (time * sample_rate))`. A zero time constant
/// yields coefficient 0, so the envelope tracks the rectified input exactly
/// on that edge.
pub struct EnvelopeFollower {
    sample_rate: f64,
    attack_time: f64,
    release_time: f64,
    attack_coeff: f64,
    release_coeff: f64,
    envelope: f64,
}

impl EnvelopeFollower {
    /// Create a follower for the given sample rate with default times.
    pub fn new(sample_rate: f64) -> Self {
        Self::with_config(sample_rate, &EnvelopeConfig::default())
    }

    /// Create a follower with explicit configuration parameters.
    pub fn with_config(sample_rate: f64, config: &EnvelopeConfig) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            warn!(
                "[Envelope] Invalid sample rate {}, falling back to {}",
                sample_rate, FALLBACK_SAMPLE_RATE
            );
            FALLBACK_SAMPLE_RATE
        };

        let mut follower = Self {
            sample_rate,
            attack_time: 0.0,
            release_time: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: 0.0,
        };
        follower.set_attack(config.attack);
        follower.set_release(config.release);

        debug!(
            "[Envelope] attack={}s release={}s rate={}",
            follower.attack_time, follower.release_time, follower.sample_rate
        );
        follower
    }

    /// Attack time constant in seconds. Negative values clip to 0, which
    /// makes the envelope jump to rising input immediately.
    pub fn set_attack(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            warn!("[Envelope] Ignoring non-finite attack time {}", seconds);
            return;
        }
        self.attack_time = seconds.max(0.0);
        self.attack_coeff = time_to_coeff(self.attack_time, self.sample_rate);
    }

    /// Release time constant in seconds. Negative values clip to 0.
    pub fn set_release(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            warn!("[Envelope] Ignoring non-finite release time {}", seconds);
            return;
        }
        self.release_time = seconds.max(0.0);
        self.release_coeff = time_to_coeff(self.release_time, self.sample_rate);
    }

    /// Replace the sample rate, re-deriving both smoothing coefficients
    /// from the stored times.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            warn!("[Envelope] Ignoring invalid sample rate {}", sample_rate);
            return;
        }
        self.sample_rate = sample_rate;
        self.attack_coeff = time_to_coeff(self.attack_time, sample_rate);
        self.release_coeff = time_to_coeff(self.release_time, sample_rate);
        debug!("[Envelope] rate={}", sample_rate);
    }

    /// Track one sample; returns the updated envelope value.
    pub fn process(&mut self, sample: f64) -> f64 {
        let mag = sample.abs();
        let coeff = if mag > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * mag;
        self.envelope
    }

    /// Return the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    /// Attack time constant in seconds.
    pub fn attack(&self) -> f64 {
        self.attack_time
    }

    /// Release time constant in seconds.
    pub fn release(&self) -> f64 {
        self.release_time
    }
}

fn time_to_coeff(time: f64, sample_rate: f64) -> f64 {
    if time > 0.0 {
        (-1.0 / (time * sample_rate)).exp()
    } else {
        0.0
    }
}
