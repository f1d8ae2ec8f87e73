//! Normalized loudness for the live level stream.
//!
//! [`LevelMeter`] turns each captured chunk into one smoothed value in
//! `[0, 1]`: RMS over the chunk, a fixed ×5 gain so quiet speech is visible,
//! a clamp, and exponential smoothing against the previously emitted value.

/// Weight of the previous value in the smoothing blend.
const SMOOTHING_FACTOR: f32 = 0.3;

/// Linear gain applied to the raw RMS before clamping.
const RMS_GAIN: f32 = 5.0;

// ---------------------------------------------------------------------------
// LevelMeter
// ---------------------------------------------------------------------------

/// Stateful loudness meter. One instance per recording session; the drain
/// thread is the sole owner, so no interior locking is needed.
#[derive(Debug, Default)]
pub struct LevelMeter {
    previous: f32,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the smoothed, normalized loudness of one chunk of `f32`
    /// samples in `[-1, 1]`.
    ///
    /// The result is `0.3 * previous + 0.7 * clamp(rms * 5.0, 0, 1)` and
    /// becomes the new `previous`. An empty chunk measures as silence.
    pub fn update(&mut self, samples: &[f32]) -> f32 {
        let raw = Self::normalized_rms(samples);
        let smoothed = self.previous * SMOOTHING_FACTOR + raw * (1.0 - SMOOTHING_FACTOR);
        self.previous = smoothed;
        smoothed
    }

    /// RMS of the chunk, scaled by [`RMS_GAIN`] and clamped to `[0, 1]`.
    fn normalized_rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let mean_square =
            samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
        (mean_square.sqrt() * RMS_GAIN).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
