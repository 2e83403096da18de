//! Welch power spectral density estimation.
//!
//! Segments are Hann-windowed (periodic form), detrended by their own mean and
//! averaged; the result is a one-sided density in units²/Hz.

use crate::config::AnalysisConfig;
use crate::error::ChannelError;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;
use std::cell::RefCell;
use std::f64::consts::PI;

// One planner per rayon worker; plans are cached per segment length
thread_local! {
    static FFT_PLANNER: RefCell<FftPlanner<f64>> = RefCell::new(FftPlanner::new());
}

/// One-sided power spectral density on a uniform frequency grid
#[derive(Debug, Clone, Serialize)]
pub struct PowerSpectrum {
    /// Bin centers in Hz, `k * fs / nperseg` for `k = 0..=nperseg/2`
    pub frequencies: Vec<f64>,
    /// Power spectral density per bin
    pub psd: Vec<f64>,
    /// Number of averaged segments
    pub segments: usize,
}

impl PowerSpectrum {
    pub fn resolution(&self) -> f64 {
        if self.frequencies.len() < 2 {
            0.0
        } else {
            self.frequencies[1] - self.frequencies[0]
        }
    }
}

/// Periodic Hann window of length `n`
pub fn hann_periodic(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

#[derive(Debug, Clone)]
pub struct WelchEstimator {
    window_seconds: f64,
    overlap: f64,
}

impl Default for WelchEstimator {
    fn default() -> Self {
        Self::new(2.0, 0.5)
    }
}

impl WelchEstimator {
    pub fn new(window_seconds: f64, overlap: f64) -> Self {
        Self {
            window_seconds,
            overlap,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.window_seconds, config.overlap)
    }

    /// Samples per segment at the given rate
    pub fn segment_len(&self, sample_rate: f64) -> usize {
        (self.window_seconds * sample_rate).round().max(0.0) as usize
    }

    pub fn estimate(&self, signal: &[f64], sample_rate: f64) -> Result<PowerSpectrum, ChannelError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ChannelError::InvalidSampleRate {
                sample_rate,
                reason: "sample rate must be a positive number".to_string(),
            });
        }

        let nperseg = self.segment_len(sample_rate);
        if nperseg < 2 || nperseg > signal.len() {
            return Err(ChannelError::InsufficientSamples {
                required: nperseg.max(2),
                available: signal.len(),
            });
        }

        let noverlap = ((nperseg as f64) * self.overlap).floor() as usize;
        let step = (nperseg - noverlap.min(nperseg - 1)).max(1);
        let segments = (signal.len() - nperseg) / step + 1;

        let window = hann_periodic(nperseg);
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let n_bins = nperseg / 2 + 1;

        let mut accumulated = vec![0.0; n_bins];
        let mut buffer = vec![Complex::new(0.0, 0.0); nperseg];

        FFT_PLANNER.with(|planner| {
            let fft = planner.borrow_mut().plan_fft_forward(nperseg);

            for seg in 0..segments {
                let start = seg * step;
                let segment = &signal[start..start + nperseg];
                let mean = segment.iter().sum::<f64>() / nperseg as f64;

                for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
                    *slot = Complex::new((x - mean) * w, 0.0);
                }
                fft.process(&mut buffer);

                for (acc, c) in accumulated.iter_mut().zip(&buffer[..n_bins]) {
                    *acc += c.norm_sqr();
                }
            }
        });

        let scale = 1.0 / (sample_rate * window_power * segments as f64);
        let last = n_bins - 1;
        let psd = accumulated
            .iter()
            .enumerate()
            .map(|(k, &p)| {
                // Fold negative frequencies; DC and (even-length) Nyquist have no mirror
                let one_sided = k != 0 && !(k == last && nperseg % 2 == 0);
                if one_sided {
                    2.0 * p * scale
                } else {
                    p * scale
                }
            })
            .collect();

        let frequencies = (0..n_bins)
            .map(|k| k as f64 * sample_rate / nperseg as f64)
            .collect();

        Ok(PowerSpectrum {
            frequencies,
            psd,
            segments,
        })
    }
}
