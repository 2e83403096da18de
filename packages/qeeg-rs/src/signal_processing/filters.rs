//! Digital Filter Implementations
//!
//! Implements IIR filters using second-order sections (biquads) for numerical stability,
//! the Butterworth designs built from them, and zero-phase (forward-backward) application.

use crate::config::AnalysisConfig;
use crate::error::ChannelError;
use std::f64::consts::PI;

/// Second-order section (biquad) coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Gain of the section at DC (z = 1)
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// State for a single biquad section (Direct Form II Transposed)
#[derive(Debug, Clone, Default)]
pub struct BiquadState {
    z1: f64,
    z2: f64,
}

/// Single biquad filter section
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            state: BiquadState::default(),
        }
    }

    /// Process a single sample using Direct Form II Transposed
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.state.z1;
        self.state.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.state.z2;
        self.state.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }

    /// Load the state this section settles into under a constant `input`.
    /// Returns the corresponding constant output.
    pub fn prime(&mut self, input: f64) -> f64 {
        let c = self.coeffs;
        let output = c.dc_gain() * input;
        self.state.z2 = c.b2 * input - c.a2 * output;
        self.state.z1 = c.b1 * input - c.a1 * output + self.state.z2;
        output
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state = BiquadState::default();
    }

    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }
}

/// Cascaded second-order sections filter
#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<BiquadFilter>,
    gain: f64,
}

impl SosFilter {
    pub fn new(sections: Vec<BiquadCoeffs>, gain: f64) -> Self {
        Self {
            sections: sections.into_iter().map(BiquadFilter::new).collect(),
            gain,
        }
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Process a single sample through all sections
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut output = input * self.gain;
        for section in &mut self.sections {
            output = section.process(output);
        }
        output
    }

    /// Process an entire signal array in-place
    pub fn process_signal(&mut self, signal: &mut [f64]) {
        for sample in signal.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Put every section in the steady state reached for a constant input
    pub fn prime(&mut self, input: f64) {
        let mut x = input * self.gain;
        for section in &mut self.sections {
            x = section.prime(x);
        }
    }

    /// Reset all section states
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Samples of odd extension added to each end by [`SosFilter::filtfilt`]
    pub fn padding_len(&self) -> usize {
        3 * (2 * self.sections.len() + 1)
    }

    /// Zero-phase filtering: run the cascade forward, then backward over the
    /// reversed output.
    ///
    /// Both ends are extended by point reflection (odd extension) and each pass
    /// starts from the steady state for its first sample, which keeps start-up
    /// transients out of the returned span.
    pub fn filtfilt(&self, signal: &[f64]) -> Result<Vec<f64>, ChannelError> {
        let n = signal.len();
        let padlen = self.padding_len();
        if n <= padlen {
            return Err(ChannelError::InsufficientSamples {
                required: padlen + 1,
                available: n,
            });
        }

        let first = signal[0];
        let last = signal[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * padlen);
        extended.extend((1..=padlen).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=padlen).map(|i| 2.0 * last - signal[n - 1 - i]));

        let mut filter = self.clone();

        filter.reset();
        filter.prime(extended[0]);
        filter.process_signal(&mut extended);

        extended.reverse();
        filter.reset();
        filter.prime(extended[0]);
        filter.process_signal(&mut extended);
        extended.reverse();

        Ok(extended[padlen..padlen + n].to_vec())
    }
}

/// Butterworth filter designer
pub struct ButterworthFilter;

impl ButterworthFilter {
    /// Design a Butterworth lowpass filter
    pub fn lowpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        let (sos, gain) = Self::design_lowpass(wn, order);
        SosFilter::new(sos, gain)
    }

    /// Design a Butterworth highpass filter
    pub fn highpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        let (sos, gain) = Self::design_highpass(wn, order);
        SosFilter::new(sos, gain)
    }

    /// Design a Butterworth bandpass filter
    pub fn bandpass(low: f64, high: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn_low = Self::prewarp(low, sample_rate);
        let wn_high = Self::prewarp(high, sample_rate);
        let (sos, gain) = Self::design_bandpass(wn_low, wn_high, order);
        SosFilter::new(sos, gain)
    }

    /// Prewarp frequency for bilinear transform
    fn prewarp(freq: f64, sample_rate: f64) -> f64 {
        (PI * freq / sample_rate).tan()
    }

    /// Damping term of the k-th conjugate pole pair: s^2 + d*s + 1
    fn pole_pair_damping(k: usize, order: usize) -> f64 {
        2.0 * (PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64)).sin()
    }

    /// Design lowpass second-order sections
    fn design_lowpass(wn: f64, order: usize) -> (Vec<BiquadCoeffs>, f64) {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            // For odd order, last section is first-order
            if order % 2 == 1 && k == num_sections - 1 {
                // First-order section: H(s) = wn / (s + wn)
                let k_coeff = wn / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let damping = Self::pole_pair_damping(k, order);
                let wn2 = wn * wn;
                let denom = 1.0 + damping * wn + wn2;

                sections.push(BiquadCoeffs {
                    b0: wn2 / denom,
                    b1: 2.0 * wn2 / denom,
                    b2: wn2 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - damping * wn + wn2) / denom,
                });
            }
        }

        (sections, 1.0)
    }

    /// Design highpass second-order sections
    fn design_highpass(wn: f64, order: usize) -> (Vec<BiquadCoeffs>, f64) {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            if order % 2 == 1 && k == num_sections - 1 {
                // First-order highpass: H(s) = s / (s + wn)
                let k_coeff = 1.0 / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: -k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let damping = Self::pole_pair_damping(k, order);
                let wn2 = wn * wn;
                let denom = 1.0 + damping * wn + wn2;

                sections.push(BiquadCoeffs {
                    b0: 1.0 / denom,
                    b1: -2.0 / denom,
                    b2: 1.0 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - damping * wn + wn2) / denom,
                });
            }
        }

        (sections, 1.0)
    }

    /// Design bandpass second-order sections
    fn design_bandpass(wn_low: f64, wn_high: f64, order: usize) -> (Vec<BiquadCoeffs>, f64) {
        // Bandpass = cascade of highpass and lowpass
        let (hp_sos, hp_gain) = Self::design_highpass(wn_low, order);
        let (lp_sos, lp_gain) = Self::design_lowpass(wn_high, order);

        let mut sections = hp_sos;
        sections.extend(lp_sos);

        (sections, hp_gain * lp_gain)
    }
}

/// Subtract the arithmetic mean from every sample
pub fn demean(signal: &[f64]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }
    // A constant signal is exactly zero after de-meaning; the mean of n equal
    // values can be off by an ulp, which would leave a spurious residue.
    if signal.iter().all(|&x| x == signal[0]) {
        return vec![0.0; signal.len()];
    }
    let mean = signal.iter().sum::<f64>() / signal.len() as f64;
    signal.iter().map(|&x| x - mean).collect()
}

/// De-meaning followed by zero-phase Butterworth band-pass
#[derive(Debug, Clone)]
pub struct FilterStage {
    low_hz: f64,
    high_hz: f64,
    order: usize,
}

impl FilterStage {
    pub fn new(low_hz: f64, high_hz: f64, order: usize) -> Self {
        Self {
            low_hz,
            high_hz,
            order,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.broadband_low_hz,
            config.broadband_high_hz,
            config.filter_order,
        )
    }

    /// Design the band-pass cascade for a sample rate, rejecting rates whose
    /// Nyquist frequency does not clear the high corner
    pub fn design(&self, sample_rate: f64) -> Result<SosFilter, ChannelError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ChannelError::InvalidSampleRate {
                sample_rate,
                reason: "sample rate must be a positive number".to_string(),
            });
        }

        let nyquist = sample_rate / 2.0;
        if self.high_hz >= nyquist {
            return Err(ChannelError::InvalidSampleRate {
                sample_rate,
                reason: format!(
                    "high cutoff ({} Hz) must be less than Nyquist ({} Hz)",
                    self.high_hz, nyquist
                ),
            });
        }
        if self.low_hz >= self.high_hz {
            return Err(ChannelError::InvalidSampleRate {
                sample_rate,
                reason: format!(
                    "low cutoff ({} Hz) must be less than high cutoff ({} Hz)",
                    self.low_hz, self.high_hz
                ),
            });
        }

        Ok(ButterworthFilter::bandpass(
            self.low_hz,
            self.high_hz,
            sample_rate,
            self.order,
        ))
    }

    pub fn apply(&self, samples: &[f64], sample_rate: f64) -> Result<Vec<f64>, ChannelError> {
        let bandpass = self.design(sample_rate)?;
        bandpass.filtfilt(&demean(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, seconds: f64, amplitude: f64) -> Vec<f64> {
        let n = (sample_rate * seconds) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    fn rms(signal: &[f64]) -> f64 {
        (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
    }

    #[test]
    fn test_lowpass_filter() {
        let mut filter = ButterworthFilter::lowpass(10.0, 100.0, 2);

        // DC should pass through once settled
        let mut out = 0.0;
        for _ in 0..200 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_highpass_filter() {
        let mut filter = ButterworthFilter::highpass(1.0, 256.0, 4);

        // DC is rejected once settled
        let mut out = 1.0;
        for _ in 0..5000 {
            out = filter.process(1.0);
        }
        assert!(out.abs() < 1e-6, "dc output = {}", out);

        // Well above the corner the amplitude is kept
        filter.reset();
        let mut signal = sine(30.0, 256.0, 4.0, 1.0);
        filter.process_signal(&mut signal);
        let tail = rms(&signal[512..]);
        assert!((tail - 1.0 / 2f64.sqrt()).abs() < 0.01, "rms = {}", tail);
    }

    #[test]
    fn test_sections_are_stable() {
        let filter = ButterworthFilter::bandpass(1.0, 45.0, 256.0, 4);
        assert_eq!(filter.num_sections(), 4);
        for section in &filter.sections {
            let c = section.coeffs();
            // Stability triangle for a2 + a1 z^-1 + 1
            assert!(c.a2.abs() < 1.0, "a2 = {}", c.a2);
            assert!(c.a1.abs() < 1.0 + c.a2, "a1 = {}, a2 = {}", c.a1, c.a2);
        }
    }

    #[test]
    fn test_odd_order_design() {
        let mut filter = ButterworthFilter::lowpass(5.0, 100.0, 3);
        assert_eq!(filter.num_sections(), 2);
        let mut out = 0.0;
        for _ in 0..500 {
            out = filter.process(2.0);
        }
        assert!((out - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_prime_matches_settled_state() {
        let mut settled = ButterworthFilter::lowpass(10.0, 256.0, 4);
        for _ in 0..5000 {
            settled.process(3.0);
        }
        let mut primed = ButterworthFilter::lowpass(10.0, 256.0, 4);
        primed.prime(3.0);
        assert!((settled.process(3.0) - primed.process(3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_demean() {
        let out = demean(&[1.0, 2.0, 3.0, 6.0]);
        assert_eq!(out, vec![-2.0, -1.0, 0.0, 3.0]);
        assert_eq!(demean(&[0.1; 7]), vec![0.0; 7]);
        assert!(demean(&[]).is_empty());
    }

    #[test]
    fn test_filtfilt_has_no_phase_shift() {
        let fs = 256.0;
        let signal = sine(10.0, fs, 10.0, 1.0);
        let filtered = FilterStage::new(1.0, 45.0, 4).apply(&signal, fs).unwrap();
        assert_eq!(filtered.len(), signal.len());

        let interior = 512..signal.len() - 512;
        let max_err = interior
            .map(|i| (filtered[i] - signal[i]).abs())
            .fold(0.0, f64::max);
        assert!(max_err < 0.02, "max deviation {}", max_err);
    }

    #[test]
    fn test_band_limits() {
        let fs = 256.0;
        let stage = FilterStage::new(1.0, 45.0, 4);

        let fast = sine(80.0, fs, 10.0, 1.0);
        let filtered = stage.apply(&fast, fs).unwrap();
        assert!(rms(&filtered[512..2048]) < 0.05 * rms(&fast[512..2048]));

        let drift = sine(0.1, fs, 10.0, 1.0);
        let filtered = stage.apply(&drift, fs).unwrap();
        assert!(rms(&filtered[512..2048]) < 0.1 * rms(&drift));
    }

    #[test]
    fn test_dc_offset_removed() {
        let fs = 256.0;
        let signal: Vec<f64> = sine(12.0, fs, 8.0, 1.0).iter().map(|x| x + 250.0).collect();
        let filtered = FilterStage::new(1.0, 45.0, 4).apply(&signal, fs).unwrap();
        let mean = filtered.iter().sum::<f64>() / filtered.len() as f64;
        assert!(mean.abs() < 0.01);
    }

    #[test]
    fn test_invalid_sample_rates() {
        let stage = FilterStage::new(1.0, 45.0, 4);
        for fs in [50.0, 90.0, 0.0, -256.0, f64::NAN] {
            match stage.design(fs) {
                Err(ChannelError::InvalidSampleRate { .. }) => {}
                other => panic!("expected InvalidSampleRate for {} Hz, got {:?}", fs, other),
            }
        }
        assert!(stage.design(91.0).is_ok());
    }

    #[test]
    fn test_short_signal_rejected() {
        let stage = FilterStage::new(1.0, 45.0, 4);
        let result = stage.apply(&[0.5; 20], 256.0);
        assert_eq!(
            result,
            Err(ChannelError::InsufficientSamples {
                required: 28,
                available: 20
            })
        );
    }
}
