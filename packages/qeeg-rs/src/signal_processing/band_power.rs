use super::welch::PowerSpectrum;
use crate::config::AnalysisConfig;
use crate::types::{ChannelBandProfile, FrequencyBand};

/// Trapezoidal integral of `y` over the sample points `x`
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Integrate the PSD over the bins whose frequency lies inside `band`
/// (edges inclusive). Fewer than two bins integrate to 0.
pub fn band_power(frequencies: &[f64], psd: &[f64], band: &FrequencyBand) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = frequencies
        .iter()
        .zip(psd)
        .filter(|(f, _)| band.contains(**f))
        .map(|(&f, &p)| (f, p))
        .unzip();

    if xs.len() < 2 {
        return 0.0;
    }
    trapezoid(&xs, &ys)
}

/// `band_power / broadband_power`, or 0 when the broadband power is not positive
pub fn relative_power(band_power: f64, broadband_power: f64) -> f64 {
    if broadband_power > 0.0 {
        band_power / broadband_power
    } else {
        0.0
    }
}

/// Turns a spectrum into a per-band relative power profile
#[derive(Debug, Clone)]
pub struct BandPowerIntegrator {
    broadband: FrequencyBand,
    bands: Vec<FrequencyBand>,
}

impl BandPowerIntegrator {
    pub fn new(broadband: FrequencyBand, bands: Vec<FrequencyBand>) -> Self {
        Self { broadband, bands }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.broadband(), config.bands.clone())
    }

    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    pub fn profile(&self, spectrum: &PowerSpectrum) -> ChannelBandProfile {
        let total = band_power(&spectrum.frequencies, &spectrum.psd, &self.broadband);
        let mut profile = ChannelBandProfile::new(total);
        for band in &self.bands {
            let power = band_power(&spectrum.frequencies, &spectrum.psd, band);
            profile.push(band.name.clone(), relative_power(power, total));
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{broadband, canonical_bands};

    fn flat_spectrum(resolution: f64, n_bins: usize, level: f64) -> PowerSpectrum {
        PowerSpectrum {
            frequencies: (0..n_bins).map(|k| k as f64 * resolution).collect(),
            psd: vec![level; n_bins],
            segments: 1,
        }
    }

    #[test]
    fn test_trapezoid() {
        assert_eq!(trapezoid(&[0.0, 1.0, 2.0], &[0.0, 2.0, 2.0]), 3.0);
        assert_eq!(trapezoid(&[1.0], &[5.0]), 0.0);
        assert_eq!(trapezoid(&[], &[]), 0.0);
    }

    #[test]
    fn test_band_power_on_flat_spectrum() {
        let spectrum = flat_spectrum(0.5, 257, 2.0);
        let alpha = FrequencyBand::new("Alpha", 8.0, 12.0).unwrap();
        let power = band_power(&spectrum.frequencies, &spectrum.psd, &alpha);
        assert!((power - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_band_with_single_bin_is_zero() {
        let spectrum = flat_spectrum(1.0, 64, 1.0);
        let narrow = FrequencyBand::new("Narrow", 9.5, 10.5).unwrap();
        assert_eq!(band_power(&spectrum.frequencies, &spectrum.psd, &narrow), 0.0);
    }

    #[test]
    fn test_relative_power_zero_broadband() {
        assert_eq!(relative_power(3.0, 0.0), 0.0);
        assert_eq!(relative_power(3.0, -1.0), 0.0);
        assert_eq!(relative_power(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_profile_follows_band_order() {
        let integrator = BandPowerIntegrator::new(broadband(), canonical_bands().to_vec());
        let profile = integrator.profile(&flat_spectrum(0.5, 257, 1.0));
        let names: Vec<&str> = profile.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Delta", "Theta", "Alpha", "Beta", "High Beta"]);
        assert!((profile.broadband_power() - 44.0).abs() < 1e-12);
        assert!((profile.get("Beta").unwrap() - 18.0 / 44.0).abs() < 1e-12);
        // Adjacent bands share their edge bin, so the sum is exactly 1 on a flat PSD
        let sum: f64 = profile.iter().map(|(_, v)| v).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_of_silent_channel() {
        let integrator = BandPowerIntegrator::new(broadband(), canonical_bands().to_vec());
        let profile = integrator.profile(&flat_spectrum(0.5, 257, 0.0));
        assert!(profile.is_zero_broadband());
        assert!(profile.iter().all(|(_, v)| v == 0.0));
    }
}
