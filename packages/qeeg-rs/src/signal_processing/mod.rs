//! Signal Processing Module
//!
//! Per-channel spectral pipeline:
//! - De-meaning and zero-phase Butterworth band-pass (1-45 Hz by default)
//! - Welch power spectral density
//! - Trapezoidal band power and relative power
//!
//! All IIR filtering uses second-order sections (biquads) for numerical stability.

mod band_power;
mod filters;
mod welch;

pub use band_power::{band_power, relative_power, trapezoid, BandPowerIntegrator};
pub use filters::{
    demean, BiquadCoeffs, BiquadFilter, ButterworthFilter, FilterStage, SosFilter,
};
pub use welch::{hann_periodic, PowerSpectrum, WelchEstimator};
