#![allow(dead_code)]

use qeeg_rs::recording::{EdfChannel, EdfWriter};
use std::f64::consts::PI;
use std::path::Path;

pub fn sine(freq: f64, sample_rate: f64, seconds: f64, amplitude: f64) -> Vec<f64> {
    let n = (sample_rate * seconds) as usize;
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq * i as f64 / sample_rate).sin())
        .collect()
}

/// Sum of sines given as (frequency, amplitude) pairs
pub fn mixture(components: &[(f64, f64)], sample_rate: f64, seconds: f64) -> Vec<f64> {
    let n = (sample_rate * seconds) as usize;
    let mut out = vec![0.0; n];
    for &(freq, amplitude) in components {
        for (slot, value) in out.iter_mut().zip(sine(freq, sample_rate, seconds, amplitude)) {
            *slot += value;
        }
    }
    out
}

/// Deterministic broadband noise (linear congruential generator)
pub fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
        })
        .collect()
}

/// Write a synthetic EDF with one-second records
pub fn write_edf(path: &Path, channels: &[(&str, usize, Vec<f64>)]) {
    let channels: Vec<EdfChannel> = channels
        .iter()
        .map(|(label, rate, samples)| EdfChannel::new(*label, *rate, samples.clone()))
        .collect();
    EdfWriter::write_recording(path, &channels).expect("failed to write synthetic EDF");
}
