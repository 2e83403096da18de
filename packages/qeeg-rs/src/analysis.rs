//! Channel analysis orchestration.
//!
//! Reads every channel of a [`RecordingSource`] once, then runs
//! filter -> Welch PSD -> band integration per channel. Per-channel failures
//! are collected next to the successful profiles; only an unreadable
//! recording aborts the analysis.

use crate::config::AnalysisConfig;
use crate::error::{ChannelError, QeegError, Result};
use crate::profile_scope;
use crate::recording::RecordingSource;
use crate::signal_processing::{BandPowerIntegrator, FilterStage, WelchEstimator};
use crate::types::{AnalysisOutcome, AnalysisResult, ChannelBandProfile, ChannelFailure};
use rayon::prelude::*;

/// Raw channel data as read from the source
#[derive(Debug, Clone)]
struct ChannelData {
    label: String,
    sample_rate: f64,
    samples: Vec<f64>,
}

/// Single-channel pipeline: filter, estimate, integrate
#[derive(Debug, Clone)]
pub struct ChannelAnalyzer {
    filter: FilterStage,
    estimator: WelchEstimator,
    integrator: BandPowerIntegrator,
}

impl ChannelAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            filter: FilterStage::from_config(config),
            estimator: WelchEstimator::from_config(config),
            integrator: BandPowerIntegrator::from_config(config),
        }
    }

    pub fn analyze(
        &self,
        samples: &[f64],
        sample_rate: f64,
    ) -> std::result::Result<ChannelBandProfile, ChannelError> {
        let filtered = self.filter.apply(samples, sample_rate)?;
        let spectrum = self.estimator.estimate(&filtered, sample_rate)?;
        Ok(self.integrator.profile(&spectrum))
    }
}

/// Analyze one channel with the given configuration
pub fn analyze_channel(
    samples: &[f64],
    sample_rate: f64,
    config: &AnalysisConfig,
) -> std::result::Result<ChannelBandProfile, ChannelError> {
    ChannelAnalyzer::new(config).analyze(samples, sample_rate)
}

/// Make labels unique: the n-th repeat of a label becomes `label#n` (n >= 2)
pub fn disambiguate_labels(labels: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if !unique.contains(&label) {
            unique.push(label);
            continue;
        }
        let occurrences = unique
            .iter()
            .filter(|l| is_occurrence_of(l, &label))
            .count();
        let mut n = occurrences + 1;
        let mut candidate = format!("{}#{}", label, n);
        while unique.contains(&candidate) {
            n += 1;
            candidate = format!("{}#{}", label, n);
        }
        log::warn!("Duplicate channel label '{}' renamed to '{}'", label, candidate);
        unique.push(candidate);
    }
    unique
}

/// `candidate` is `label` itself or `label#<n>` with a numeric `n`
fn is_occurrence_of(candidate: &str, label: &str) -> bool {
    match candidate.strip_prefix(label) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('#')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

/// Closes the source when dropped, whichever way the analysis exits
struct OpenRecording<'a, R: RecordingSource + ?Sized> {
    source: &'a mut R,
}

impl<R: RecordingSource + ?Sized> Drop for OpenRecording<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.source.close() {
            log::warn!("Failed to close {} recording: {}", self.source.format_name(), e);
        }
    }
}

fn unreadable(e: QeegError) -> QeegError {
    match e {
        QeegError::UnreadableRecording(_) => e,
        other => QeegError::UnreadableRecording(other.to_string()),
    }
}

fn read_channels<R: RecordingSource + ?Sized>(source: &mut R) -> Result<Vec<ChannelData>> {
    let count = source.channel_count().map_err(unreadable)?;
    let labels = source.labels().map_err(unreadable)?;
    if labels.len() != count {
        return Err(QeegError::UnreadableRecording(format!(
            "source reports {} channels but {} labels",
            count,
            labels.len()
        )));
    }

    disambiguate_labels(labels)
        .into_iter()
        .enumerate()
        .map(|(index, label)| {
            let sample_rate = source.sample_rate(index).map_err(unreadable)?;
            let samples = source.read_samples(index).map_err(unreadable)?;
            Ok(ChannelData {
                label,
                sample_rate,
                samples,
            })
        })
        .collect()
}

/// Run the full per-channel analysis over a recording.
///
/// The source is closed before returning, on success and on error.
pub fn analyze_recording<R: RecordingSource + ?Sized>(
    source: &mut R,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome> {
    profile_scope!("analyze_recording");
    let mut guard = OpenRecording { source };
    config.validate()?;

    let channels = read_channels(&mut *guard.source)?;
    drop(guard);

    log::info!(
        "Analyzing {} channels ({} bands, {}s window)",
        channels.len(),
        config.bands.len(),
        config.window_seconds
    );

    let analyzer = ChannelAnalyzer::new(config);
    let analyze = |channel: &ChannelData| {
        let outcome = analyzer.analyze(&channel.samples, channel.sample_rate);
        if let Ok(profile) = &outcome {
            log::debug!(
                "{}: {} Hz, {} samples, broadband power {:.6e}",
                channel.label,
                channel.sample_rate,
                channel.samples.len(),
                profile.broadband_power()
            );
        }
        outcome
    };

    // Collected in index order, independent of completion order
    let outcomes: Vec<std::result::Result<ChannelBandProfile, ChannelError>> = if config.parallel
    {
        channels.par_iter().map(analyze).collect()
    } else {
        channels.iter().map(analyze).collect()
    };

    let mut result = AnalysisResult::new();
    let mut failures = Vec::new();
    for (channel, outcome) in channels.into_iter().zip(outcomes) {
        match outcome {
            Ok(profile) => {
                if profile.is_zero_broadband() {
                    log::warn!(
                        "{}: zero broadband power, relative powers reported as 0",
                        channel.label
                    );
                }
                result.insert(channel.label, profile);
            }
            Err(e) => {
                log::warn!("{}: channel skipped: {}", channel.label, e);
                failures.push(ChannelFailure::new(channel.label, e));
            }
        }
    }

    log::info!(
        "Analysis finished: {} channels analyzed, {} failed",
        result.len(),
        failures.len()
    );

    Ok(AnalysisOutcome::new(result, failures, config.bands.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::InMemoryRecording;
    use std::f64::consts::PI;

    fn sine(freq: f64, sample_rate: f64, seconds: f64) -> Vec<f64> {
        let n = (sample_rate * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    /// Source whose reads always fail, recording whether it was closed
    struct BrokenSource {
        closed: bool,
    }

    impl RecordingSource for BrokenSource {
        fn channel_count(&self) -> Result<usize> {
            Ok(1)
        }
        fn labels(&self) -> Result<Vec<String>> {
            Ok(vec!["Cz".to_string()])
        }
        fn sample_rate(&self, _index: usize) -> Result<f64> {
            Ok(256.0)
        }
        fn read_samples(&mut self, _index: usize) -> Result<Vec<f64>> {
            Err(QeegError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "short read",
            )))
        }
        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
        fn format_name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_disambiguate_labels() {
        let labels = ["Fp1", "Fp2", "Fp1", "Fp1", "Cz"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            disambiguate_labels(labels),
            vec!["Fp1", "Fp2", "Fp1#2", "Fp1#3", "Cz"]
        );
    }

    #[test]
    fn test_disambiguate_avoids_existing_suffix() {
        let labels = ["A", "A#2", "A"].iter().map(|s| s.to_string()).collect();
        let unique = disambiguate_labels(labels);
        assert_eq!(unique[0], "A");
        assert_eq!(unique[1], "A#2");
        assert_eq!(unique[2], "A#3");
    }

    #[test]
    fn test_disambiguate_keeps_unique_labels_sharing_a_prefix() {
        let labels = ["A#B", "A", "A#2", "A"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(disambiguate_labels(labels), vec!["A#B", "A", "A#2", "A#3"]);
    }

    #[test]
    fn test_analyze_channel_alpha() {
        let profile = analyze_channel(&sine(10.0, 256.0, 10.0), 256.0, &AnalysisConfig::default())
            .unwrap();
        assert!(profile.get("Alpha").unwrap() > 0.95);
    }

    #[test]
    fn test_source_closed_after_analysis() {
        let mut recording =
            InMemoryRecording::new().with_channel("O1", 256.0, sine(10.0, 256.0, 4.0));
        analyze_recording(&mut recording, &AnalysisConfig::default()).unwrap();
        assert!(recording.is_closed());
    }

    #[test]
    fn test_read_failure_is_fatal_and_closes() {
        let mut source = BrokenSource { closed: false };
        let err = analyze_recording(&mut source, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, QeegError::UnreadableRecording(_)));
        assert!(source.closed);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut recording = InMemoryRecording::new();
        let mut config = AnalysisConfig::default();
        config.overlap = 2.0;
        assert!(matches!(
            analyze_recording(&mut recording, &config),
            Err(QeegError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duplicate_labels_kept_apart() {
        let mut recording = InMemoryRecording::new()
            .with_channel("T3", 256.0, sine(10.0, 256.0, 4.0))
            .with_channel("T3", 256.0, sine(6.0, 256.0, 4.0));
        let outcome = analyze_recording(&mut recording, &AnalysisConfig::default()).unwrap();
        let labels: Vec<&str> = outcome.result.labels().collect();
        assert_eq!(labels, vec!["T3", "T3#2"]);
        assert!(outcome.result.get("T3#2").unwrap().get("Theta").unwrap() > 0.9);
    }
}
