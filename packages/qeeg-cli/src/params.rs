use crate::cli::AnalysisOptions;
use qeeg_rs::{AnalysisConfig, QeegError};
use std::path::Path;

/// Build the analysis configuration: JSON file first, then command-line overrides.
pub fn build_config(options: &AnalysisOptions) -> Result<AnalysisConfig, QeegError> {
    let mut config = match &options.config {
        Some(path) => AnalysisConfig::from_json_file(path).map_err(|e| match e {
            QeegError::InvalidConfig(_) | QeegError::InvalidBand(_) => e,
            other => QeegError::InvalidConfig(format!("{}: {}", path, other)),
        })?,
        None => AnalysisConfig::default(),
    };

    if let Some(window) = options.window_seconds {
        config.window_seconds = window;
    }
    if let Some(overlap) = options.overlap {
        config.overlap = overlap;
    }
    if let Some(threshold) = options.threshold {
        config.interpretation_threshold = threshold;
    }
    if options.sequential {
        config.parallel = false;
    }

    config.validate()?;
    Ok(config)
}

/// File name shown in reports and progress messages
pub fn recording_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Check the input exists before opening it, for a clearer message than the reader gives.
pub fn check_input(path: &str) -> Result<(), QeegError> {
    if Path::new(path).is_file() {
        Ok(())
    } else {
        Err(QeegError::UnreadableRecording(format!(
            "File not found: {}",
            path
        )))
    }
}
