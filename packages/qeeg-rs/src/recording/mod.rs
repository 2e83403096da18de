//! Recording Sources Module
//!
//! Every format the analysis can consume implements [`RecordingSource`].
//! New formats are added by implementing the trait and registering the
//! extension in [`open_recording`].

use crate::error::{QeegError, Result};
use std::path::Path;

pub mod edf;
pub mod memory;

pub use edf::{EdfChannel, EdfHeader, EdfRecording, EdfSignalHeader, EdfWriter};
pub use memory::InMemoryRecording;

/// Channel-wise access to a multi-channel recording
pub trait RecordingSource: Send {
    /// Number of analyzable channels
    fn channel_count(&self) -> Result<usize>;

    /// Channel labels in recording order
    fn labels(&self) -> Result<Vec<String>>;

    /// Sample rate of channel `index` in Hz
    fn sample_rate(&self, index: usize) -> Result<f64>;

    /// All physical samples of channel `index`
    fn read_samples(&mut self, index: usize) -> Result<Vec<f64>>;

    /// Release the underlying resource. Further reads fail.
    fn close(&mut self) -> Result<()>;

    /// Format name (e.g. "EDF")
    fn format_name(&self) -> &str;
}

/// Extensions [`open_recording`] can read
pub fn supported_extensions() -> Vec<&'static str> {
    vec!["edf"]
}

/// Extensions that are recognized but cannot be read yet
pub fn recognized_unsupported_extensions() -> Vec<&'static str> {
    vec!["bdf"]
}

/// Check if a file extension can be analyzed
pub fn is_supported(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| supported_extensions().contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Open a recording file, choosing the reader by extension
pub fn open_recording<P: AsRef<Path>>(path: P) -> Result<Box<dyn RecordingSource>> {
    let path = path.as_ref();
    let extension = extension_of(path).unwrap_or_default();

    match extension.as_str() {
        "edf" => Ok(Box::new(EdfRecording::open(path)?)),
        "bdf" => Err(QeegError::UnsupportedFormat(
            "BDF (24-bit) recordings are not supported; convert to EDF".to_string(),
        )),
        _ => Err(QeegError::UnsupportedFormat(format!(
            "Unsupported file extension: '{}'",
            extension
        ))),
    }
}
