use super::RecordingSource;
use crate::error::{QeegError, Result};

/// A recording held in memory: one `(label, sample_rate, samples)` per channel
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecording {
    channels: Vec<(String, f64, Vec<f64>)>,
    closed: bool,
}

impl InMemoryRecording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, label: impl Into<String>, sample_rate: f64, samples: Vec<f64>) -> Self {
        self.push_channel(label, sample_rate, samples);
        self
    }

    pub fn push_channel(&mut self, label: impl Into<String>, sample_rate: f64, samples: Vec<f64>) {
        self.channels.push((label.into(), sample_rate, samples));
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn channel(&self, index: usize) -> Result<&(String, f64, Vec<f64>)> {
        if self.closed {
            return Err(QeegError::UnreadableRecording(
                "recording is closed".to_string(),
            ));
        }
        self.channels.get(index).ok_or_else(|| {
            QeegError::UnreadableRecording(format!(
                "channel index {} out of bounds ({} channels)",
                index,
                self.channels.len()
            ))
        })
    }
}

impl RecordingSource for InMemoryRecording {
    fn channel_count(&self) -> Result<usize> {
        Ok(self.channels.len())
    }

    fn labels(&self) -> Result<Vec<String>> {
        Ok(self.channels.iter().map(|(label, _, _)| label.clone()).collect())
    }

    fn sample_rate(&self, index: usize) -> Result<f64> {
        self.channel(index).map(|(_, rate, _)| *rate)
    }

    fn read_samples(&mut self, index: usize) -> Result<Vec<f64>> {
        self.channel(index).map(|(_, _, samples)| samples.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn format_name(&self) -> &str {
        "memory"
    }
}
