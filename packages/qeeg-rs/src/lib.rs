pub mod analysis;
pub mod config;
pub mod error;
pub mod extraction;
pub mod interpretation;
pub mod profiling;
pub mod recording;
pub mod regions;
pub mod report;
pub mod signal_processing;
pub mod types;
pub mod visualization;

pub use analysis::{analyze_channel, analyze_recording, ChannelAnalyzer};
pub use config::AnalysisConfig;
pub use error::{ChannelError, QeegError, Result};
pub use extraction::{extract_text, ExtractedDocument};
pub use interpretation::interpret;
pub use recording::{open_recording, InMemoryRecording, RecordingSource};
pub use regions::{BrodmannAnnotator, RegionAnnotator};
pub use report::{ReportAssembler, ReportInput, ReportPaths};
pub use types::*;
pub use visualization::render_band_chart;
