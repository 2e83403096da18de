use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use qeeg_rs::recording::{is_supported, open_recording, supported_extensions};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    supported: bool,
    format: Option<String>,
    channels: Vec<String>,
    sample_rates: Vec<f64>,
    error: Option<String>,
}

struct RecordingSummary {
    format: String,
    channels: Vec<String>,
    sample_rates: Vec<f64>,
}

fn inspect(path: &Path) -> qeeg_rs::Result<RecordingSummary> {
    let mut recording = open_recording(path)?;
    let channels = recording.labels()?;
    let sample_rates = (0..recording.channel_count()?)
        .map(|i| recording.sample_rate(i))
        .collect::<qeeg_rs::Result<Vec<f64>>>()?;
    let format = recording.format_name().to_string();
    recording.close()?;
    Ok(RecordingSummary {
        format,
        channels,
        sample_rates,
    })
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.file);
    let exists = path.is_file();
    let supported = is_supported(path);

    let inspected = if !exists {
        Err(format!("File not found: {}", args.file))
    } else if !supported {
        Err(format!(
            "Unsupported file extension '{}'. Supported: {}",
            path.extension().and_then(|e| e.to_str()).unwrap_or(""),
            supported_extensions().join(", ")
        ))
    } else {
        inspect(path).map_err(|e| e.to_string())
    };

    let (summary, error) = match inspected {
        Ok(s) => (Some(s), None),
        Err(e) => (None, Some(e)),
    };

    let result = ValidateOutput {
        file: args.file.clone(),
        exists,
        supported,
        format: summary.as_ref().map(|s| s.format.clone()),
        channels: summary.as_ref().map(|s| s.channels.clone()).unwrap_or_default(),
        sample_rates: summary.as_ref().map(|s| s.sample_rates.clone()).unwrap_or_default(),
        error: error.clone(),
    };

    if args.json {
        if !output::emit(&result, false, None) {
            return exit_codes::EXECUTION_ERROR;
        }
    } else if let Some(ref err) = error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "File '{}' is valid ({}, {} channels)",
            args.file,
            result.format.as_deref().unwrap_or_default(),
            result.channels.len()
        );
        for (label, rate) in result.channels.iter().zip(&result.sample_rates) {
            println!("  {:<16} {:>8.1} Hz", label, rate);
        }
    }

    if error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
