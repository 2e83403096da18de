use crate::cli::AnalyzeArgs;
use crate::commands::{outcome_exit_code, report_failures};
use crate::exit_codes;
use crate::output;
use crate::params;
use qeeg_rs::types::{AnalysisOutcome, AnnotationEvent};
use qeeg_rs::{analyze_recording, interpret, open_recording, BrodmannAnnotator};
use serde::Serialize;

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    file: String,
    #[serde(flatten)]
    outcome: &'a AnalysisOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<Vec<AnnotationEvent>>,
}

pub fn execute(args: AnalyzeArgs) -> i32 {
    let config = match params::build_config(&args.options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if let Err(e) = params::check_input(&args.file) {
        eprintln!("Error: {}", e);
        return exit_codes::INPUT_ERROR;
    }

    let mut recording = match open_recording(&args.file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if !args.quiet {
        eprintln!(
            "Analyzing {} ({} recording)...",
            params::recording_name(&args.file),
            recording.format_name()
        );
    }

    let outcome = match analyze_recording(recording.as_mut(), &config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if !args.quiet {
        report_failures(&outcome);
        eprintln!(
            "Analyzed {} channel(s), {} failed",
            outcome.result.len(),
            outcome.failures.len()
        );
    }

    let annotations = args
        .annotate
        .then(|| interpret(&outcome.result, &BrodmannAnnotator, config.interpretation_threshold));

    let result = AnalyzeOutput {
        file: args.file.clone(),
        outcome: &outcome,
        annotations,
    };

    if !output::emit(&result, args.compact, args.output.as_deref()) {
        return exit_codes::EXECUTION_ERROR;
    }

    if let Some(ref path) = args.output {
        if !args.quiet {
            eprintln!("Results written to {}", path);
        }
    }

    outcome_exit_code(&outcome)
}
