use crate::cli::ReportArgs;
use crate::commands::{outcome_exit_code, report_failures};
use crate::exit_codes;
use crate::output;
use crate::params;
use qeeg_rs::{
    analyze_recording, extract_text, interpret, open_recording, BrodmannAnnotator,
    ExtractedDocument, ReportAssembler, ReportInput, ReportPaths,
};
use serde::Serialize;

#[derive(Serialize)]
struct ReportOutput {
    file: String,
    #[serde(flatten)]
    paths: ReportPaths,
    findings: usize,
    failed_channels: Vec<String>,
    skipped_documents: Vec<String>,
}

pub fn execute(args: ReportArgs) -> i32 {
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

    let recording_name = params::recording_name(&args.file);

    let mut recording = match open_recording(&args.file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if !args.quiet {
        eprintln!("Analyzing {}...", recording_name);
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
    }

    let events = interpret(&outcome.result, &BrodmannAnnotator, config.interpretation_threshold);

    let mut documents: Vec<ExtractedDocument> = Vec::new();
    let mut skipped: Vec<(String, String)> = Vec::new();
    for attachment in &args.attach {
        match extract_text(attachment) {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                log::warn!("Skipping attachment {}: {}", attachment, e);
                if !args.quiet {
                    eprintln!("Warning: skipping attachment {}: {}", attachment, e);
                }
                skipped.push((params::recording_name(attachment), e.to_string()));
            }
        }
    }

    let input = ReportInput {
        recording_name: &recording_name,
        outcome: &outcome,
        events: &events,
        documents: &documents,
        skipped_documents: &skipped,
        preview_chars: config.preview_chars,
        threshold: config.interpretation_threshold,
    };

    let paths = match ReportAssembler::new().and_then(|a| a.write_reports(&input, &args.output_dir)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Report generation failed: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    if args.json {
        let result = ReportOutput {
            file: args.file.clone(),
            paths,
            findings: events.len(),
            failed_channels: outcome.failed_labels().into_iter().map(String::from).collect(),
            skipped_documents: skipped.into_iter().map(|(name, _)| name).collect(),
        };
        if !output::emit(&result, false, None) {
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!("Clinical report: {}", paths.clinical.display());
        println!("Patient report:  {}", paths.patient.display());
        println!("Band charts:     {}", paths.charts.len());
        println!("Findings:        {}", events.len());
    }

    outcome_exit_code(&outcome)
}
