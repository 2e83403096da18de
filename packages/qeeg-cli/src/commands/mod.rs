pub mod analyze;
pub mod bands;
pub mod report;
pub mod validate;

use crate::exit_codes;
use qeeg_rs::types::AnalysisOutcome;

/// Exit code for a finished analysis: every channel failing is an error, some failing is partial
pub(crate) fn outcome_exit_code(outcome: &AnalysisOutcome) -> i32 {
    if outcome.result.is_empty() && !outcome.failures.is_empty() {
        exit_codes::EXECUTION_ERROR
    } else if outcome.is_partial() {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::SUCCESS
    }
}

pub(crate) fn report_failures(outcome: &AnalysisOutcome) {
    for failure in &outcome.failures {
        eprintln!("Warning: channel {} skipped: {}", failure.channel, failure.message);
    }
}
