mod common;

use common::{mixture, sine, write_edf};
use qeeg_rs::extraction::extract_text;
use qeeg_rs::report::{CLINICAL_REPORT_FILE, PATIENT_REPORT_FILE};
use qeeg_rs::{
    analyze_recording, interpret, open_recording, AnalysisConfig, BrodmannAnnotator,
    ReportAssembler, ReportInput,
};

#[test]
fn test_edf_round_trip_alpha_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.edf");
    write_edf(
        &path,
        &[
            ("O1", 256, sine(10.0, 256.0, 10.0, 40.0)),
            ("Fp1", 128, mixture(&[(2.0, 30.0), (10.0, 5.0)], 128.0, 10.0)),
        ],
    );

    let mut recording = open_recording(&path).unwrap();
    assert_eq!(recording.format_name(), "EDF");
    assert_eq!(recording.labels().unwrap(), vec!["O1", "Fp1"]);
    assert_eq!(recording.sample_rate(0).unwrap(), 256.0);
    assert_eq!(recording.sample_rate(1).unwrap(), 128.0);

    let outcome = analyze_recording(recording.as_mut(), &AnalysisConfig::default()).unwrap();
    assert!(outcome.is_complete());

    let o1 = outcome.result.get("O1").unwrap();
    assert!((o1.get("Alpha").unwrap() - 1.0).abs() < 0.05);
    let fp1 = outcome.result.get("Fp1").unwrap();
    assert!(fp1.get("Delta").unwrap() > 0.9);

    // The source was closed by the analysis
    assert!(recording.read_samples(0).is_err());
}

#[test]
fn test_partial_failure_from_edf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed_rates.edf");
    write_edf(
        &path,
        &[
            ("C3", 50, sine(10.0, 50.0, 10.0, 20.0)),
            ("C4", 256, sine(10.0, 256.0, 10.0, 20.0)),
        ],
    );

    let mut recording = open_recording(&path).unwrap();
    let outcome = analyze_recording(recording.as_mut(), &AnalysisConfig::default()).unwrap();
    assert!(outcome.is_partial());
    assert_eq!(outcome.failed_labels(), vec!["C3"]);
    assert!(outcome.failures[0].message.contains("Nyquist"));

    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json["result"]["C4"]["relative_power"]["Alpha"].as_f64().unwrap() > 0.95);
    assert_eq!(json["failures"][0]["channel"], "C3");
}

#[test]
fn test_full_report_generation() {
    let dir = tempfile::tempdir().unwrap();
    let edf = dir.path().join("session.edf");
    write_edf(
        &edf,
        &[
            ("O1", 256, sine(10.0, 256.0, 10.0, 40.0)),
            ("Cz", 256, sine(20.0, 256.0, 10.0, 40.0)),
            ("F3", 64, sine(10.0, 64.0, 10.0, 40.0)),
        ],
    );
    let notes = dir.path().join("lifestyle.txt");
    std::fs::write(&notes, "Sleeps poorly. ".repeat(100)).unwrap();

    let config = AnalysisConfig::default();
    let mut recording = open_recording(&edf).unwrap();
    let outcome = analyze_recording(recording.as_mut(), &config).unwrap();
    let events = interpret(&outcome.result, &BrodmannAnnotator, config.interpretation_threshold);

    let pairs: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e.channel.as_str(), e.band.as_str()))
        .collect();
    assert_eq!(pairs, vec![("O1", "Alpha"), ("Cz", "Beta")]);

    let documents = vec![extract_text(&notes).unwrap()];
    let input = ReportInput {
        recording_name: "session.edf",
        outcome: &outcome,
        events: &events,
        documents: &documents,
        skipped_documents: &[],
        preview_chars: config.preview_chars,
        threshold: config.interpretation_threshold,
    };
    let out = dir.path().join("reports");
    let paths = ReportAssembler::new().unwrap().write_reports(&input, &out).unwrap();

    let clinical = std::fs::read_to_string(out.join(CLINICAL_REPORT_FILE)).unwrap();
    assert!(clinical.contains("# Comprehensive Clinical QEEG Report"));
    assert!(clinical.contains("↑ Alpha at O1 → Possible dysfunction in BA17, BA18"));
    assert!(clinical.contains("↑ Beta at Cz → Possible dysfunction in an unmapped region"));
    assert!(clinical.contains("- F3: Invalid sample rate 64 Hz"));
    assert!(clinical.contains("### lifestyle.txt"));
    assert!(clinical.contains("..."));

    let patient = std::fs::read_to_string(&paths.patient).unwrap();
    assert!(patient.contains("We found higher Alpha activity in O1, linked to BA17, BA18."));
    assert!(patient.ends_with("![High Beta Distribution](<High Beta_map.svg>)\n"));
    assert!(out.join(PATIENT_REPORT_FILE).exists());

    for band in ["Delta", "Theta", "Alpha", "Beta", "High Beta"] {
        assert!(out.join(format!("{}_map.svg", band)).exists(), "{} chart missing", band);
    }
}
