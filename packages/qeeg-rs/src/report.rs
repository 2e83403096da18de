//! Clinical and patient-facing report generation.
//!
//! Both reports are Markdown rendered from built-in Tera templates; band
//! charts are written next to them and linked by relative file name.

use crate::error::Result;
use crate::extraction::ExtractedDocument;
use crate::profile_scope;
use crate::types::{AnalysisOutcome, AnnotationEvent};
use crate::visualization::{chart_file_name, render_band_chart};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

pub const CLINICAL_REPORT_FILE: &str = "Clinical_Report.md";
pub const PATIENT_REPORT_FILE: &str = "Patient_Report.md";

const CLINICAL_RECOMMENDATIONS: [&str; 4] = [
    "swLORETA Neurofeedback",
    "Biofeedback",
    "Neuro-nutrition",
    "Functional Neurological Exercises",
];

const PATIENT_RECOMMENDATIONS: [&str; 4] = [
    "Neurofeedback training",
    "Relaxation breathing",
    "Omega-3 and magnesium",
    "Brain games & light exercise",
];

/// Everything the reports are rendered from
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub recording_name: &'a str,
    pub outcome: &'a AnalysisOutcome,
    pub events: &'a [AnnotationEvent],
    pub documents: &'a [ExtractedDocument],
    /// Documents that were attached but could not be read: (name, reason)
    pub skipped_documents: &'a [(String, String)],
    pub preview_chars: usize,
    pub threshold: f64,
}

/// Files produced by [`ReportAssembler::write_reports`]
#[derive(Debug, Clone, Serialize)]
pub struct ReportPaths {
    pub clinical: PathBuf,
    pub patient: PathBuf,
    pub charts: Vec<PathBuf>,
}

#[derive(Serialize)]
struct ChannelRow {
    label: String,
    values: Vec<String>,
}

#[derive(Serialize)]
struct EventLine<'a> {
    channel: &'a str,
    band: &'a str,
    regions: String,
}

#[derive(Serialize)]
struct DocumentPreview<'a> {
    name: &'a str,
    preview: String,
}

#[derive(Serialize)]
struct SkippedDocument<'a> {
    name: &'a str,
    reason: &'a str,
}

#[derive(Serialize)]
struct ChartRef {
    band: String,
    file: String,
}

pub struct ReportAssembler {
    tera: Tera,
}

impl ReportAssembler {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("clinical.md", CLINICAL_TEMPLATE)?;
        tera.add_raw_template("patient.md", PATIENT_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render_clinical(&self, input: &ReportInput) -> Result<String> {
        let mut context = Self::base_context(input);
        let outcome = input.outcome;

        let band_names: Vec<&str> = outcome.bands.iter().map(|b| b.name.as_str()).collect();
        let rows: Vec<ChannelRow> = outcome
            .result
            .iter()
            .map(|(label, profile)| ChannelRow {
                label: label.to_string(),
                values: band_names
                    .iter()
                    .map(|band| format!("{:.3}", profile.get(band).unwrap_or(0.0)))
                    .collect(),
            })
            .collect();
        let flat_channels: Vec<&str> = outcome
            .result
            .iter()
            .filter(|(_, profile)| profile.is_zero_broadband())
            .map(|(label, _)| label)
            .collect();
        let documents: Vec<DocumentPreview> = input
            .documents
            .iter()
            .map(|doc| DocumentPreview {
                name: &doc.name,
                preview: doc.preview(input.preview_chars),
            })
            .collect();
        let skipped: Vec<SkippedDocument> = input
            .skipped_documents
            .iter()
            .map(|(name, reason)| SkippedDocument { name, reason })
            .collect();

        context.insert("analyzed_at", &outcome.analyzed_at);
        context.insert("channel_count", &outcome.result.len());
        context.insert("failure_count", &outcome.failures.len());
        context.insert("band_names", &band_names);
        context.insert("rows", &rows);
        context.insert("flat_channels", &flat_channels);
        context.insert("failures", &outcome.failures);
        context.insert("documents", &documents);
        context.insert("skipped", &skipped);
        context.insert("recommendations", &CLINICAL_RECOMMENDATIONS);

        Ok(self.tera.render("clinical.md", &context)?)
    }

    pub fn render_patient(&self, input: &ReportInput) -> Result<String> {
        let mut context = Self::base_context(input);
        context.insert("recommendations", &PATIENT_RECOMMENDATIONS);
        Ok(self.tera.render("patient.md", &context)?)
    }

    fn base_context(input: &ReportInput) -> Context {
        let events: Vec<EventLine> = input
            .events
            .iter()
            .map(|event| EventLine {
                channel: &event.channel,
                band: &event.band,
                regions: event.regions.join(", "),
            })
            .collect();
        let charts: Vec<ChartRef> = input
            .outcome
            .bands
            .iter()
            .map(|band| ChartRef {
                band: band.name.clone(),
                file: chart_file_name(&band.name),
            })
            .collect();

        let mut context = Context::new();
        context.insert("recording", input.recording_name);
        context.insert("threshold", &input.threshold);
        context.insert("events", &events);
        context.insert("charts", &charts);
        context
    }

    /// Write both reports and one chart per band into `output_dir`
    pub fn write_reports<P: AsRef<Path>>(&self, input: &ReportInput, output_dir: P) -> Result<ReportPaths> {
        profile_scope!("write_reports");
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;

        let mut charts = Vec::with_capacity(input.outcome.bands.len());
        for band in &input.outcome.bands {
            let path = output_dir.join(chart_file_name(&band.name));
            render_band_chart(&input.outcome.result, &band.name, &path)?;
            charts.push(path);
        }

        let clinical = output_dir.join(CLINICAL_REPORT_FILE);
        std::fs::write(&clinical, self.render_clinical(input)?)?;

        let patient = output_dir.join(PATIENT_REPORT_FILE);
        std::fs::write(&patient, self.render_patient(input)?)?;

        log::info!(
            "Reports written to {} ({} charts)",
            output_dir.display(),
            charts.len()
        );

        Ok(ReportPaths {
            clinical,
            patient,
            charts,
        })
    }
}

const CLINICAL_TEMPLATE: &str = r#"# Comprehensive Clinical QEEG Report

- **Recording:** {{ recording }}
- **Analyzed at:** {{ analyzed_at }}
- **Channels analyzed:** {{ channel_count }}
- **Channels failed:** {{ failure_count }}
- **Interpretation threshold:** relative power > {{ threshold }}

## QEEG Analysis Findings

{% if rows -%}
| Channel | {{ band_names | join(sep=" | ") }} |
|---|{% for band in band_names %}---|{% endfor %}
{% for row in rows -%}
| {{ row.label }} | {{ row.values | join(sep=" | ") }} |
{% endfor %}
{%- if flat_channels %}
Zero broadband power (all relative powers reported as 0): {{ flat_channels | join(sep=", ") }}
{% endif %}
{%- else -%}
No channel could be analyzed.
{% endif %}
## Auto-Interpretation

{% if events -%}
{% for event in events -%}
- ↑ {{ event.band }} at {{ event.channel }} → Possible dysfunction in {% if event.regions %}{{ event.regions }}{% else %}an unmapped region{% endif %}
{% endfor %}
{%- else -%}
No band exceeded the interpretation threshold.
{% endif %}
{%- if failures %}
## Channels Not Analyzed

{% for failure in failures -%}
- {{ failure.channel }}: {{ failure.message }}
{% endfor %}
{%- endif %}
## Uploaded Lifestyle/Background/Localisation Info

{% if documents or skipped -%}
{% for doc in documents -%}
### {{ doc.name }}

```text
{{ doc.preview }}
```

{% endfor %}
{%- for doc in skipped -%}
- {{ doc.name }} was not included: {{ doc.reason }}
{% endfor %}
{%- else -%}
No supporting documents were provided.
{% endif %}
## Recommended Interventions

{% for item in recommendations -%}
- {{ item }}
{% endfor %}
## Band Distribution Maps

{% for chart in charts -%}
![{{ chart.band }} Distribution](<{{ chart.file }}>)
{% endfor %}"#;

const PATIENT_TEMPLATE: &str = r#"# Patient-Friendly Brain Report

This report summarizes the brain activity measured in {{ recording }}.

## What We Found

{% if events -%}
{% for event in events -%}
- We found higher {{ event.band }} activity in {{ event.channel }}, linked to {% if event.regions %}{{ event.regions }}{% else %}an unmapped area{% endif %}.
{% endfor %}
{%- else -%}
Your brain activity was balanced across the measured frequency bands.
{% endif %}
## Your Recommendations

{% for item in recommendations -%}
- {{ item }}
{% endfor %}
## Your Brain Maps

{% for chart in charts -%}
![{{ chart.band }} Distribution](<{{ chart.file }}>)
{% endfor %}"#;
