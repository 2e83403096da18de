use crate::error::{QeegError, Result};
use crate::types::AnalysisResult;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1000, 600);

/// File name of the chart for `band` inside a report directory
pub fn chart_file_name(band: &str) -> String {
    format!("{}_map.svg", band)
}

/// Bar chart of one band's relative power across channels, as SVG
pub fn render_band_chart<P: AsRef<Path>>(result: &AnalysisResult, band: &str, path: P) -> Result<()> {
    let path = path.as_ref();
    draw_band_chart(result, band, path).map_err(|e| {
        QeegError::Chart(format!("{} ({}): {}", band, path.display(), e))
    })?;
    log::debug!("Wrote {} chart to {}", band, path.display());
    Ok(())
}

fn draw_band_chart(result: &AnalysisResult, band: &str, path: &Path) -> std::result::Result<(), Box<dyn Error>> {
    let labels: Vec<&str> = result.labels().collect();
    let values: Vec<f64> = result
        .iter()
        .map(|(_, profile)| profile.get(band).unwrap_or(0.0))
        .collect();

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let max_value = values.iter().copied().fold(0.0f64, f64::max);
    let y_max = if max_value > 1.0 { max_value * 1.1 } else { 1.0 };
    let x_max = labels.len().max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} Distribution", band), ("sans-serif", 30).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..(x_max - 0.5), 0.0..y_max)?;

    // Bars are centered on integer x positions
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Relative Power")
        .x_desc("Channel")
        .x_labels(labels.len().max(1))
        .x_label_formatter(&|x| {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < labels.len() {
                labels[idx as usize].to_string()
            } else {
                String::new()
            }
        })
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &value)| {
        Rectangle::new(
            [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, value)],
            BLUE.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
