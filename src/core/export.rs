use crate::core::dashboard::{DashboardReport, ViewStatus};
use crate::domain::series::{Series, View};
use crate::utils::error::{DashboardError, Result};
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const OUTPUT_FORMATS: [&str; 2] = ["json", "csv"];

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Renders the report in each requested format.
///
/// `json` produces `report.json`. `csv` produces `views.csv` (status of every
/// view), `scalars.csv` and one `<view id>.csv` per ready series.
pub fn render_files(report: &DashboardReport, formats: &[String]) -> Result<Vec<ExportFile>> {
    let mut files = Vec::new();

    for format in formats {
        match format.as_str() {
            "json" => files.push(ExportFile {
                name: "report.json".to_string(),
                contents: serde_json::to_vec_pretty(report)?,
            }),
            "csv" => {
                files.push(ExportFile {
                    name: "views.csv".to_string(),
                    contents: views_csv(report)?,
                });
                files.push(ExportFile {
                    name: "scalars.csv".to_string(),
                    contents: scalars_csv(report)?,
                });
                for outcome in &report.views {
                    if let Some(View::Series(series)) = outcome.view() {
                        files.push(ExportFile {
                            name: format!("{}.csv", outcome.id),
                            contents: series_csv(series)?,
                        });
                    }
                }
            }
            other => {
                return Err(DashboardError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: other.to_string(),
                    reason: format!("Valid formats: {}", OUTPUT_FORMATS.join(", ")),
                })
            }
        }
    }

    Ok(files)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| DashboardError::IoError(e.into_error()))
}

fn views_csv(report: &DashboardReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["view", "title", "status", "error_kind", "error"])?;
    for outcome in &report.views {
        match &outcome.status {
            ViewStatus::Ready { .. } => {
                writer.write_record([outcome.id.as_str(), outcome.title.as_str(), "ready", "", ""])?
            }
            ViewStatus::Failed { error } => writer.write_record([
                outcome.id.as_str(),
                outcome.title.as_str(),
                "failed",
                error.kind(),
                error.to_string().as_str(),
            ])?,
        }
    }
    finish_csv(writer)
}

fn scalars_csv(report: &DashboardReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["view", "label", "value", "display"])?;
    for outcome in &report.views {
        if let Some(View::Scalar(scalar)) = outcome.view() {
            writer.write_record([
                outcome.id.clone(),
                scalar.label.clone(),
                scalar.value.to_string(),
                scalar.to_string(),
            ])?;
        }
    }
    finish_csv(writer)
}

pub fn series_csv(series: &Series) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = series.dimensions.clone();
    header.push(series.measure.clone());
    writer.write_record(&header)?;

    for point in &series.points {
        let mut row: Vec<String> = point.key.iter().map(|cell| cell.to_string()).collect();
        row.push(point.value.to_string());
        writer.write_record(&row)?;
    }
    finish_csv(writer)
}

/// Bundles the files into one ZIP archive held in memory.
pub fn bundle_zip(files: &[ExportFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for file in files {
        zip.start_file(file.name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(&file.contents)?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Plain-text rendering of the scalar views and failures, for the terminal.
pub fn render_summary(report: &DashboardReport) -> String {
    let mut lines = vec![format!("{} ({} rows)", report.title, report.row_count)];

    for outcome in &report.views {
        match &outcome.status {
            ViewStatus::Ready {
                view: View::Scalar(scalar),
            } => lines.push(format!("  {}: {}", scalar.label, scalar)),
            ViewStatus::Ready {
                view: View::Series(series),
            } => lines.push(format!("  {}: {} points", outcome.title, series.len())),
            ViewStatus::Failed { error } => {
                lines.push(format!("  {}: unavailable ({})", outcome.title, error))
            }
        }
    }

    if !report.diagnostics.is_empty() {
        lines.push(format!(
            "  {} row(s) left out of monthly views",
            report.diagnostics.len()
        ));
    }
    lines.join("\n")
}
