//! Plain-text tables for status output.

use std::fmt::Write as _;

use crate::{
    encode::EncodedTrip,
    pipeline::RunSummary,
    record::CANONICAL_COLUMNS,
};

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(flatten(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn summary_table(summary: &RunSummary) -> String {
    let headers = ["file", "format", "inserted", "skipped", "status"]
        .map(String::from)
        .to_vec();
    let rows = summary
        .files
        .iter()
        .map(|report| {
            vec![
                report.file_name(),
                report
                    .format
                    .map(|f| f.label().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                report.inserted.to_string(),
                report.skipped.to_string(),
                report
                    .error
                    .as_ref()
                    .map(|e| format!("failed: {e}"))
                    .unwrap_or_else(|| "ok".to_string()),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn trips_table(trips: &[EncodedTrip]) -> String {
    let headers = CANONICAL_COLUMNS.map(String::from).to_vec();
    let rows = trips
        .iter()
        .map(|trip| trip.iter().map(|cell| cell.as_display()).collect())
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", flatten(value), width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

/// Keeps each row on one line.
fn flatten(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify::SurveyFormat, pipeline::FileReport};
    use std::path::PathBuf;

    #[test]
    fn render_table_aligns_columns() {
        let headers = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            vec!["1".to_string(), "Alice".to_string()],
            vec!["2".to_string(), "Bob\tJr".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["id   name", "---  ------", "1    Alice", "2    Bob Jr"]);
    }

    #[test]
    fn summary_table_marks_failures() {
        let summary = RunSummary {
            files: vec![
                FileReport {
                    path: PathBuf::from("/data/a.csv"),
                    format: Some(SurveyFormat::AggregateCount),
                    inserted: 5,
                    skipped: 0,
                    error: None,
                },
                FileReport {
                    path: PathBuf::from("/data/b.csv"),
                    format: None,
                    inserted: 0,
                    skipped: 0,
                    error: Some("boom".into()),
                },
            ],
            total_inserted: 5,
            total_skipped: 0,
        };
        let rendered = summary_table(&summary);
        assert!(rendered.contains("a.csv  aggregate-count  5"));
        assert!(rendered.lines().last().unwrap().ends_with("failed: boom"));
    }
}
