//! Canonical-schema normalization.
//!
//! Both export shapes end up here. Trip logs are matched to the canonical
//! columns by normalized header name (`Vehicle Number` → `vehicle_number`),
//! missing columns become absent values, text is trimmed, timestamps are
//! parsed permissively and rows without a vehicle number are rejected.

use crate::{
    data::{normalize_column_name, parse_timestamp_lenient},
    frame::RawTable,
    record::{CANONICAL_COLUMNS, TripRecord},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurveyRows {
    /// Records produced by the aggregate expander.
    Synthesized(Vec<TripRecord>),
    /// A per-vehicle table read as text.
    TripLog(RawTable),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub records: Vec<TripRecord>,
    pub rejected: usize,
}

impl Normalized {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn normalize(rows: SurveyRows) -> Normalized {
    let candidates = match rows {
        SurveyRows::Synthesized(records) => records.into_iter().map(tidy_record).collect(),
        SurveyRows::TripLog(table) => records_from_table(&table),
    };
    let total = candidates.len();
    let records = candidates
        .into_iter()
        .filter(TripRecord::has_vehicle_number)
        .collect::<Vec<_>>();
    Normalized {
        rejected: total - records.len(),
        records,
    }
}

/// Position of each canonical column in `headers`, in canonical order.
pub fn canonical_positions(headers: &[String]) -> [Option<usize>; 6] {
    let normalized = headers
        .iter()
        .map(|h| normalize_column_name(h))
        .collect::<Vec<_>>();
    CANONICAL_COLUMNS.map(|name| normalized.iter().position(|h| h == name))
}

fn records_from_table(table: &RawTable) -> Vec<TripRecord> {
    let [number, kind, departure, arrival, origin, destination] =
        canonical_positions(&table.headers);
    let cell = |row: usize, column: Option<usize>| column.and_then(|c| table.cell(row, c));
    (0..table.row_count())
        .map(|row| TripRecord {
            vehicle_number: clean_text(cell(row, number)),
            vehicle_type: clean_text(cell(row, kind)),
            departure_time: parse_timestamp_lenient(cell(row, departure)),
            arrival_time: parse_timestamp_lenient(cell(row, arrival)),
            origin: clean_text(cell(row, origin)),
            destination: clean_text(cell(row, destination)),
        })
        .collect()
}

fn tidy_record(record: TripRecord) -> TripRecord {
    TripRecord {
        vehicle_number: clean_text(record.vehicle_number.as_deref()),
        vehicle_type: clean_text(record.vehicle_type.as_deref()),
        origin: clean_text(record.origin.as_deref()),
        destination: clean_text(record.destination.as_deref()),
        ..record
    }
}

/// Trimmed text; blank cells are absent.
fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
