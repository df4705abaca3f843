//! Row encoding for insertion.
//!
//! Each normalized record becomes six [`Cell`]s in canonical column order.
//! Absent values become [`Cell::Null`] tagged with the column's SQL type so the
//! store can bind a correctly typed NULL.

use std::fmt;

use chrono::NaiveDateTime;

use crate::record::TripRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Text,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Timestamp(NaiveDateTime),
    Null(CellType),
}

pub type EncodedTrip = [Cell; 6];

impl Cell {
    fn text(value: &Option<String>) -> Self {
        value.clone().map_or(Cell::Null(CellType::Text), Cell::Text)
    }

    fn timestamp(value: Option<NaiveDateTime>) -> Self {
        value.map_or(Cell::Null(CellType::Timestamp), Cell::Timestamp)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null(_))
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::Null(_) => "NULL".to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn encode_record(record: &TripRecord) -> EncodedTrip {
    [
        Cell::text(&record.vehicle_number),
        Cell::text(&record.vehicle_type),
        Cell::timestamp(record.departure_time),
        Cell::timestamp(record.arrival_time),
        Cell::text(&record.origin),
        Cell::text(&record.destination),
    ]
}

pub fn encode_records(records: &[TripRecord]) -> Vec<EncodedTrip> {
    records.iter().map(encode_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_naive_datetime;

    #[test]
    fn absent_values_become_typed_nulls() {
        let record = TripRecord {
            vehicle_number: Some("CAR2205010800000".into()),
            departure_time: Some(parse_naive_datetime("2022-05-01 08:00").unwrap()),
            ..TripRecord::default()
        };
        let encoded = encode_record(&record);
        assert_eq!(encoded[0], Cell::Text("CAR2205010800000".into()));
        assert_eq!(encoded[1], Cell::Null(CellType::Text));
        assert!(matches!(encoded[2], Cell::Timestamp(_)));
        assert_eq!(encoded[3], Cell::Null(CellType::Timestamp));
        assert!(encoded[4].is_null() && encoded[5].is_null());
    }

    #[test]
    fn encoding_preserves_row_order() {
        let records = ["A", "B", "C"]
            .iter()
            .map(|n| TripRecord {
                vehicle_number: Some(n.to_string()),
                ..TripRecord::default()
            })
            .collect::<Vec<_>>();
        let numbers = encode_records(&records)
            .iter()
            .map(|row| row[0].to_string())
            .collect::<Vec<_>>();
        assert_eq!(numbers, vec!["A", "B", "C"]);
    }

    #[test]
    fn cells_render_for_status_output() {
        let ts = parse_naive_datetime("2022-05-01 08:12").unwrap();
        assert_eq!(Cell::Timestamp(ts).as_display(), "2022-05-01 08:12:00");
        assert_eq!(Cell::Null(CellType::Text).to_string(), "NULL");
    }
}
