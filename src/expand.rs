//! Aggregate-to-trip expansion.
//!
//! An aggregate export holds one row per survey interval: a date, a
//! time-of-day and then one count per vehicle-type column. Every counted
//! vehicle becomes a synthesized [`TripRecord`] with a deterministic vehicle
//! number and departure/arrival times spread across the interval.
//!
//! Vehicle numbers are `<TYP><YYMMDD><HHMM><iii>` where `iii` is the count
//! index modulo 1000. Two intervals sharing the same date/time digits, or a
//! single count above 999, produce repeated numbers.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info, warn};

use crate::{
    data::{ascii_digits, parse_count, parse_interval_start},
    frame::RawTable,
    record::TripRecord,
    vehicle_types::{VEHICLE_TYPE_COLUMNS, VehicleTypeColumn},
};

pub const DEFAULT_DATA_YEARS: &[u16] = &[
    2011, 2012, 2013, 2014, 2015, 2016, 2018, 2020, 2021, 2022, 2024,
];

pub const DEFAULT_SUMMARY_MARKERS: &[&str] =
    &["Sub-total", "Total", "Average", "Composition", "Grand Total"];

pub const DEFAULT_MAX_COUNT_PER_CELL: usize = 100_000;

/// Offset of the first count column within a data row.
const COUNT_COLUMN_START: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateExpander {
    data_years: Vec<String>,
    summary_markers: Vec<String>,
    max_count: usize,
}

impl Default for AggregateExpander {
    fn default() -> Self {
        Self::new(
            DEFAULT_DATA_YEARS.iter().copied(),
            DEFAULT_SUMMARY_MARKERS.iter().map(|m| m.to_string()),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub records: Vec<TripRecord>,
    pub data_rows: usize,
    pub skipped_rows: usize,
}

impl AggregateExpander {
    pub fn new<Y, M>(data_years: Y, summary_markers: M) -> Self
    where
        Y: IntoIterator<Item = u16>,
        M: IntoIterator<Item = String>,
    {
        Self {
            data_years: data_years.into_iter().map(|y| format!("{y:04}")).collect(),
            summary_markers: summary_markers
                .into_iter()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_lowercase())
                .collect(),
            max_count: DEFAULT_MAX_COUNT_PER_CELL,
        }
    }

    /// Rows with a count cell above `max_count` are skipped.
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    /// Index of the first row whose leading cell starts with a known year.
    pub fn data_start(&self, table: &RawTable) -> Option<usize> {
        (0..table.row_count()).find(|&row| {
            let first = table.cell(row, 0).unwrap_or("").trim_start();
            self.data_years.iter().any(|year| first.starts_with(year.as_str()))
        })
    }

    pub fn is_summary_row(&self, first_cell: &str) -> bool {
        let lowered = first_cell.to_lowercase();
        self.summary_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }

    pub fn expand(&self, table: &RawTable, location: &str) -> Expansion {
        let mut expansion = Expansion::default();
        let Some(start) = self.data_start(table) else {
            info!("No dated survey rows found for {location}");
            return expansion;
        };

        for (offset, row) in table.rows[start..].iter().enumerate() {
            let first = row.first().map(String::as_str).unwrap_or("");
            if self.is_summary_row(first) {
                continue;
            }
            expansion.data_rows += 1;
            match expand_row(row, location, self.max_count) {
                Ok(Some(records)) => expansion.records.extend(records),
                Ok(None) => {
                    debug!("Skipping undated row {} of {location}", start + offset + 2);
                    expansion.skipped_rows += 1;
                }
                Err(err) => {
                    warn!(
                        "Error expanding row {} of {location}: {err:#}",
                        start + offset + 2
                    );
                    expansion.skipped_rows += 1;
                }
            }
        }

        info!(
            "Transformed {} vehicle record(s) from {} survey row(s) of {location}",
            expansion.records.len(),
            expansion.data_rows
        );
        expansion
    }
}

/// Location label derived from the export's file name.
pub fn location_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `Ok(None)` marks rows that are not interval rows at all.
fn expand_row(
    row: &[String],
    location: &str,
    max_count: usize,
) -> Result<Option<Vec<TripRecord>>> {
    let date = row.first().map(|d| d.trim()).unwrap_or("");
    let time = row.get(1).map(|t| t.trim()).unwrap_or("");
    if date.is_empty() || time.is_empty() || !date.starts_with("20") {
        return Ok(None);
    }
    let base = parse_interval_start(date, time)?;
    let counts = row.get(COUNT_COLUMN_START..).unwrap_or(&[]);
    let stamp = IntervalStamp::new(date, time);

    let mut records = Vec::new();
    for column in VEHICLE_TYPE_COLUMNS.iter() {
        if column.offset >= counts.len() {
            continue;
        }
        let count = parse_count(counts.get(column.offset).map(String::as_str));
        if count > max_count {
            bail!("count {count} for {column} exceeds the per-cell limit of {max_count}");
        }
        for index in 0..count {
            let record = synthesize(column, &stamp, base, index, location)
                .with_context(|| format!("Synthesizing {} #{index}", column.label))?;
            records.push(record);
        }
    }
    Ok(Some(records))
}

struct IntervalStamp {
    date_digits: String,
    time_digits: String,
}

impl IntervalStamp {
    fn new(date: &str, time: &str) -> Self {
        let date = ascii_digits(date);
        let time = ascii_digits(time);
        let date_digits = date[date.len().saturating_sub(6)..].to_string();
        let time_digits = time[..time.len().min(4)].to_string();
        Self {
            date_digits,
            time_digits,
        }
    }
}

pub fn vehicle_number(prefix: &str, date_digits: &str, time_digits: &str, index: usize) -> String {
    format!("{prefix}{date_digits}{time_digits}{:03}", index % 1000)
}

/// Minutes after the interval start at which the `index`-th vehicle departs.
pub fn departure_offset_minutes(index: usize) -> i64 {
    let index = index as i64;
    index * 2 + (index % 5) * 10
}

/// Trip duration in minutes for the `index`-th vehicle.
pub fn trip_duration_minutes(index: usize) -> i64 {
    90 + (index as i64 % 4) * 15
}

fn synthesize(
    column: &VehicleTypeColumn,
    stamp: &IntervalStamp,
    base: NaiveDateTime,
    index: usize,
    location: &str,
) -> Result<TripRecord> {
    let departure = base
        .checked_add_signed(TimeDelta::minutes(departure_offset_minutes(index)))
        .ok_or_else(|| anyhow!("departure time out of range"))?;
    let arrival = departure
        .checked_add_signed(TimeDelta::minutes(trip_duration_minutes(index)))
        .ok_or_else(|| anyhow!("arrival time out of range"))?;
    let route = column.route();
    Ok(TripRecord {
        vehicle_number: Some(vehicle_number(
            &column.number_prefix(),
            &stamp.date_digits,
            &stamp.time_digits,
            index,
        )),
        vehicle_type: Some(column.display_label()),
        departure_time: Some(departure),
        arrival_time: Some(arrival),
        origin: Some(route.origin(location)),
        destination: Some(route.destination().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MAX_VEHICLE_NUMBER_LEN;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn counts_row(date: &str, time: &str, counts: &[(usize, &str)]) -> Vec<String> {
        let mut cells = vec![date.to_string(), time.to_string()];
        cells.extend(std::iter::repeat_n(String::new(), VEHICLE_TYPE_COLUMNS.len()));
        for (offset, value) in counts {
            cells[COUNT_COLUMN_START + offset] = value.to_string();
        }
        cells
    }

    fn survey(rows: Vec<Vec<String>>) -> RawTable {
        RawTable::new(row(&["Date", "Start Time", "Motorized Vehicle"]), rows)
    }

    #[test]
    fn three_cars_expand_deterministically() {
        let table = survey(vec![counts_row("2022-05-01", "08:00", &[(6, "3")])]);
        let expansion = AggregateExpander::default().expand(&table, "Naubise");

        let numbers = expansion
            .records
            .iter()
            .map(|r| r.vehicle_number.clone().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            numbers,
            vec!["CAR2205010800000", "CAR2205010800001", "CAR2205010800002"]
        );
        let departures = expansion
            .records
            .iter()
            .map(|r| r.departure_time.unwrap())
            .collect::<Vec<_>>();
        assert!(departures.windows(2).all(|pair| pair[0] <= pair[1]));
        for record in &expansion.records {
            let trip = record.arrival_time.unwrap() - record.departure_time.unwrap();
            assert!(trip >= TimeDelta::minutes(90));
            assert_eq!(record.vehicle_type.as_deref(), Some("Car"));
            assert_eq!(record.origin.as_deref(), Some("Naubise_Entry_Point"));
            assert_eq!(record.destination.as_deref(), Some("Various_Destinations"));
        }
        assert_eq!(
            expansion.records[1].departure_time.unwrap().to_string(),
            "2022-05-01 08:12:00"
        );
        assert_eq!(
            expansion.records[1].arrival_time.unwrap().to_string(),
            "2022-05-01 09:57:00"
        );
    }

    #[test]
    fn header_and_summary_rows_are_discarded() {
        let table = survey(vec![
            row(&["Location: Naubise", "", "Truck"]),
            row(&["Date", "Time", "Multi Axle"]),
            counts_row("2022-05-01", "08:00", &[(0, "1"), (3, "2")]),
            counts_row("Sub-total", "", &[(0, "1"), (3, "2")]),
            counts_row("GRAND TOTAL", "", &[(0, "1")]),
        ]);
        let expansion = AggregateExpander::default().expand(&table, "Naubise");
        assert_eq!(expansion.records.len(), 3);
        assert_eq!(expansion.data_rows, 1);
        assert_eq!(
            expansion.records[0].origin.as_deref(),
            Some("Naubise_Industrial_Area")
        );
        assert_eq!(
            expansion.records[1].origin.as_deref(),
            Some("Naubise_Bus_Station")
        );
        assert_eq!(expansion.records[1].destination.as_deref(), Some("City_Center"));
        assert_eq!(expansion.records[1].vehicle_type.as_deref(), Some("Big Bus"));
    }

    #[test]
    fn tables_without_known_years_yield_nothing() {
        let table = survey(vec![
            counts_row("2019-05-01", "08:00", &[(6, "3")]),
            counts_row("1999-05-01", "08:00", &[(6, "3")]),
        ]);
        let expander = AggregateExpander::default();
        assert_eq!(expander.data_start(&table), None);
        assert_eq!(expander.expand(&table, "X"), Expansion::default());
    }

    #[test]
    fn bad_rows_are_skipped_without_stopping_the_file() {
        let table = survey(vec![
            counts_row("2022-05-01", "08:00", &[(6, "1")]),
            counts_row("2022-05-01", "not a time", &[(6, "4")]),
            counts_row("2022-05-01", "", &[(6, "4")]),
            counts_row("Remarks", "08:00", &[(6, "4")]),
            counts_row("2022-05-01", "08:15", &[(8, "2")]),
        ]);
        let expansion = AggregateExpander::default().expand(&table, "X");
        assert_eq!(expansion.records.len(), 3);
        assert_eq!(expansion.skipped_rows, 3);
        assert_eq!(
            expansion.records[2].vehicle_number.as_deref(),
            Some("MOT2205010815001")
        );
    }

    #[test]
    fn short_rows_only_expand_present_columns() {
        let table = survey(vec![row(&["2022-05-01", "08:00", "2", "junk"])]);
        let expansion = AggregateExpander::default().expand(&table, "X");
        assert_eq!(expansion.records.len(), 2);
        assert!(
            expansion
                .records
                .iter()
                .all(|r| r.vehicle_type.as_deref() == Some("Multi Axle Truck"))
        );
    }

    #[test]
    fn vehicle_numbers_wrap_after_a_thousand() {
        assert_eq!(vehicle_number("CAR", "220501", "0800", 1000), "CAR2205010800000");
        let table = survey(vec![counts_row("2022-05-01", "08:00:00", &[(17, "1200")])]);
        let expansion = AggregateExpander::default().expand(&table, "X");
        assert_eq!(expansion.records.len(), 1200);
        assert!(expansion.records.iter().all(|r| {
            r.vehicle_number.as_deref().unwrap().len() <= MAX_VEHICLE_NUMBER_LEN
        }));
        assert_eq!(
            expansion.records[0].vehicle_number,
            expansion.records[1000].vehicle_number
        );
    }

    #[test]
    fn oversized_counts_skip_the_row() {
        let table = survey(vec![
            counts_row("2022-05-01", "08:00", &[(6, "1"), (8, "1e12")]),
            counts_row("2022-05-01", "08:15", &[(6, "5")]),
        ]);
        let expansion = AggregateExpander::default().expand(&table, "X");
        assert_eq!(expansion.skipped_rows, 1);
        assert_eq!(expansion.records.len(), 5);

        let capped = AggregateExpander::default().with_max_count(4);
        let expansion = capped.expand(&table, "X");
        assert_eq!((expansion.data_rows, expansion.skipped_rows), (2, 2));
        assert!(expansion.records.is_empty());

        let row = counts_row("2022-05-01", "08:00", &[(8, "7")]);
        let err = expand_row(&row, "X", 6).unwrap_err();
        assert!(err.to_string().contains("count 7 for Motor_Cycle@8 exceeds"));
    }

    #[test]
    fn spreading_offsets_follow_the_phase_rule() {
        let offsets = (0..6).map(departure_offset_minutes).collect::<Vec<_>>();
        assert_eq!(offsets, vec![0, 12, 24, 36, 48, 10]);
        let durations = (0..5).map(trip_duration_minutes).collect::<Vec<_>>();
        assert_eq!(durations, vec![90, 105, 120, 135, 90]);
    }

    #[test]
    fn location_comes_from_file_stem() {
        assert_eq!(location_from_path(Path::new("/data/ssrn/Naubise.csv")), "Naubise");
        assert_eq!(location_from_path(Path::new("plain")), "plain");
    }

    #[test]
    fn custom_years_and_markers_are_respected() {
        let expander = AggregateExpander::new([2019], vec!["Remarks".to_string()]);
        let table = survey(vec![
            counts_row("2019-01-02", "07:00", &[(6, "1")]),
            counts_row("remarks: none", "", &[]),
            counts_row("Total", "07:15", &[(6, "1")]),
        ]);
        let expansion = expander.expand(&table, "X");
        assert_eq!(expansion.data_rows, 2);
        assert_eq!(expansion.records.len(), 1);
    }
}
