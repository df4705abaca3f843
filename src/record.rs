//! Canonical per-vehicle trip record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const VEHICLE_NUMBER: &str = "vehicle_number";
pub const VEHICLE_TYPE: &str = "vehicle_type";
pub const DEPARTURE_TIME: &str = "departure_time";
pub const ARRIVAL_TIME: &str = "arrival_time";
pub const ORIGIN: &str = "origin";
pub const DESTINATION: &str = "destination";

/// Column order shared by normalization, encoding and the INSERT statement.
pub const CANONICAL_COLUMNS: [&str; 6] = [
    VEHICLE_NUMBER,
    VEHICLE_TYPE,
    DEPARTURE_TIME,
    ARRIVAL_TIME,
    ORIGIN,
    DESTINATION,
];

pub const MAX_VEHICLE_NUMBER_LEN: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    pub vehicle_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub departure_time: Option<NaiveDateTime>,
    pub arrival_time: Option<NaiveDateTime>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl TripRecord {
    pub fn has_vehicle_number(&self) -> bool {
        self.vehicle_number
            .as_deref()
            .is_some_and(|number| !number.trim().is_empty())
    }
}
