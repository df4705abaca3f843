//! Vehicle-type column map for aggregate survey exports.
//!
//! Count columns start right after the date and time-of-day columns. Each
//! entry pairs a type label with its zero-based offset into those counts.
//! The `_b` labels are the second column the portal emits for the same
//! category; they are kept as separate entries.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleTypeColumn {
    pub label: &'static str,
    pub offset: usize,
}

pub const VEHICLE_TYPE_COLUMNS: [VehicleTypeColumn; 24] = [
    VehicleTypeColumn { label: "Multi_Axle_Truck", offset: 0 },
    VehicleTypeColumn { label: "Heavy_Truck", offset: 1 },
    VehicleTypeColumn { label: "Light_Truck", offset: 2 },
    VehicleTypeColumn { label: "Big_Bus", offset: 3 },
    VehicleTypeColumn { label: "Mini_Bus", offset: 4 },
    VehicleTypeColumn { label: "Micro_Bus", offset: 5 },
    VehicleTypeColumn { label: "Car", offset: 6 },
    VehicleTypeColumn { label: "Car_b", offset: 7 },
    VehicleTypeColumn { label: "Motor_Cycle", offset: 8 },
    VehicleTypeColumn { label: "Motor_Cycle_b", offset: 9 },
    VehicleTypeColumn { label: "Utility_Vehicle", offset: 10 },
    VehicleTypeColumn { label: "Utility_Vehicle_b", offset: 11 },
    VehicleTypeColumn { label: "Tractor", offset: 12 },
    VehicleTypeColumn { label: "Tractor_b", offset: 13 },
    VehicleTypeColumn { label: "Three_Wheeler", offset: 14 },
    VehicleTypeColumn { label: "Three_Wheeler_b", offset: 15 },
    VehicleTypeColumn { label: "Four_Wheel_Drive", offset: 16 },
    VehicleTypeColumn { label: "Four_Wheel_Drive_b", offset: 17 },
    VehicleTypeColumn { label: "Power_Tiller", offset: 18 },
    VehicleTypeColumn { label: "Power_Tiller_b", offset: 19 },
    VehicleTypeColumn { label: "Rickshaw", offset: 20 },
    VehicleTypeColumn { label: "Rickshaw_b", offset: 21 },
    VehicleTypeColumn { label: "Hand_Cart", offset: 22 },
    VehicleTypeColumn { label: "Hand_Cart_b", offset: 23 },
];

/// Where synthesized trips of a type start and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Bus,
    Truck,
    General,
}

impl RouteKind {
    pub fn for_label(label: &str) -> Self {
        if label.contains("Bus") {
            RouteKind::Bus
        } else if label.contains("Truck") {
            RouteKind::Truck
        } else {
            RouteKind::General
        }
    }

    pub fn origin(self, location: &str) -> String {
        match self {
            RouteKind::Bus => format!("{location}_Bus_Station"),
            RouteKind::Truck => format!("{location}_Industrial_Area"),
            RouteKind::General => format!("{location}_Entry_Point"),
        }
    }

    pub fn destination(self) -> &'static str {
        match self {
            RouteKind::Bus => "City_Center",
            RouteKind::Truck => "Commercial_District",
            RouteKind::General => "Various_Destinations",
        }
    }
}

impl VehicleTypeColumn {
    pub fn route(&self) -> RouteKind {
        RouteKind::for_label(self.label)
    }

    /// Label as stored in `vehicle_type`.
    pub fn display_label(&self) -> String {
        self.label.replace('_', " ")
    }

    /// Upper-cased three-letter prefix used in synthesized vehicle numbers.
    pub fn number_prefix(&self) -> String {
        self.label
            .chars()
            .take(3)
            .collect::<String>()
            .to_uppercase()
    }
}

impl fmt::Display for VehicleTypeColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.label, self.offset)
    }
}
