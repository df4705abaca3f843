//! Decides which of the two known export shapes a table has.
//!
//! Portal exports either aggregate vehicle counts per interval or already
//! list one vehicle per row. The only reliable signal is the header labels,
//! so the decision is a keyword match over the concatenated labels. It is a
//! heuristic and can misfire on unusual headers.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::frame::RawTable;

pub const DEFAULT_AGGREGATE_KEYWORDS: &[&str] = &[
    "Start Time",
    "Motorized Vehicle",
    "Non-motorized Vehicle",
    "Truck",
    "Bus",
    "Car",
    "Motor Cycle",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurveyFormat {
    /// Per-interval vehicle counts that must be expanded into trips.
    AggregateCount,
    /// One row per vehicle, already close to the canonical schema.
    TripLog,
}

impl SurveyFormat {
    pub fn label(self) -> &'static str {
        match self {
            SurveyFormat::AggregateCount => "aggregate-count",
            SurveyFormat::TripLog => "trip-log",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatClassifier {
    keywords: Vec<String>,
}

impl Default for FormatClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_AGGREGATE_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl FormatClassifier {
    pub fn new<I>(keywords: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            keywords: keywords.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_aggregate(&self, headers: &[String]) -> bool {
        let joined = headers.iter().join(" ");
        self.keywords
            .iter()
            .any(|keyword| joined.contains(keyword.as_str()))
    }

    pub fn classify(&self, table: &RawTable) -> SurveyFormat {
        if self.is_aggregate(&table.headers) {
            SurveyFormat::AggregateCount
        } else {
            SurveyFormat::TripLog
        }
    }
}
