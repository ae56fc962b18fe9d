use std::fmt;

use rusqlite::types::Value as SqlValue;
use serde::Serialize;

/// Reference-entity kinds a work row can point at through a foreign key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DimensionKind {
    Author,
    Artist,
    Department,
}

/// One catalog item normalized into the shared shape. Dimension names are
/// already trimmed; scalars carry source-specific columns (height, gender).
#[derive(Debug, Clone)]
pub struct WorkRecord {
    pub title: Option<String>,
    pub creation_year: Option<i64>,
    pub dimensions: Vec<(DimensionKind, String)>,
    pub scalars: Vec<(&'static str, SqlValue)>,
}

impl WorkRecord {
    pub fn dimension_name(&self, kind: DimensionKind) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Normalized {
    Record(WorkRecord),
    Reject(Reject),
}

/// Per-record skip reasons. These are outcomes, not errors: the batch keeps
/// iterating after every one of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Reject {
    YearBelowFloor { year: i64 },
    YearAboveCeiling { year: i64 },
    MissingYear,
    DisallowedClassification { classification: String },
    MalformedField { field: &'static str },
    Untitled,
}

impl fmt::Display for Reject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YearBelowFloor { year } => write!(f, "year {year} below admissible floor"),
            Self::YearAboveCeiling { year } => write!(f, "year {year} above admissible ceiling"),
            Self::MissingYear => write!(f, "creation year missing"),
            Self::DisallowedClassification { classification } => {
                write!(f, "classification not allowed: {classification}")
            }
            Self::MalformedField { field } => write!(f, "malformed field: {field}"),
            Self::Untitled => write!(f, "record has no title"),
        }
    }
}

/// Outcome of one insert attempt against a work table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Accepted(i64),
    Ignored,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestCounts {
    pub fetched: usize,
    pub examined: usize,
    pub hydration_failures: usize,
    pub accepted: usize,
    pub ignored_duplicates: usize,
    pub rejected_year_below_floor: usize,
    pub rejected_year_above_ceiling: usize,
    pub rejected_missing_year: usize,
    pub rejected_classification: usize,
    pub rejected_malformed: usize,
    pub rejected_untitled: usize,
    pub works_before: i64,
    pub works_after: i64,
}

impl HarvestCounts {
    pub fn tally_reject(&mut self, reject: &Reject) {
        match reject {
            Reject::YearBelowFloor { .. } => self.rejected_year_below_floor += 1,
            Reject::YearAboveCeiling { .. } => self.rejected_year_above_ceiling += 1,
            Reject::MissingYear => self.rejected_missing_year += 1,
            Reject::DisallowedClassification { .. } => self.rejected_classification += 1,
            Reject::MalformedField { .. } => self.rejected_malformed += 1,
            Reject::Untitled => self.rejected_untitled += 1,
        }
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected_year_below_floor
            + self.rejected_year_above_ceiling
            + self.rejected_missing_year
            + self.rejected_classification
            + self.rejected_malformed
            + self.rejected_untitled
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub source: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub db_path: String,
    pub page_size: usize,
    pub quota: usize,
    pub year_floor: i64,
    pub year_ceiling: Option<i64>,
    pub counts: HarvestCounts,
}
