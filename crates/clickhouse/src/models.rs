//! Row models for the photos table

use std::{fmt, str::FromStr};

use clickhouse::Row;
use serde::{Deserialize, Serialize};

/// One photo document.
///
/// `name` is always present; `year` and `city` are the optional quiz fields
/// the random sample pools draw on. The `*_options` arrays hold pre-built
/// multiple-choice answers and may be empty.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoRow {
    /// Photo file name
    pub name: String,
    /// Year the photo was taken, if known
    pub year: Option<u16>,
    /// City the photo was taken in, if known
    pub city: Option<String>,
    /// Multiple-choice year answers
    pub year_options: Vec<String>,
    /// Multiple-choice city answers
    pub city_options: Vec<String>,
}

/// The photo columns that back a random sample pool.
///
/// This is a closed set: every pool the service maintains corresponds to one
/// variant, so handlers can never ask for a pool that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoField {
    /// The `year` column
    Year,
    /// The `city` column
    City,
}

impl PhotoField {
    /// Column name in the photos table.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::City => "city",
        }
    }
}

impl fmt::Display for PhotoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for PhotoField {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(Self::Year),
            "city" => Ok(Self::City),
            other => Err(eyre::eyre!("unknown photo field: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PhotoField;

    #[test]
    fn field_parses_known_columns() {
        assert_eq!("year".parse::<PhotoField>().unwrap(), PhotoField::Year);
        assert_eq!("city".parse::<PhotoField>().unwrap(), PhotoField::City);
        assert!("name".parse::<PhotoField>().is_err());
    }
}
