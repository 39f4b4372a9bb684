//! Stations and their codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::coords::Coordinates;
use super::line::TransportationLine;

/// A station's numeric GTFS stop code, the graph's primary key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationCode(i64);

impl StationCode {
    pub const fn new(code: i64) -> Self {
        Self(code)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for StationCode {
    fn from(code: i64) -> Self {
        Self(code)
    }
}

/// A node of the transit graph: a boardable stop with its outgoing lines.
#[derive(Debug, Clone)]
pub struct Station {
    pub code: StationCode,
    pub name: String,
    pub coords: Coordinates,
    pub lines: Vec<TransportationLine>,
}

impl Station {
    pub fn new(code: StationCode, name: impl Into<String>, coords: Coordinates) -> Self {
        Self {
            code,
            name: name.into(),
            coords,
            lines: Vec::new(),
        }
    }
}

/// Two stations are the same station iff their codes are equal.
impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Station {}
