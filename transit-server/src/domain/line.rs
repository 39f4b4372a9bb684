//! Transportation lines: the directed edges of the transit graph.

use super::station::StationCode;

/// How a line segment is travelled.
///
/// `Walk` never appears in GTFS data; it is synthesized by the planner for
/// on-foot connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Bus,
    Train,
    LightTrain,
    Walk,
}

impl TransportMode {
    /// Whether this mode is a public-transport vehicle (anything but walking).
    pub fn is_public(&self) -> bool {
        !matches!(self, TransportMode::Walk)
    }
}

/// A directed edge: one named line from a station to the next stop on that
/// line.
///
/// `travel_time_minutes` may be 0 when the feed carries no usable per-edge
/// time; consumers fall back to a distance-based estimate. `==` compares
/// whole values; ingestion aggregates rows with [`same_line`] instead.
///
/// [`same_line`]: TransportationLine::same_line
#[derive(Debug, Clone, PartialEq)]
pub struct TransportationLine {
    /// Line identifier. A string: route numbers may carry letter suffixes.
    pub id: String,
    /// Destination station code.
    pub to: StationCode,
    /// Travel time in minutes, 0 when unknown.
    pub travel_time_minutes: f64,
    pub mode: TransportMode,
    /// Daily arrival times at the origin station, minutes since midnight.
    pub arrival_times: Vec<u32>,
}

impl TransportationLine {
    /// Sentinel id carried by the first step of every route.
    pub const START_ID: &'static str = "Start";

    /// Id of synthetic walking edges.
    pub const WALK_ID: &'static str = "Walk";

    /// Destination placeholder for a line whose next stop is not yet known
    /// during ingestion. Never a real station code.
    pub const UNSET_DESTINATION: StationCode = StationCode::new(-1);

    pub fn new(
        id: impl Into<String>,
        to: StationCode,
        travel_time_minutes: f64,
        mode: TransportMode,
    ) -> Self {
        Self {
            id: id.into(),
            to,
            travel_time_minutes,
            mode,
            arrival_times: Vec::new(),
        }
    }

    /// A synthetic walking edge ending at `to`.
    pub fn walk(to: StationCode, travel_time_minutes: f64) -> Self {
        Self::new(Self::WALK_ID, to, travel_time_minutes, TransportMode::Walk)
    }

    /// The sentinel edge marking the first step of a route at station `at`.
    pub fn start(at: StationCode) -> Self {
        Self::new(Self::START_ID, at, 0.0, TransportMode::Walk)
    }

    /// Line identity used to aggregate GTFS rows: lines are the same line
    /// iff their ids match.
    pub fn same_line(&self, other: &TransportationLine) -> bool {
        self.id == other.id
    }

    pub fn is_walk(&self) -> bool {
        self.id == Self::WALK_ID
    }

    pub fn is_start(&self) -> bool {
        self.id == Self::START_ID
    }
}
