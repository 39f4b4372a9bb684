//! The in-memory transit network.
//!
//! A [`Graph`] is an adjacency table keyed by station code. It is built
//! once from a GTFS feed at startup and never mutated afterwards, which is
//! what lets route-search tasks share it through a plain `Arc` with no
//! locking.

pub mod ingest;

use std::collections::{HashMap, HashSet};

use crate::domain::{Coordinates, PlannerError, Station, StationCode, TransportationLine};

/// Radius in kilometers within which a station counts as "nearby" a
/// coordinate.
pub const NEARBY_RADIUS_KM: f64 = 0.6;

/// Step cap when tracing a line between two stations for display.
pub const MAX_SEGMENT_EXPANSION_STEPS: usize = 150;

/// The transit network: stations with their outgoing lines.
#[derive(Debug, Default)]
pub struct Graph {
    stations: HashMap<StationCode, Station>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a station, replacing any previous entry with the same code.
    pub fn add_station(&mut self, code: StationCode, name: impl Into<String>, coords: Coordinates) {
        self.stations.insert(code, Station::new(code, name, coords));
    }

    /// Look up a station, failing when the code is unknown.
    pub fn station_by_code(&self, code: StationCode) -> Result<&Station, PlannerError> {
        self.stations.get(&code).ok_or(PlannerError::NotFound(code))
    }

    pub fn has_station(&self, code: StationCode) -> bool {
        self.stations.contains_key(&code)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Outgoing lines from a station; empty when the station is unknown.
    pub fn lines_from(&self, code: StationCode) -> &[TransportationLine] {
        self.stations
            .get(&code)
            .map(|s| s.lines.as_slice())
            .unwrap_or(&[])
    }

    /// Mutable access for ingestion only.
    pub(crate) fn station_mut(&mut self, code: StationCode) -> Option<&mut Station> {
        self.stations.get_mut(&code)
    }

    /// All stations within [`NEARBY_RADIUS_KM`] of `coords`, closest first.
    ///
    /// A linear scan: the network is a few tens of thousands of stations
    /// and this runs a handful of times per request.
    pub fn nearby(&self, coords: Coordinates) -> Vec<&Station> {
        let mut found: Vec<(f64, &Station)> = self
            .stations
            .values()
            .filter_map(|station| {
                let dist = coords.distance_km(&station.coords);
                (dist <= NEARBY_RADIUS_KM).then_some((dist, station))
            })
            .collect();
        found.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        found.into_iter().map(|(_, s)| s).collect()
    }

    /// Trace the stops a line passes between two stations, for display.
    ///
    /// Starting at `from`, follows outgoing edges carrying `line_id`,
    /// preferring an edge that lands directly on `to` and otherwise taking
    /// the first match that does not revisit a station already seen in
    /// this trace. Stops on reaching `to`, at a dead end, or after
    /// [`MAX_SEGMENT_EXPANSION_STEPS`] steps. Returns the partial path
    /// walked, endpoints included where reached.
    pub fn stations_along_line_segment(
        &self,
        line_id: &str,
        from: StationCode,
        to: StationCode,
    ) -> Vec<&Station> {
        let mut path = Vec::new();
        let Ok(start) = self.station_by_code(from) else {
            return path;
        };
        path.push(start);

        let mut visited: HashSet<StationCode> = HashSet::from([from]);
        let mut current = from;
        let mut steps = 0;

        while current != to && steps < MAX_SEGMENT_EXPANSION_STEPS {
            steps += 1;

            let lines = self.lines_from(current);
            let next = lines
                .iter()
                .find(|l| l.id == line_id && l.to == to)
                .or_else(|| {
                    lines
                        .iter()
                        .find(|l| l.id == line_id && !visited.contains(&l.to))
                });

            let Some(next) = next else {
                break;
            };
            let Ok(station) = self.station_by_code(next.to) else {
                break;
            };

            current = next.to;
            visited.insert(current);
            path.push(station);
        }

        path
    }
}
