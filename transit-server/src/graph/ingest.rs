//! GTFS ingestion: builds the [`Graph`] from the feed's text files.
//!
//! Two passes. `stops.txt` yields the stations; `stop_times_filtered.txt`
//! yields the edges, with records grouped by trip in temporal order so
//! each row names the next stop of the previous row's edge.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::{Coordinates, PlannerError, StationCode, TransportMode, TransportationLine};

use super::Graph;

/// Load the full transit graph from a GTFS directory.
pub fn load_graph(dir: &Path) -> Result<Graph, PlannerError> {
    let mut graph = Graph::new();
    load_stops(&mut graph, &dir.join("stops.txt"))?;
    load_stop_times(&mut graph, &dir.join("stop_times_filtered.txt"))?;
    info!(
        stations = graph.station_count(),
        "transit graph built from GTFS feed"
    );
    Ok(graph)
}

/// Split a comma-delimited record, stripping one layer of double quotes
/// from each field. Fields in this feed never contain embedded commas.
fn split_record(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|field| {
            let field = field.strip_prefix('"').unwrap_or(field);
            field.strip_suffix('"').unwrap_or(field)
        })
        .collect()
}

/// Convert a GTFS `HH:MM:SS` time to minutes since midnight, truncating
/// seconds. Hours may exceed 23 for after-midnight trips.
fn time_to_minutes(text: &str) -> Result<u32, PlannerError> {
    let mut parts = text.split(':');
    let hours: u32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(|| PlannerError::Parse(format!("bad time {text:?}")))?;
    let minutes: u32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(|| PlannerError::Parse(format!("bad time {text:?}")))?;
    Ok(hours * 60 + minutes)
}

/// First pass: insert one station per `stops.txt` record.
///
/// Records with unparseable fields are logged and skipped; a record with
/// out-of-range coordinates is logged but the station is still inserted.
fn load_stops(graph: &mut Graph, path: &Path) -> Result<(), PlannerError> {
    let file = File::open(path)
        .map_err(|e| PlannerError::Io(format!("{}: {e}", path.display())))?;
    let reader = BufReader::new(file);

    let mut inserted = 0usize;
    for (row, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| PlannerError::Io(format!("{}: {e}", path.display())))?;
        if row == 0 {
            continue; // header
        }

        let fields = split_record(&line);
        if fields.len() < 6 {
            warn!(row, "stops.txt record too short, skipped");
            continue;
        }

        let code: i64 = match fields[1].parse() {
            Ok(c) => c,
            Err(_) => {
                warn!(row, code = fields[1], "stops.txt record has bad stop code, skipped");
                continue;
            }
        };
        let name = fields[2];
        let (lat, lon) = match (fields[4].parse::<f64>(), fields[5].parse::<f64>()) {
            (Ok(lat), Ok(lon)) => (lat, lon),
            _ => {
                warn!(row, code, "stops.txt record has bad coordinates, skipped");
                continue;
            }
        };

        let coords = Coordinates::new(lat, lon);
        if !coords.is_valid() {
            warn!(code, lat, lon, "station has out-of-range coordinates");
        }
        graph.add_station(StationCode::new(code), name, coords);
        inserted += 1;
    }

    info!(stations = inserted, path = %path.display(), "GTFS stops loaded");
    Ok(())
}

/// Where the previous stop-times row put its line, so the current row can
/// close that edge. Kept as indices and re-resolved on use: the line
/// vectors grow while this pass runs.
#[derive(Clone, Copy)]
struct LastLineSlot {
    station: StationCode,
    line_index: usize,
}

/// Second pass: build the edges from `stop_times_filtered.txt`.
///
/// Rows are grouped by trip. For each row, the previous row of the same
/// trip has its edge's destination set to this row's station, and this
/// row's arrival time is appended to the (per-station, per-line-id)
/// aggregated line.
fn load_stop_times(graph: &mut Graph, path: &Path) -> Result<(), PlannerError> {
    let file = File::open(path)
        .map_err(|e| PlannerError::Io(format!("{}: {e}", path.display())))?;
    let reader = BufReader::new(file);

    let mut last_trip: Option<i64> = None;
    let mut last_slot: Option<LastLineSlot> = None;
    let mut rows = 0usize;

    for (row, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| PlannerError::Io(format!("{}: {e}", path.display())))?;
        if row == 0 {
            continue; // header
        }

        let fields = split_record(&line);
        if fields.len() < 4 {
            warn!(row, "stop_times record too short, skipped");
            continue;
        }

        let line_id = fields[0];
        let trip: i64 = match fields[1].parse() {
            Ok(t) => t,
            Err(_) => {
                warn!(row, trip = fields[1], "stop_times record has bad trip id, skipped");
                continue;
            }
        };
        let minutes = match time_to_minutes(fields[2]) {
            Ok(m) => m,
            Err(e) => {
                warn!(row, %e, "stop_times record has bad time, skipped");
                continue;
            }
        };
        let station_code: i64 = match fields[3].parse() {
            Ok(c) => c,
            Err(_) => {
                warn!(row, code = fields[3], "stop_times record has bad station code, skipped");
                continue;
            }
        };
        let station_code = StationCode::new(station_code);

        if !graph.has_station(station_code) {
            warn!(row, code = %station_code, "stop_times row names unknown station, skipped");
            last_trip = Some(trip);
            last_slot = None;
            continue;
        }

        // This row continues the previous trip: the previous row's edge
        // terminates here.
        if last_trip == Some(trip) {
            if let Some(slot) = last_slot {
                if let Some(station) = graph.station_mut(slot.station) {
                    if let Some(prev_line) = station.lines.get_mut(slot.line_index) {
                        prev_line.to = station_code;
                    }
                }
            }
        }

        let station = graph
            .station_mut(station_code)
            .ok_or_else(|| PlannerError::Internal("station vanished during ingestion".into()))?;

        let line_index = match station.lines.iter().position(|l| l.id == line_id) {
            Some(idx) => {
                station.lines[idx].arrival_times.push(minutes);
                idx
            }
            None => {
                let mut new_line = TransportationLine::new(
                    line_id,
                    TransportationLine::UNSET_DESTINATION,
                    0.0,
                    TransportMode::Bus,
                );
                new_line.arrival_times.push(minutes);
                station.lines.push(new_line);
                station.lines.len() - 1
            }
        };

        last_slot = Some(LastLineSlot {
            station: station_code,
            line_index,
        });
        last_trip = Some(trip);
        rows += 1;
    }

    debug!(rows, path = %path.display(), "GTFS stop times loaded");
    Ok(())
}
