//! Journey documents: what the planner hands back for display.
//!
//! Turns a winning [`Route`] into a sequence of detailed steps with
//! from/to stations, intermediate stops expanded along each line, and an
//! action description for the traveller at each point.

use serde::Serialize;

use crate::domain::{Coordinates, StationCode, TransportationLine};
use crate::graph::Graph;

use super::route::{Route, VisitedStep};

/// A station as it appears inside a journey document. A failed lookup
/// degrades to an error marker for that station instead of failing the
/// whole response.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StationInfo {
    Known {
        code: StationCode,
        name: String,
        lat: f64,
        long: f64,
    },
    Missing {
        code: StationCode,
        error: String,
    },
}

impl StationInfo {
    fn lookup(graph: &Graph, code: StationCode) -> Self {
        match graph.station_by_code(code) {
            Ok(station) => StationInfo::Known {
                code,
                name: station.name.clone(),
                lat: station.coords.latitude,
                long: station.coords.longitude,
            },
            Err(_) => StationInfo::Missing {
                code,
                error: "Station info lookup failed".into(),
            },
        }
    }
}

/// One displayed segment of a journey: a single line taken between two
/// action-relevant stations.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedStep {
    pub segment_index: usize,
    pub line_id: String,
    pub from: StationInfo,
    pub to: StationInfo,
    pub intermediate_stops: Vec<StationInfo>,
    pub action_description: String,
    pub from_is_action_point: bool,
    pub to_is_action_point: bool,
}

/// Aggregate numbers for a found route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub fitness: f64,
    pub time_mins: f64,
    pub cost: f64,
    pub transfers: usize,
}

/// Station identity used in the document header.
#[derive(Debug, Clone, Serialize)]
pub struct StationBrief {
    pub code: StationCode,
    pub name: String,
}

impl StationBrief {
    fn lookup(graph: &Graph, code: StationCode) -> Self {
        let name = graph
            .station_by_code(code)
            .map(|s| s.name.clone())
            .unwrap_or_else(|_| "[unknown station]".into());
        Self { code, name }
    }
}

/// A full transit journey ready for the wire.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDocument {
    pub from_station: StationBrief,
    pub to_station: StationBrief,
    pub summary: RouteSummary,
    pub detailed_steps: Vec<DetailedStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Why the planner recommends walking instead of transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkReason {
    NoTransitRoute,
    RouteUsedNoTransit,
    WalkComparable,
}

impl WalkReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkReason::NoTransitRoute => "No public transport route found",
            WalkReason::RouteUsedNoTransit => "Route involved no public transport",
            WalkReason::WalkComparable => "Direct walk is faster or comparable",
        }
    }
}

/// The planner's advice to walk directly.
#[derive(Debug, Clone)]
pub struct DirectWalkAdvisory {
    pub reason: WalkReason,
    pub walk_distance_km: f64,
    pub walk_time_mins: f64,
    pub from: Coordinates,
    pub to: Coordinates,
    /// Door-to-door time of the transit alternative, when one exists.
    pub alternative_time_mins: Option<f64>,
}

/// Everything a coordinate-to-coordinate request can resolve to.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    RouteFound(Box<RouteDocument>),
    DirectWalk(DirectWalkAdvisory),
    NoRoute,
}

/// Build the display document for a winning route.
pub fn build_route_document(
    route: &Route,
    start: StationCode,
    end: StationCode,
    fitness: f64,
    graph: &Graph,
    user_coords: Coordinates,
    dest_coords: Coordinates,
) -> RouteDocument {
    let summary = RouteSummary {
        fitness,
        time_mins: route.full_journey_time(graph, start, end, user_coords, dest_coords),
        cost: route.total_cost(graph),
        transfers: route.transfer_count(),
    };

    let steps = route.steps();
    let mut detailed_steps = Vec::with_capacity(steps.len());
    let mut segment_start = start;

    for (index, step) in steps.iter().enumerate() {
        let from = StationInfo::lookup(graph, segment_start);
        let to = StationInfo::lookup(graph, step.station.code);

        let intermediate_stops =
            intermediate_stops(graph, &step.line, segment_start, step.station.code);

        let (action_description, from_is_action_point, to_is_action_point) =
            classify_action(index, steps.len(), step, steps.get(index + 1));

        detailed_steps.push(DetailedStep {
            segment_index: index,
            line_id: step.line.id.clone(),
            from,
            to,
            intermediate_stops,
            action_description,
            from_is_action_point,
            to_is_action_point,
        });

        segment_start = step.station.code;
    }

    RouteDocument {
        from_station: StationBrief::lookup(graph, start),
        to_station: StationBrief::lookup(graph, end),
        summary,
        detailed_steps,
        warning: None,
    }
}

/// Expand the stops a public-transport segment passes through, endpoints
/// excluded.
fn intermediate_stops(
    graph: &Graph,
    line: &TransportationLine,
    from: StationCode,
    to: StationCode,
) -> Vec<StationInfo> {
    if line.is_walk() || line.is_start() || from == to {
        return Vec::new();
    }

    let path = graph.stations_along_line_segment(&line.id, from, to);
    let mut stops: Vec<StationInfo> = path
        .iter()
        .skip(1)
        .map(|station| StationInfo::lookup(graph, station.code))
        .collect();

    // Drop the destination endpoint when the trace reached it.
    let reached_end = matches!(stops.last(), Some(StationInfo::Known { code, .. }) if *code == to);
    if reached_end {
        stops.pop();
    }
    stops
}

/// Work out what the traveller does on this segment and whether its
/// endpoints require action.
fn classify_action(
    index: usize,
    total: usize,
    step: &VisitedStep,
    next: Option<&VisitedStep>,
) -> (String, bool, bool) {
    let is_first = index == 0;
    let is_last = index + 1 == total;
    let line = &step.line;
    let current_public = !line.is_walk() && !line.is_start();

    let is_transfer_point = match next {
        Some(next_step) if !is_last => {
            let next_line = &next_step.line;
            let next_public = !next_line.is_walk() && !next_line.is_start();
            (current_public && next_public && line.id != next_line.id)
                || (current_public && !next_public)
                || (!current_public && !line.is_start() && next_public)
        }
        _ => false,
    };

    let description = if is_first {
        if line.is_walk() {
            "Walk to first station".to_string()
        } else {
            "Depart".to_string()
        }
    } else if is_last {
        if line.is_walk() {
            "Walk to destination".to_string()
        } else {
            "Arrive".to_string()
        }
    } else if line.is_walk() {
        "Walk between stations".to_string()
    } else if is_transfer_point {
        "Transfer".to_string()
    } else {
        format!("Continue on {}", line.id)
    };

    (description, is_first, is_last || is_transfer_point)
}
