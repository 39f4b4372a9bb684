//! Wire types for the TCP request/response protocol.
//!
//! One JSON value each way. Requests carry an integer `type` selecting
//! the operation; responses are built from the planner's outcome types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Coordinates, StationCode};
use crate::planner::journey::{DirectWalkAdvisory, PlanOutcome, RouteDocument};
use crate::planner::GaParams;

/// Request type 0 and 1: a single station code.
#[derive(Debug, Deserialize)]
pub struct StationRequest {
    #[serde(rename = "stationId")]
    pub station_id: i64,
}

/// Request type 2: coordinate-to-coordinate route with optional GA
/// parameter overrides.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    #[serde(rename = "startLat")]
    pub start_lat: f64,
    #[serde(rename = "startLong")]
    pub start_long: f64,
    #[serde(rename = "endLat")]
    pub end_lat: f64,
    #[serde(rename = "endLong")]
    pub end_long: f64,
    #[serde(default)]
    pub gen: Option<u32>,
    #[serde(rename = "mut", default)]
    pub mutation: Option<f64>,
    #[serde(rename = "popSize", default)]
    pub pop_size: Option<usize>,
}

impl RouteRequest {
    pub fn user_coords(&self) -> Coordinates {
        Coordinates::new(self.start_lat, self.start_long)
    }

    pub fn dest_coords(&self) -> Coordinates {
        Coordinates::new(self.end_lat, self.end_long)
    }

    /// GA parameters with the defaults filled in where the request is
    /// silent.
    pub fn ga_params(&self) -> GaParams {
        let defaults = GaParams::default();
        GaParams::new(
            self.gen.unwrap_or(defaults.generations),
            self.mutation.unwrap_or(defaults.mutation_rate),
            self.pop_size.unwrap_or(defaults.population_size),
        )
    }
}

/// Error payload: `{error, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Value {
        serde_json::json!(Self {
            error: error.into(),
            details: None,
        })
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Value {
        serde_json::json!(Self {
            error: error.into(),
            details: Some(details.into()),
        })
    }
}

/// One outgoing line in a type-0 response.
#[derive(Debug, Serialize)]
pub struct LineEntry {
    pub id: String,
    pub to_code: StationCode,
    pub to_name: String,
}

/// Type-0 response body.
#[derive(Debug, Serialize)]
pub struct LinesResponse {
    #[serde(rename = "stationId")]
    pub station_id: StationCode,
    pub lines: Vec<LineEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Type-1 response body.
#[derive(Debug, Serialize)]
pub struct StationInfoResponse {
    pub code: StationCode,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
struct CoordsBody {
    lat: f64,
    lon: f64,
}

impl From<Coordinates> for CoordsBody {
    fn from(c: Coordinates) -> Self {
        Self {
            lat: c.latitude,
            lon: c.longitude,
        }
    }
}

#[derive(Debug, Serialize)]
struct DirectWalkBody {
    status: &'static str,
    reason: &'static str,
    walk_distance_km: f64,
    walk_time_mins: f64,
    from_coords: CoordsBody,
    to_coords: CoordsBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    station_route_alternative_time_mins: Option<f64>,
}

impl From<&DirectWalkAdvisory> for DirectWalkBody {
    fn from(advisory: &DirectWalkAdvisory) -> Self {
        Self {
            status: "Direct walk recommended",
            reason: advisory.reason.as_str(),
            walk_distance_km: advisory.walk_distance_km,
            walk_time_mins: advisory.walk_time_mins,
            from_coords: advisory.from.into(),
            to_coords: advisory.to.into(),
            station_route_alternative_time_mins: advisory.alternative_time_mins,
        }
    }
}

#[derive(Debug, Serialize)]
struct RouteFoundBody<'a> {
    status: &'static str,
    #[serde(flatten)]
    document: &'a RouteDocument,
}

/// Encode a planning outcome as its wire JSON.
pub fn encode_outcome(outcome: &PlanOutcome) -> Value {
    match outcome {
        PlanOutcome::RouteFound(document) => serde_json::json!(RouteFoundBody {
            status: "Route found",
            document: document.as_ref(),
        }),
        PlanOutcome::DirectWalk(advisory) => {
            serde_json::json!(DirectWalkBody::from(advisory))
        }
        PlanOutcome::NoRoute => serde_json::json!({
            "status": "No route found (and direct walk too long)"
        }),
    }
}
