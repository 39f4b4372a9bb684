//! The TCP request/response boundary.
//!
//! One JSON request per connection: read it, dispatch on its `type`
//! field, write one JSON response, close. All planner errors become
//! error payloads; the connection always gets an answer.

pub mod dto;

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::domain::{PlannerError, StationCode};
use crate::graph::Graph;
use crate::planner::{PlanRequest, RoutePlanner};

use dto::{
    encode_outcome, ErrorResponse, LineEntry, LinesResponse, RouteRequest, StationInfoResponse,
    StationRequest,
};

/// Upper bound on a single request's size.
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Accept connections forever, spawning one handler task per client.
pub async fn serve(config: &ServerConfig, graph: Arc<Graph>) -> Result<(), PlannerError> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| PlannerError::Io(format!("bind {}: {e}", config.bind_addr)))?;
    info!(addr = %config.bind_addr, "listening for requests");

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| PlannerError::Io(format!("accept: {e}")))?;
        debug!(%peer, "client connected");

        let graph = Arc::clone(&graph);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, graph).await {
                warn!(%peer, error = %e, "connection handler failed");
            }
        });
    }
}

/// What arrived on a connection.
enum RequestPayload {
    /// Connection closed without sending anything.
    Empty,
    /// Bytes arrived but never parsed as JSON.
    Malformed(String),
    /// A request too big to be honest.
    Oversized,
    /// A decoded JSON request.
    Json(Value),
}

/// Serve one client: read a request, answer it, close the socket.
async fn handle_connection(mut stream: TcpStream, graph: Arc<Graph>) -> std::io::Result<()> {
    let response = match read_request(&mut stream).await? {
        RequestPayload::Json(request) => dispatch(request, &graph).await,
        RequestPayload::Empty => ErrorResponse::new("Empty request received"),
        RequestPayload::Malformed(details) => {
            ErrorResponse::with_details("Invalid JSON format", details)
        }
        RequestPayload::Oversized => ErrorResponse::new("Request too large"),
    };

    let body = serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
        format!(r#"{{"error": "Response encoding failed", "details": "{e}"}}"#)
    });
    stream.write_all(body.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read until the buffer parses as one JSON value.
///
/// Clients send a single JSON blob and then wait for the reply, so there
/// is no framing: a successful parse is the end-of-request signal.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<RequestPayload> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            // Peer closed its half before a JSON value completed.
            if buffer.is_empty() {
                return Ok(RequestPayload::Empty);
            }
            return Ok(match serde_json::from_slice(&buffer) {
                Ok(value) => RequestPayload::Json(value),
                Err(e) => RequestPayload::Malformed(e.to_string()),
            });
        }
        buffer.extend_from_slice(&chunk[..n]);

        if let Ok(value) = serde_json::from_slice::<Value>(&buffer) {
            return Ok(RequestPayload::Json(value));
        }
        if buffer.len() > MAX_REQUEST_BYTES {
            return Ok(RequestPayload::Oversized);
        }
    }
}

/// Route a decoded request to its handler by `type`.
async fn dispatch(request: Value, graph: &Arc<Graph>) -> Value {
    let request_type = request.get("type").and_then(Value::as_i64);
    match request_type {
        Some(0) => handle_get_lines(&request, graph),
        Some(1) => handle_station_info(&request, graph),
        Some(2) => handle_plan_route(&request, graph).await,
        _ => ErrorResponse::new("Invalid request type"),
    }
}

/// Type 0: the outgoing lines of a station.
fn handle_get_lines(request: &Value, graph: &Graph) -> Value {
    let Some(station_id) = decode_station_id(request) else {
        return ErrorResponse::new("Invalid or missing stationId");
    };
    if !graph.has_station(station_id) {
        return ErrorResponse::new("Invalid or missing stationId");
    }

    let lines = graph.lines_from(station_id);
    let entries: Vec<LineEntry> = lines
        .iter()
        .map(|line| LineEntry {
            id: line.id.clone(),
            to_code: line.to,
            to_name: graph
                .station_by_code(line.to)
                .map(|s| s.name.clone())
                .unwrap_or_else(|_| "[Station Code Not Found]".into()),
        })
        .collect();

    serde_json::json!(LinesResponse {
        station_id,
        message: entries.is_empty().then(|| "No lines found".into()),
        lines: entries,
    })
}

/// Type 1: station details.
fn handle_station_info(request: &Value, graph: &Graph) -> Value {
    let Some(station_id) = decode_station_id(request) else {
        return ErrorResponse::new("Invalid or missing stationId");
    };
    match graph.station_by_code(station_id) {
        Ok(station) => serde_json::json!(StationInfoResponse {
            code: station.code,
            name: station.name.clone(),
            latitude: station.coords.latitude,
            longitude: station.coords.longitude,
        }),
        Err(_) => ErrorResponse::new("Invalid or missing stationId"),
    }
}

fn decode_station_id(request: &Value) -> Option<StationCode> {
    serde_json::from_value::<StationRequest>(request.clone())
        .ok()
        .map(|r| StationCode::new(r.station_id))
}

/// Type 2: plan a coordinate-to-coordinate journey.
async fn handle_plan_route(request: &Value, graph: &Arc<Graph>) -> Value {
    let route_request: RouteRequest = match serde_json::from_value(request.clone()) {
        Ok(r) => r,
        Err(e) => {
            return ErrorResponse::with_details(
                "Invalid coordinate or parameter format",
                e.to_string(),
            )
        }
    };

    let planner = RoutePlanner::new(Arc::clone(graph));
    let plan_request = PlanRequest {
        user_coords: route_request.user_coords(),
        dest_coords: route_request.dest_coords(),
        params: route_request.ga_params(),
    };

    match planner.plan(&plan_request).await {
        Ok(outcome) => encode_outcome(&outcome),
        Err(PlannerError::InvalidInput(message)) => ErrorResponse::new(message),
        Err(e @ PlannerError::NoNearbyStations { .. }) => ErrorResponse::new(e.to_string()),
        Err(e) => {
            warn!(error = %e, "route planning failed unexpectedly");
            ErrorResponse::with_details("Processing error during request", e.to_string())
        }
    }
}
