//! Request orchestration: from two coordinates to a journey.
//!
//! Picks representative candidate start stations near the user, the
//! single closest station to the destination, fans an independent GA run
//! out per candidate on blocking worker threads, reduces to the fittest
//! result, and finally decides whether plain walking beats transit.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::{Coordinates, PlannerError, Station, StationCode, WALK_SPEED_KMH};
use crate::graph::Graph;

use super::config::GaParams;
use super::journey::{
    build_route_document, DirectWalkAdvisory, PlanOutcome, WalkReason,
};
use super::population::Population;
use super::route::Route;

/// Longest distance the planner will ever advise covering entirely on
/// foot.
pub const MAX_REASONABLE_WALK_KM: f64 = 2.0;

/// Walking wins when it is within this many minutes of the transit time.
pub const PREFER_WALK_THRESHOLD_MINS: f64 = 5.0;

/// Final walks longer than this earn the route a warning.
pub const MAX_FINAL_WALK_KM: f64 = 1.5;

/// At most this many candidate start stations run a GA.
const MAX_START_CANDIDATES: usize = 3;

/// A coordinate-to-coordinate planning request.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest {
    pub user_coords: Coordinates,
    pub dest_coords: Coordinates,
    pub params: GaParams,
}

/// What one GA task produced. Failures are data, not errors: a failed
/// task must never take its siblings down.
#[derive(Debug)]
struct GaTaskOutcome {
    start: StationCode,
    end: StationCode,
    route: Option<Route>,
    fitness: f64,
}

impl GaTaskOutcome {
    fn failed(start: StationCode, end: StationCode) -> Self {
        Self {
            start,
            end,
            route: None,
            fitness: 0.0,
        }
    }
}

/// The fittest route across all GA tasks.
struct BestRoute {
    start: StationCode,
    end: StationCode,
    route: Route,
    fitness: f64,
}

/// The coordinate-to-coordinate route planner.
pub struct RoutePlanner {
    graph: Arc<Graph>,
}

impl RoutePlanner {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Plan a journey between two coordinate pairs.
    pub async fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlannerError> {
        if !request.user_coords.is_valid() || !request.dest_coords.is_valid() {
            return Err(PlannerError::InvalidInput(
                "coordinates out of range".into(),
            ));
        }
        request.params.validate()?;

        let start_candidates = self.graph.nearby(request.user_coords);
        if start_candidates.is_empty() {
            return Err(PlannerError::NoNearbyStations { which: "start" });
        }
        let end_candidates = self.graph.nearby(request.dest_coords);
        if end_candidates.is_empty() {
            return Err(PlannerError::NoNearbyStations { which: "end" });
        }

        let starts = select_representative_starts(&start_candidates);
        // Candidates come back sorted by distance, so the closest end
        // station is simply the first.
        let end = end_candidates[0].clone();
        debug!(
            starts = starts.len(),
            end = %end.code,
            "selected candidate stations"
        );

        let best = self.run_ga_fanout(&starts, &end, request).await;
        Ok(self.decide(best, request))
    }

    /// Launch one GA per (start, end) pair on blocking worker threads and
    /// keep the fittest successful result.
    async fn run_ga_fanout(
        &self,
        starts: &[Station],
        end: &Station,
        request: &PlanRequest,
    ) -> Option<BestRoute> {
        let mut handles = Vec::new();
        for start in starts {
            if start.code == end.code {
                debug!(code = %start.code, "skipping GA task for start == end");
                continue;
            }

            let graph = Arc::clone(&self.graph);
            let start_code = start.code;
            let end_code = end.code;
            let req = *request;
            handles.push(tokio::task::spawn_blocking(move || {
                run_ga_task(graph, start_code, end_code, &req)
            }));
        }

        if handles.is_empty() {
            return None;
        }
        info!(tasks = handles.len(), "launched GA tasks");

        let mut best: Option<BestRoute> = None;
        for joined in join_all(handles).await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    // A panicking task forfeits its result; the request
                    // carries on with the siblings.
                    warn!(error = %e, "GA task died");
                    continue;
                }
            };

            debug!(
                start = %outcome.start,
                fitness = outcome.fitness,
                success = outcome.route.is_some(),
                "GA task finished"
            );

            let Some(route) = outcome.route else {
                continue;
            };
            if outcome.fitness > best.as_ref().map_or(0.0, |b| b.fitness) {
                best = Some(BestRoute {
                    start: outcome.start,
                    end: outcome.end,
                    route,
                    fitness: outcome.fitness,
                });
            }
        }
        best
    }

    /// Apply the walk-versus-transit decision rules to the reduce result.
    fn decide(&self, best: Option<BestRoute>, request: &PlanRequest) -> PlanOutcome {
        let direct_km = request.user_coords.distance_km(&request.dest_coords);
        let direct_mins = direct_km / WALK_SPEED_KMH * 60.0;
        let walk_feasible = direct_km < MAX_REASONABLE_WALK_KM;

        let advisory = |reason: WalkReason, alternative: Option<f64>| {
            PlanOutcome::DirectWalk(DirectWalkAdvisory {
                reason,
                walk_distance_km: direct_km,
                walk_time_mins: direct_mins,
                from: request.user_coords,
                to: request.dest_coords,
                alternative_time_mins: alternative,
            })
        };

        let Some(winner) = best else {
            return if walk_feasible {
                advisory(WalkReason::NoTransitRoute, None)
            } else {
                PlanOutcome::NoRoute
            };
        };
        let route = &winner.route;

        let transit_mins = route.full_journey_time(
            &self.graph,
            winner.start,
            winner.end,
            request.user_coords,
            request.dest_coords,
        );

        if route.uses_no_public_transport() && walk_feasible {
            return advisory(WalkReason::RouteUsedNoTransit, Some(transit_mins));
        }

        if !route.uses_no_public_transport()
            && direct_mins < transit_mins + PREFER_WALK_THRESHOLD_MINS
            && walk_feasible
        {
            return advisory(WalkReason::WalkComparable, Some(transit_mins));
        }

        let mut document = build_route_document(
            route,
            winner.start,
            winner.end,
            winner.fitness,
            &self.graph,
            request.user_coords,
            request.dest_coords,
        );

        let final_walk_km = self
            .graph
            .station_by_code(winner.end)
            .map(|s| s.coords.distance_km(&request.dest_coords))
            .unwrap_or(0.0);
        if final_walk_km > MAX_FINAL_WALK_KM {
            document.warning = Some(format!(
                "Route requires a long final walk ({final_walk_km:.2} km)"
            ));
        }

        PlanOutcome::RouteFound(Box::new(document))
    }
}

/// One GA run for a (start, end) pair. Every failure path collapses into
/// an unsuccessful outcome.
fn run_ga_task(
    graph: Arc<Graph>,
    start: StationCode,
    end: StationCode,
    request: &PlanRequest,
) -> GaTaskOutcome {
    let mut population = match Population::new(
        request.params.population_size,
        start,
        end,
        request.user_coords,
        request.dest_coords,
        Arc::clone(&graph),
    ) {
        Ok(p) => p,
        Err(e) => {
            debug!(start = %start, end = %end, error = %e, "GA population construction failed");
            return GaTaskOutcome::failed(start, end);
        }
    };

    population.evolve(request.params.generations, request.params.mutation_rate);

    match population.best() {
        Ok(best) => {
            let fitness = best.fitness(
                start,
                end,
                &graph,
                request.user_coords,
                request.dest_coords,
            );
            if best.is_valid(start, end, &graph) && fitness > 0.0 && fitness.is_finite() {
                GaTaskOutcome {
                    start,
                    end,
                    route: Some(best.clone()),
                    fitness,
                }
            } else {
                debug!(start = %start, end = %end, fitness, "GA produced no usable route");
                GaTaskOutcome::failed(start, end)
            }
        }
        Err(e) => {
            debug!(start = %start, end = %end, error = %e, "GA population ended empty");
            GaTaskOutcome::failed(start, end)
        }
    }
}

/// Pick up to three representative start stations from the nearby list,
/// which arrives already sorted by distance to the user.
///
/// S1 is the closest; Sn the farthest (when distinct); Sk the mid-range
/// station lying farthest from S1, approximating "most different
/// bearing", with the second closest as fallback.
fn select_representative_starts(nearby: &[&Station]) -> Vec<Station> {
    let mut selected: Vec<Station> = Vec::new();
    if nearby.is_empty() {
        return selected;
    }

    let already = |selected: &[Station], code: StationCode| {
        selected.iter().any(|s| s.code == code)
    };

    let closest = nearby[0];
    selected.push(closest.clone());
    if nearby.len() == 1 {
        return selected;
    }

    let farthest = nearby[nearby.len() - 1];
    if !already(&selected, farthest.code) {
        selected.push(farthest.clone());
    }

    // Two distinct stations but the farthest collided with the closest:
    // fall back to the runner-up by distance.
    if selected.len() < 2 {
        let second = nearby[1];
        if !already(&selected, second.code) {
            selected.push(second.clone());
        }
    }

    if nearby.len() < 3 || selected.len() >= MAX_START_CANDIDATES {
        selected.truncate(MAX_START_CANDIDATES);
        return selected;
    }

    // Mid-range candidate most distant from S1.
    let mut best_mid: Option<(&Station, f64)> = None;
    for candidate in &nearby[1..nearby.len() - 1] {
        if already(&selected, candidate.code) {
            continue;
        }
        let dist = closest.coords.distance_km(&candidate.coords);
        if best_mid.is_none_or(|(_, best)| dist > best) {
            best_mid = Some((candidate, dist));
        }
    }

    match best_mid {
        Some((station, _)) => selected.push(station.clone()),
        None => {
            let second = nearby[1];
            if !already(&selected, second.code) {
                selected.push(second.clone());
            }
        }
    }

    selected.truncate(MAX_START_CANDIDATES);
    selected
}
