//! End-to-end planner scenarios over hand-built fixture graphs.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::{Coordinates, PlannerError, StationCode, TransportMode, TransportationLine};
use crate::graph::Graph;

use super::config::GaParams;
use super::journey::{PlanOutcome, WalkReason};
use super::orchestrator::{PlanRequest, RoutePlanner};
use super::population::Population;

fn code(c: i64) -> StationCode {
    StationCode::new(c)
}

fn add_line(graph: &mut Graph, from: i64, id: &str, to: i64, minutes: f64) {
    let line = TransportationLine::new(id, code(to), minutes, TransportMode::Bus);
    graph
        .station_mut(code(from))
        .expect("station must exist")
        .lines
        .push(line);
}

fn params() -> GaParams {
    // Small but real GA runs keep the scenarios fast.
    GaParams::new(30, 0.3, 20)
}

async fn plan(graph: Graph, user: Coordinates, dest: Coordinates) -> PlanOutcome {
    let planner = RoutePlanner::new(Arc::new(graph));
    planner
        .plan(&PlanRequest {
            user_coords: user,
            dest_coords: dest,
            params: params(),
        })
        .await
        .expect("request is well-formed")
}

/// Two-hop direct line: A -L1-> B -L1-> C.
#[test]
fn two_hop_direct_line() {
    let mut g = Graph::new();
    g.add_station(code(1), "A", Coordinates::new(0.0, 0.0));
    g.add_station(code(2), "B", Coordinates::new(0.0, 0.005));
    g.add_station(code(3), "C", Coordinates::new(0.0, 0.010));
    add_line(&mut g, 1, "L1", 2, 5.0);
    add_line(&mut g, 2, "L1", 3, 5.0);
    let graph = Arc::new(g);

    let pop = Population::with_rng(
        20,
        code(1),
        code(3),
        Coordinates::new(0.0, 0.0),
        Coordinates::new(0.0, 0.010),
        graph.clone(),
        ChaCha8Rng::seed_from_u64(42),
    )
    .expect("path exists");

    let best = pop.best().unwrap();
    assert!(best.is_valid(code(1), code(3), &graph));
    assert!(best.steps()[0].line.is_start());
    assert_eq!(best.transfer_count(), 0);
    let time = best.total_time_estimate(&graph);
    assert!((time - 10.0).abs() < 1e-6, "got {time}");
    assert!(
        best.fitness(
            code(1),
            code(3),
            &graph,
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.0, 0.010),
        ) > 0.0
    );
}

/// Forced transfer: reaching D requires changing from L1 to L2 at B.
#[test]
fn forced_transfer_costs_forty_five() {
    let mut g = Graph::new();
    g.add_station(code(1), "A", Coordinates::new(0.0, 0.0));
    g.add_station(code(2), "B", Coordinates::new(0.0, 0.005));
    g.add_station(code(3), "C", Coordinates::new(0.0, 0.010));
    g.add_station(code(4), "D", Coordinates::new(0.0, 0.020));
    add_line(&mut g, 1, "L1", 2, 5.0);
    add_line(&mut g, 2, "L1", 3, 5.0);
    add_line(&mut g, 2, "L2", 4, 5.0);
    let graph = Arc::new(g);

    let user = Coordinates::new(0.0, 0.0);
    let dest = Coordinates::new(0.0, 0.020);
    let pop = Population::with_rng(
        20,
        code(1),
        code(4),
        user,
        dest,
        graph.clone(),
        ChaCha8Rng::seed_from_u64(7),
    )
    .expect("path exists");

    let best = pop.best().unwrap();
    assert!(best.is_valid(code(1), code(4), &graph));
    assert_eq!(best.transfer_count(), 1);

    // The transfer penalty dominates this small route's score.
    let fitness = best.fitness(code(1), code(4), &graph, user, dest);
    assert!(fitness > 0.0);
    let score = 1.0 / fitness;
    assert!(score > 45.0, "score {score} must include the transfer penalty");
}

/// Direct-walk override: a short hop where walking beats a slow ride.
#[tokio::test(flavor = "multi_thread")]
async fn direct_walk_override() {
    let mut g = Graph::new();
    // Stations bracket the trip so transit exists but saves nothing:
    // the ride itself is slower than walking the ~0.89 km directly.
    g.add_station(code(1), "Origin Stop", Coordinates::new(0.0, 0.0));
    g.add_station(code(2), "Dest Stop", Coordinates::new(0.0, 0.008));
    add_line(&mut g, 1, "SLOW", 2, 12.0);

    let outcome = plan(
        g,
        Coordinates::new(0.0, 0.0),
        Coordinates::new(0.0, 0.008),
    )
    .await;

    match outcome {
        PlanOutcome::DirectWalk(advisory) => {
            assert_eq!(advisory.reason, WalkReason::WalkComparable);
            assert!(advisory.walk_distance_km < 1.0);
            assert!(advisory.alternative_time_mins.is_some());
        }
        other => panic!("expected a direct-walk advisory, got {other:?}"),
    }
}

/// No path: disconnected components and a 10 km direct walk.
#[tokio::test(flavor = "multi_thread")]
async fn no_route_when_disconnected_and_walk_too_long() {
    let mut g = Graph::new();
    g.add_station(code(1), "IslandA", Coordinates::new(0.0, 0.0));
    g.add_station(code(2), "IslandB", Coordinates::new(0.0, 0.09));
    // No lines at all: the components are trivially disconnected.

    let outcome = plan(
        g,
        Coordinates::new(0.0, 0.0),
        Coordinates::new(0.0, 0.09),
    )
    .await;

    assert!(matches!(outcome, PlanOutcome::NoRoute));
}

/// Walk-only transit route with a feasible direct walk is overridden.
#[tokio::test(flavor = "multi_thread")]
async fn walk_only_route_recommends_direct_walk() {
    let mut g = Graph::new();
    // Two stations ~0.33 km apart. The ride is so slow that mutation's
    // terminal-walk shortcut (under 0.5 km) always wins, leaving a route
    // of only Start + Walk steps.
    g.add_station(code(1), "Near", Coordinates::new(0.0, 0.0));
    g.add_station(code(2), "Far", Coordinates::new(0.0, 0.003));
    add_line(&mut g, 1, "CRAWL", 2, 45.0);

    let outcome = plan(
        g,
        Coordinates::new(0.0, 0.0),
        Coordinates::new(0.0, 0.003),
    )
    .await;

    match outcome {
        PlanOutcome::DirectWalk(advisory) => {
            assert_eq!(advisory.reason, WalkReason::RouteUsedNoTransit);
            assert!(advisory.alternative_time_mins.is_some());
        }
        other => panic!("expected a direct-walk advisory, got {other:?}"),
    }
}

/// Fan-out winner determinism: with one clearly superior start station,
/// the reduce step must pick it regardless of task completion order.
#[tokio::test(flavor = "multi_thread")]
async fn fanout_picks_the_fastest_start_station() {
    let mut g = Graph::new();
    let user = Coordinates::new(0.0, 0.0);
    let dest = Coordinates::new(0.0, 0.05);

    // Three candidate starts near the user.
    g.add_station(code(1), "S1", Coordinates::new(0.0, 0.001));
    g.add_station(code(2), "S2", Coordinates::new(0.0, 0.002));
    g.add_station(code(3), "S3", Coordinates::new(0.0, 0.004));
    // The end station near the destination.
    g.add_station(code(9), "End", Coordinates::new(0.0, 0.0495));
    // Relay stations far from everything walkable.
    g.add_station(code(11), "M1", Coordinates::new(0.05, 0.025));
    g.add_station(code(13), "M3", Coordinates::new(-0.05, 0.025));

    // S1 and S3 reach the end slowly via relays; S2 rides straight there.
    add_line(&mut g, 1, "A1", 11, 60.0);
    add_line(&mut g, 11, "A1", 9, 60.0);
    add_line(&mut g, 3, "A3", 13, 60.0);
    add_line(&mut g, 13, "A3", 9, 60.0);
    add_line(&mut g, 2, "EXPRESS", 9, 5.0);

    let planner = RoutePlanner::new(Arc::new(g));
    // Task completion order varies between runs; the winner must not.
    for _ in 0..3 {
        let outcome = planner
            .plan(&PlanRequest {
                user_coords: user,
                dest_coords: dest,
                params: params(),
            })
            .await
            .expect("request is well-formed");

        match outcome {
            PlanOutcome::RouteFound(doc) => {
                assert_eq!(doc.from_station.code, code(2), "expected the express start");
            }
            other => panic!("expected a transit route, got {other:?}"),
        }
    }
}

/// An end station within the discovery radius never triggers the
/// long-final-walk warning.
#[tokio::test(flavor = "multi_thread")]
async fn short_final_walk_carries_no_warning() {
    let mut g = Graph::new();
    let user = Coordinates::new(0.0, 0.0);
    g.add_station(code(1), "Start", Coordinates::new(0.0, 0.0));
    g.add_station(code(2), "End", Coordinates::new(0.0, 0.04));
    add_line(&mut g, 1, "R1", 2, 4.0);

    let outcome = plan(g, user, Coordinates::new(0.0, 0.0405)).await;
    match outcome {
        PlanOutcome::RouteFound(doc) => assert!(doc.warning.is_none()),
        other => panic!("expected a transit route, got {other:?}"),
    }
}

/// Invalid GA parameters are rejected before any work happens.
#[tokio::test(flavor = "multi_thread")]
async fn invalid_params_are_rejected() {
    let mut g = Graph::new();
    g.add_station(code(1), "A", Coordinates::new(0.0, 0.0));
    let planner = RoutePlanner::new(Arc::new(g));

    let err = planner
        .plan(&PlanRequest {
            user_coords: Coordinates::new(0.0, 0.0),
            dest_coords: Coordinates::new(0.0, 0.001),
            params: GaParams::new(0, 0.3, 10),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::InvalidInput(_)));
}

/// Coordinates outside WGS84 bounds are invalid input.
#[tokio::test(flavor = "multi_thread")]
async fn invalid_coordinates_are_rejected() {
    let g = Graph::new();
    let planner = RoutePlanner::new(Arc::new(g));

    let err = planner
        .plan(&PlanRequest {
            user_coords: Coordinates::new(95.0, 0.0),
            dest_coords: Coordinates::new(0.0, 0.0),
            params: GaParams::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::InvalidInput(_)));
}

/// Nothing within the nearby radius of the start.
#[tokio::test(flavor = "multi_thread")]
async fn no_nearby_stations_is_reported() {
    let mut g = Graph::new();
    g.add_station(code(1), "Lonely", Coordinates::new(10.0, 10.0));
    let planner = RoutePlanner::new(Arc::new(g));

    let err = planner
        .plan(&PlanRequest {
            user_coords: Coordinates::new(0.0, 0.0),
            dest_coords: Coordinates::new(10.0, 10.0),
            params: GaParams::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlannerError::NoNearbyStations { which: "start" }
    ));
}
