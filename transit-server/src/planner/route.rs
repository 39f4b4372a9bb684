//! The GA genome: a candidate route through the transit graph.
//!
//! A [`Route`] is an ordered sequence of [`VisitedStep`]s. Steps own their
//! station and line by value, so routes never alias each other and
//! crossover is a plain copy.

use std::collections::HashSet;

use rand::Rng;

use crate::domain::{
    walk_time_minutes, Coordinates, Station, StationCode, TransportationLine, PT_SPEED_KMH,
    WALK_SPEED_KMH,
};
use crate::graph::Graph;

/// Step cap for one guided path-generation attempt.
pub const MAX_PATH_STEPS: usize = 75;

/// Distance under which path generation finishes with a terminal walk.
pub const SHORT_HOP_WALK_THRESHOLD_KM: f64 = 0.5;

/// Longest hop the walk-replacement mutation will turn into a walk.
pub const MAX_WALK_REPLACE_DISTANCE_KM: f64 = 1.5;

/// How many transit legs walk-replacement may collapse at once.
const MAX_WALK_REPLACE_LEGS: usize = 2;

/// Fitness weights. These are part of the planner's contract: changing
/// them changes which routes win.
const TIME_WEIGHT: f64 = 1.0;
const COST_WEIGHT: f64 = 0.1;
const TRANSFER_PENALTY: f64 = 45.0;
const WALK_PENALTY_FACTOR: f64 = 2.0;

const EPSILON: f64 = 1e-6;

/// One element of a route: the station reached, the line taken to reach
/// it, and the predecessor's code (`None` only on the first step).
#[derive(Debug, Clone, PartialEq)]
pub struct VisitedStep {
    pub station: Station,
    pub line: TransportationLine,
    pub prev: Option<StationCode>,
}

impl VisitedStep {
    pub fn new(station: Station, line: TransportationLine, prev: StationCode) -> Self {
        Self {
            station,
            line,
            prev: Some(prev),
        }
    }

    /// The first step of a route, carrying the `Start` sentinel line.
    pub fn start(station: Station) -> Self {
        let line = TransportationLine::start(station.code);
        Self {
            station,
            line,
            prev: None,
        }
    }
}

/// A candidate journey between two stations.
#[derive(Debug, Clone, Default)]
pub struct Route {
    steps: Vec<VisitedStep>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, step: VisitedStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[VisitedStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether every step travels on foot (`Walk` or the `Start` sentinel).
    pub fn uses_no_public_transport(&self) -> bool {
        self.steps.iter().all(|s| !s.line.mode.is_public())
    }

    /// Estimated in-network travel time in minutes.
    ///
    /// Each segment uses the feed's per-edge travel time when it is
    /// positive, otherwise the great-circle distance between the segment's
    /// stations at 50 km/h (5 km/h for walks). Returns 0 when any station
    /// lookup fails.
    pub fn total_time_estimate(&self, graph: &Graph) -> f64 {
        if self.steps.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for pair in self.steps.windows(2) {
            let step = &pair[1];
            if step.line.travel_time_minutes > 0.0 {
                total += step.line.travel_time_minutes;
                continue;
            }
            let (Ok(prev), Ok(cur)) = (
                graph.station_by_code(pair[0].station.code),
                graph.station_by_code(step.station.code),
            ) else {
                return 0.0;
            };
            let distance = prev.coords.distance_km(&cur.coords);
            let speed = if step.line.mode.is_public() {
                PT_SPEED_KMH
            } else {
                WALK_SPEED_KMH
            };
            total += distance / speed * 60.0;
        }
        total
    }

    /// Estimated fare: the aerial distance covered by public-transport
    /// segments, run through the distance-banded fare table. A route that
    /// never boards a vehicle costs nothing.
    pub fn total_cost(&self, graph: &Graph) -> f64 {
        let mut public_km = 0.0;
        let mut boarded = false;
        for pair in self.steps.windows(2) {
            let step = &pair[1];
            if !step.line.mode.is_public() {
                continue;
            }
            let (Ok(prev), Ok(cur)) = (
                graph.station_by_code(pair[0].station.code),
                graph.station_by_code(step.station.code),
            ) else {
                return 0.0;
            };
            public_km += prev.coords.distance_km(&cur.coords);
            boarded = true;
        }
        if !boarded {
            return 0.0;
        }
        fare_for_distance(public_km)
    }

    /// Number of vehicle-to-vehicle transfers.
    ///
    /// A boarding happens at a step whose mode is public when the previous
    /// step was not public or rode a different line; the first boarding is
    /// free.
    pub fn transfer_count(&self) -> usize {
        let mut boardings = 0usize;
        for pair in self.steps.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.line.mode.is_public()
                && (!prev.line.mode.is_public() || cur.line.id != prev.line.id)
            {
                boardings += 1;
            }
        }
        boardings.saturating_sub(1)
    }

    /// Check the route's structural invariants against the graph.
    pub fn is_valid(&self, start: StationCode, dest: StationCode, graph: &Graph) -> bool {
        let Some(first) = self.steps.first() else {
            return false;
        };

        let Ok(start_station) = graph.station_by_code(start) else {
            return false;
        };
        if first.station != *start_station || first.prev.is_some() {
            return false;
        }

        if self.steps.len() == 1 {
            return start == dest;
        }

        let Some(last) = self.steps.last() else {
            return false;
        };
        if last.line.to != dest {
            return false;
        }
        match graph.station_by_code(dest) {
            Ok(dest_station) if last.station == *dest_station => {}
            _ => return false,
        }

        for step in &self.steps[1..] {
            let Some(prev_code) = step.prev else {
                return false;
            };
            // The station stored must be the graph's station for the
            // line's destination.
            match graph.station_by_code(step.line.to) {
                Ok(arrived) if *arrived == step.station => {}
                _ => return false,
            }
            if !graph.has_station(prev_code) {
                return false;
            }

            // Walk and Start edges are free; everything else must exist
            // as an outgoing line at the predecessor.
            if step.line.is_start() || step.line.is_walk() {
                continue;
            }
            let found = graph
                .lines_from(prev_code)
                .iter()
                .any(|l| l.id == step.line.id && l.to == step.line.to);
            if !found {
                return false;
            }
        }

        true
    }

    /// Walking time spent inside the route, excluding the walks to the
    /// first station and from the last.
    fn internal_walk_time(&self) -> f64 {
        self.steps
            .iter()
            .skip(1)
            .filter(|s| s.line.is_walk())
            .map(|s| s.line.travel_time_minutes)
            .sum()
    }

    /// Fitness of the route: the reciprocal of a weighted generalized
    /// cost, 0 for invalid routes. Higher is better.
    pub fn fitness(
        &self,
        start: StationCode,
        dest: StationCode,
        graph: &Graph,
        user_coords: Coordinates,
        dest_coords: Coordinates,
    ) -> f64 {
        if !self.is_valid(start, dest, graph) {
            return 0.0;
        }
        let (Ok(first), Ok(last)) = (graph.station_by_code(start), graph.station_by_code(dest))
        else {
            return 0.0;
        };

        let initial_walk = walk_time_minutes(user_coords, first.coords);
        let final_walk = walk_time_minutes(last.coords, dest_coords);
        let station_time = self.total_time_estimate(graph);
        let total_walk = initial_walk + final_walk + self.internal_walk_time();
        let cost = self.total_cost(graph);
        let transfers = self.transfer_count() as f64;

        let base = initial_walk + station_time + final_walk;
        let score = TIME_WEIGHT * base
            + (WALK_PENALTY_FACTOR - 1.0) * total_walk
            + COST_WEIGHT * cost
            + TRANSFER_PENALTY * transfers;

        if score <= f64::EPSILON {
            return 0.0;
        }
        1.0 / score
    }

    /// Door-to-door time: walk to the first station, ride, walk from the
    /// last station to the destination.
    pub fn full_journey_time(
        &self,
        graph: &Graph,
        start: StationCode,
        dest: StationCode,
        user_coords: Coordinates,
        dest_coords: Coordinates,
    ) -> f64 {
        let initial = graph
            .station_by_code(start)
            .map(|s| walk_time_minutes(user_coords, s.coords))
            .unwrap_or(0.0);
        let last = graph
            .station_by_code(dest)
            .map(|s| walk_time_minutes(s.coords, dest_coords))
            .unwrap_or(0.0);
        initial + self.total_time_estimate(graph) + last
    }

    /// Mutate the route in place.
    ///
    /// With probability `1 - rate` does nothing. Otherwise either
    /// regenerates the tail from a random cut point (the common case) or
    /// collapses one or two short legs into a synthetic walk.
    pub fn mutate<R: Rng>(&mut self, rate: f64, rng: &mut R, dest: StationCode, graph: &Graph) {
        if rng.gen::<f64>() >= rate {
            return;
        }
        let len = self.steps.len();
        if len < 2 {
            return;
        }

        let type_roll: f64 = rng.gen();
        if type_roll < 0.8 || len <= 3 {
            self.regenerate_tail(rng, dest, graph);
        } else {
            self.replace_legs_with_walk(rng);
        }
    }

    /// Cut the route at a random step and regrow it toward the
    /// destination with a fresh guided segment.
    fn regenerate_tail<R: Rng>(&mut self, rng: &mut R, dest: StationCode, graph: &Graph) {
        let len = self.steps.len();
        let cut = rng.gen_range(1..len);
        let anchor = self.steps[cut - 1].station.code;

        if let Some(segment) = generate_path_segment(anchor, dest, graph, rng) {
            self.steps.truncate(cut);
            self.steps.extend(segment);
        }
    }

    /// Replace one or two consecutive legs by a single walk when their
    /// endpoints are close enough on foot.
    fn replace_legs_with_walk<R: Rng>(&mut self, rng: &mut R) {
        let len = self.steps.len();
        if len <= MAX_WALK_REPLACE_LEGS + 1 {
            return;
        }
        let max_start = len - 1 - MAX_WALK_REPLACE_LEGS;
        let idx1 = rng.gen_range(1..=max_start);
        let legs = rng.gen_range(1..=MAX_WALK_REPLACE_LEGS);
        let idx2 = idx1 + legs;

        let from = &self.steps[idx1];
        let to = &self.steps[idx2];
        let walk_km = from.station.coords.distance_km(&to.station.coords);
        if walk_km >= MAX_WALK_REPLACE_DISTANCE_KM {
            return;
        }

        let walk_time = walk_km / WALK_SPEED_KMH * 60.0;
        let walk = TransportationLine::walk(to.station.code, walk_time);
        let step = VisitedStep::new(to.station.clone(), walk, from.station.code);

        self.steps.drain(idx1 + 1..=idx2);
        self.steps.insert(idx1 + 1, step);
    }

    /// Single-point crossover at a station both parents pass through.
    ///
    /// Intermediate steps only: endpoints are excluded as anchors. When
    /// the parents share no intermediate station, one parent is returned
    /// unchanged at random.
    pub fn crossover<R: Rng>(parent1: &Route, parent2: &Route, rng: &mut R) -> Route {
        let s1 = parent1.steps();
        let s2 = parent2.steps();

        let mut anchors: Vec<(usize, usize)> = Vec::new();
        for i in 1..s1.len().saturating_sub(1) {
            for j in 1..s2.len().saturating_sub(1) {
                if s1[i].station == s2[j].station {
                    anchors.push((i, j));
                }
            }
        }

        if anchors.is_empty() {
            return if rng.gen_bool(0.5) {
                parent1.clone()
            } else {
                parent2.clone()
            };
        }

        let (i, j) = anchors[rng.gen_range(0..anchors.len())];
        let mut child = Route::new();
        child.steps.extend_from_slice(&s1[..=i]);
        child.steps.extend_from_slice(&s2[j + 1..]);
        child
    }
}

/// Fare for a journey covering `km` of aerial public-transport distance.
pub fn fare_for_distance(km: f64) -> f64 {
    if km <= 15.0 {
        6.0
    } else if km <= 40.0 {
        12.5
    } else if km <= 120.0 {
        17.0
    } else if km <= 225.0 {
        28.5
    } else {
        84.24
    }
}

/// Grow a path from `from` toward `to` with a guided random walk.
///
/// At each station: finish with a terminal walk when the destination is
/// within [`SHORT_HOP_WALK_THRESHOLD_KM`]; otherwise sample an unvisited
/// outgoing edge with probability proportional to the reciprocal of its
/// destination's distance to the target. Fails at a dead end or after
/// [`MAX_PATH_STEPS`] steps.
pub fn generate_path_segment<R: Rng>(
    from: StationCode,
    to: StationCode,
    graph: &Graph,
    rng: &mut R,
) -> Option<Vec<VisitedStep>> {
    let dest_station = graph.station_by_code(to).ok()?.clone();
    if !graph.has_station(from) {
        return None;
    }
    let dest_coords = dest_station.coords;

    let mut segment = Vec::new();
    let mut current = from;
    let mut visited: HashSet<StationCode> = HashSet::from([from]);
    let mut steps = 0;

    while current != to && steps < MAX_PATH_STEPS {
        let Ok(station) = graph.station_by_code(current) else {
            return None;
        };

        let to_end_km = station.coords.distance_km(&dest_coords);
        if to_end_km < SHORT_HOP_WALK_THRESHOLD_KM {
            let walk = TransportationLine::walk(to, to_end_km / WALK_SPEED_KMH * 60.0);
            segment.push(VisitedStep::new(dest_station.clone(), walk, current));
            current = to;
            break;
        }

        let mut candidates: Vec<&TransportationLine> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        for line in graph.lines_from(current) {
            if visited.contains(&line.to) {
                continue;
            }
            let Ok(next) = graph.station_by_code(line.to) else {
                continue;
            };
            candidates.push(line);
            weights.push(next.coords.distance_km(&dest_coords) + EPSILON);
        }
        if candidates.is_empty() {
            return None;
        }

        let chosen = candidates[weighted_inverse_index(&weights, rng)];
        let next_station = graph.station_by_code(chosen.to).ok()?.clone();
        segment.push(VisitedStep::new(next_station, chosen.clone(), current));
        current = chosen.to;
        visited.insert(current);
        steps += 1;
    }

    (current == to).then_some(segment)
}

/// Pick an index with probability proportional to `1 / weight`, so
/// smaller weights (closer to the destination) are preferred. Falls back
/// to a uniform pick when the weights degenerate.
fn weighted_inverse_index<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().map(|w| 1.0 / w.max(EPSILON)).sum();
    if total <= EPSILON {
        return rng.gen_range(0..weights.len());
    }

    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (idx, w) in weights.iter().enumerate() {
        cumulative += 1.0 / w.max(EPSILON);
        if target < cumulative {
            return idx;
        }
    }
    weights.len() - 1
}
