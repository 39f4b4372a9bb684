//! A population of candidate routes and its evolutionary loop.
//!
//! Construction seeds the population from a hop-minimal BFS path and fills
//! it with heavily mutated clones; evolution alternates truncation
//! selection with elitist breeding.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::domain::{Coordinates, PlannerError, StationCode};
use crate::graph::Graph;

use super::route::{Route, VisitedStep};

/// Share of each generation copied into the next unchanged.
const ELITISM_FRACTION: f64 = 0.1;

/// Mutation steps applied to each clone of the seed route.
const SEED_MUTATIONS_MIN: u32 = 5;
const SEED_MUTATIONS_MAX: u32 = 20;

/// A bag of candidate routes plus the immutable GA context.
#[derive(Debug)]
pub struct Population {
    routes: Vec<Route>,
    start: StationCode,
    dest: StationCode,
    user_coords: Coordinates,
    dest_coords: Coordinates,
    graph: Arc<Graph>,
    rng: ChaCha8Rng,
}

impl Population {
    /// Build a population seeded from a fresh entropy source.
    pub fn new(
        size: usize,
        start: StationCode,
        dest: StationCode,
        user_coords: Coordinates,
        dest_coords: Coordinates,
        graph: Arc<Graph>,
    ) -> Result<Self, PlannerError> {
        Self::with_rng(
            size,
            start,
            dest,
            user_coords,
            dest_coords,
            graph,
            ChaCha8Rng::from_entropy(),
        )
    }

    /// Build a population with a caller-supplied RNG, for deterministic
    /// tests.
    #[allow(clippy::too_many_arguments)]
    pub fn with_rng(
        size: usize,
        start: StationCode,
        dest: StationCode,
        user_coords: Coordinates,
        dest_coords: Coordinates,
        graph: Arc<Graph>,
        mut rng: ChaCha8Rng,
    ) -> Result<Self, PlannerError> {
        if size == 0 {
            return Err(PlannerError::InvalidInput(
                "population size must be positive".into(),
            ));
        }
        if !graph.has_station(start) {
            return Err(PlannerError::NotFound(start));
        }
        if !graph.has_station(dest) {
            return Err(PlannerError::NotFound(dest));
        }

        let seed_steps = find_seed_path(&graph, start, dest)
            .ok_or(PlannerError::NoPath { from: start, to: dest })?;

        let mut base = Route::new();
        for step in seed_steps {
            base.add_step(step);
        }
        if !base.is_valid(start, dest, &graph) {
            return Err(PlannerError::Internal(
                "BFS seed path failed route validation".into(),
            ));
        }
        debug!(
            start = %start,
            dest = %dest,
            seed_len = base.len(),
            "seeded base route via BFS"
        );

        let mut routes = Vec::with_capacity(size);
        routes.push(base.clone());

        // Fill with mutated clones of the seed; invalid mutants are
        // discarded and the attempt cap keeps this bounded.
        let max_attempts = size * 10;
        let mut attempts = 0;
        while routes.len() < size && attempts < max_attempts {
            attempts += 1;
            let mut mutant = base.clone();
            let mutations = rng.gen_range(SEED_MUTATIONS_MIN..=SEED_MUTATIONS_MAX);
            for _ in 0..mutations {
                mutant.mutate(1.0, &mut rng, dest, &graph);
            }
            if mutant.is_valid(start, dest, &graph) {
                routes.push(mutant);
            }
        }

        if routes.len() < size {
            warn!(
                got = routes.len(),
                wanted = size,
                attempts,
                "initial population fill fell short of target size"
            );
        }

        Ok(Self {
            routes,
            start,
            dest,
            user_coords,
            dest_coords,
            graph,
            rng,
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn fitness_of(&self, route: &Route) -> f64 {
        route.fitness(
            self.start,
            self.dest,
            &self.graph,
            self.user_coords,
            self.dest_coords,
        )
    }

    /// Evolve the population for `generations` rounds.
    pub fn evolve(&mut self, generations: u32, mutation_rate: f64) {
        if self.routes.is_empty() {
            warn!("cannot evolve an empty population");
            return;
        }

        let target_size = self.routes.len();
        let elitism = ((target_size as f64 * ELITISM_FRACTION) as usize).max(1);

        for generation in 0..generations {
            self.select();
            if self.routes.is_empty() {
                warn!(generation, "population went extinct during selection");
                break;
            }

            let parents = self.routes.len();
            let mut next = Vec::with_capacity(target_size);
            for elite in self.routes.iter().take(elitism.min(parents)) {
                next.push(elite.clone());
            }

            while next.len() < target_size {
                let idx1 = self.rng.gen_range(0..parents);
                let mut idx2 = self.rng.gen_range(0..parents);
                if parents > 1 && idx1 == idx2 {
                    idx2 = (idx1 + 1) % parents;
                }

                let mut child =
                    Route::crossover(&self.routes[idx1], &self.routes[idx2], &mut self.rng);
                // Invalid children are allowed through: selection prices
                // them at fitness 0 next round.
                child.mutate(mutation_rate, &mut self.rng, self.dest, &self.graph);
                next.push(child);

                if next.len() > target_size * 2 {
                    warn!(generation, "breeding overshot the target size, trimming");
                    next.truncate(target_size);
                    break;
                }
            }

            self.routes = next;

            if generation == 0 || (generation + 1) % 50 == 0 || generation + 1 == generations {
                let best = self
                    .routes
                    .iter()
                    .map(|r| self.fitness_of(r))
                    .fold(0.0f64, f64::max);
                debug!(
                    generation = generation + 1,
                    population = self.routes.len(),
                    best_fitness = best,
                    "evolution progress"
                );
            }
        }
    }

    /// Truncation selection: keep the best half (at least one), NaN
    /// fitness sorting last.
    fn select(&mut self) {
        if self.routes.is_empty() {
            return;
        }

        let routes = std::mem::take(&mut self.routes);
        let mut scored: Vec<(f64, Route)> = routes
            .into_iter()
            .map(|r| (self.fitness_of(&r), r))
            .collect();

        scored.sort_by(|a, b| match (a.0.is_nan(), b.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal),
        });

        let keep = ((scored.len() + 1) / 2).max(1);
        scored.truncate(keep);
        self.routes = scored.into_iter().map(|(_, r)| r).collect();
    }

    /// The best route of the current generation.
    pub fn best(&self) -> Result<&Route, PlannerError> {
        self.routes
            .iter()
            .max_by(|a, b| {
                let fa = self.fitness_of(a);
                let fb = self.fitness_of(b);
                fa.partial_cmp(&fb).unwrap_or(Ordering::Equal)
            })
            .ok_or_else(|| PlannerError::Internal("population is empty".into()))
    }
}

/// How a BFS node was reached, for path reconstruction.
struct SeedLink {
    parent: Option<StationCode>,
    line_id: String,
    line_to: StationCode,
}

/// Breadth-first search for the hop-minimal path between two stations.
///
/// The graph is treated as unweighted: the result minimizes the number of
/// boarded edges, not time. Returns `None` when the stations are
/// disconnected.
fn find_seed_path(graph: &Graph, start: StationCode, dest: StationCode) -> Option<Vec<VisitedStep>> {
    if !graph.has_station(start) || !graph.has_station(dest) {
        return None;
    }

    let mut queue: VecDeque<StationCode> = VecDeque::from([start]);
    let mut visited: HashMap<StationCode, SeedLink> = HashMap::new();
    visited.insert(
        start,
        SeedLink {
            parent: None,
            line_id: String::new(),
            line_to: start,
        },
    );

    let mut found = false;
    while let Some(current) = queue.pop_front() {
        if current == dest {
            found = true;
            break;
        }
        for line in graph.lines_from(current) {
            if !graph.has_station(line.to) || visited.contains_key(&line.to) {
                continue;
            }
            visited.insert(
                line.to,
                SeedLink {
                    parent: Some(current),
                    line_id: line.id.clone(),
                    line_to: line.to,
                },
            );
            queue.push_back(line.to);
        }
    }

    if !found {
        return None;
    }

    // Walk the parent chain backwards, resolving each link against the
    // concrete line object in the graph.
    let cap = graph.station_count() + 5;
    let mut iterations = 0;
    let mut reversed: Vec<VisitedStep> = Vec::new();
    let mut trace = Some(dest);

    while let Some(code) = trace {
        iterations += 1;
        if iterations > cap {
            warn!(start = %start, dest = %dest, "seed path reconstruction exceeded cap");
            return None;
        }

        let link = visited.get(&code)?;
        let station = graph.station_by_code(code).ok()?.clone();

        match link.parent {
            Some(parent) => {
                let line = graph
                    .lines_from(parent)
                    .iter()
                    .find(|l| l.id == link.line_id && l.to == link.line_to)?
                    .clone();
                reversed.push(VisitedStep::new(station, line, parent));
                trace = Some(parent);
            }
            None => {
                reversed.push(VisitedStep::start(station));
                trace = None;
            }
        }
    }

    reversed.reverse();
    Some(reversed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TransportMode, TransportationLine};

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

    /// A -L1-> B -L1-> C -L2-> D plus an L3 shortcut B -> D.
    fn fixture_graph() -> Arc<Graph> {
        let mut g = Graph::new();
        g.add_station(code(1), "A", Coordinates::new(0.0, 0.0));
        g.add_station(code(2), "B", Coordinates::new(0.0, 0.020));
        g.add_station(code(3), "C", Coordinates::new(0.0, 0.040));
        g.add_station(code(4), "D", Coordinates::new(0.0, 0.060));
        add_line(&mut g, 1, "L1", 2, 5.0);
        add_line(&mut g, 2, "L1", 3, 5.0);
        add_line(&mut g, 3, "L2", 4, 5.0);
        add_line(&mut g, 2, "L3", 4, 9.0);
        Arc::new(g)
    }

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn population(size: usize, seed: u64) -> Population {
        let graph = fixture_graph();
        Population::with_rng(
            size,
            code(1),
            code(4),
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.0, 0.060),
            graph,
            rng(seed),
        )
        .expect("path exists")
    }

    #[test]
    fn construction_rejects_zero_size() {
        let graph = fixture_graph();
        let err = Population::with_rng(
            0,
            code(1),
            code(4),
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.0, 0.060),
            graph,
            rng(0),
        )
        .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput(_)));
    }

    #[test]
    fn construction_rejects_unknown_endpoints() {
        let graph = fixture_graph();
        let err = Population::with_rng(
            5,
            code(99),
            code(4),
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.0, 0.060),
            graph,
            rng(0),
        )
        .unwrap_err();
        assert!(matches!(err, PlannerError::NotFound(_)));
    }

    #[test]
    fn construction_fails_without_a_path() {
        let mut g = Graph::new();
        g.add_station(code(1), "A", Coordinates::new(0.0, 0.0));
        g.add_station(code(2), "B", Coordinates::new(0.5, 0.5));
        let err = Population::with_rng(
            5,
            code(1),
            code(2),
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.5, 0.5),
            Arc::new(g),
            rng(0),
        )
        .unwrap_err();
        assert!(matches!(err, PlannerError::NoPath { .. }));
    }

    #[test]
    fn every_initial_route_is_valid() {
        let pop = population(20, 42);
        assert!(!pop.routes().is_empty());
        for route in pop.routes() {
            assert!(route.is_valid(code(1), code(4), &fixture_graph()));
        }
    }

    #[test]
    fn bfs_seed_is_hop_minimal() {
        let graph = fixture_graph();
        let path = find_seed_path(&graph, code(1), code(4)).unwrap();
        // A -> B -> D via the L3 shortcut: 3 steps, not 4.
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].station.code, code(1));
        assert!(path[0].line.is_start());
        assert!(path[0].prev.is_none());
        assert_eq!(path[2].station.code, code(4));
    }

    #[test]
    fn bfs_start_equals_dest_yields_single_step() {
        let graph = fixture_graph();
        let path = find_seed_path(&graph, code(2), code(2)).unwrap();
        assert_eq!(path.len(), 1);
        assert!(path[0].line.is_start());
    }

    #[test]
    fn start_equals_dest_population() {
        let graph = fixture_graph();
        let pop = Population::with_rng(
            1,
            code(2),
            code(2),
            Coordinates::new(0.0, 0.020),
            Coordinates::new(0.0, 0.020),
            graph.clone(),
            rng(3),
        )
        .expect("trivial route");
        let best = pop.best().unwrap();
        assert_eq!(best.len(), 1);
        assert!(best.is_valid(code(2), code(2), &graph));
    }

    #[test]
    fn evolution_keeps_population_at_target_size() {
        let mut pop = population(12, 7);
        let target = pop.routes().len();
        pop.evolve(10, 0.3);
        assert_eq!(pop.routes().len(), target);
    }

    #[test]
    fn tiny_population_still_reproduces() {
        let mut pop = population(2, 13);
        let target = pop.routes().len();
        pop.evolve(5, 0.5);
        assert_eq!(pop.routes().len(), target);
    }

    #[test]
    fn best_route_is_valid_after_evolution() {
        let graph = fixture_graph();
        let mut pop = population(16, 21);
        pop.evolve(30, 0.3);
        let best = pop.best().unwrap();
        assert!(best.is_valid(code(1), code(4), &graph));
        assert!(pop.fitness_of(best) > 0.0);
    }

    #[test]
    fn selection_is_idempotent() {
        let mut pop = population(16, 5);
        pop.select();
        let after_once: Vec<usize> = pop.routes().iter().map(|r| r.len()).collect();
        let fitness_once: Vec<f64> = pop.routes().iter().map(|r| pop.fitness_of(r)).collect();

        // Selecting a kept half sorts identically and keeps ceil(n/2).
        pop.select();
        let fitness_twice: Vec<f64> = pop.routes().iter().map(|r| pop.fitness_of(r)).collect();
        assert_eq!(
            fitness_twice,
            fitness_once[..fitness_twice.len()].to_vec()
        );
        assert_eq!(pop.routes().len(), (after_once.len() + 1) / 2);
    }

    #[test]
    fn selection_keeps_at_least_one() {
        let mut pop = population(1, 9);
        pop.select();
        assert_eq!(pop.routes().len(), 1);
    }
}
