//! Genetic-algorithm parameters.

use crate::domain::PlannerError;

/// Tunable parameters for one GA run.
#[derive(Debug, Clone, Copy)]
pub struct GaParams {
    /// Number of generations to evolve.
    pub generations: u32,

    /// Per-child probability of applying a mutation operator.
    pub mutation_rate: f64,

    /// Target number of routes in the population.
    pub population_size: usize,
}

impl GaParams {
    pub fn new(generations: u32, mutation_rate: f64, population_size: usize) -> Self {
        Self {
            generations,
            mutation_rate,
            population_size,
        }
    }

    /// Reject parameter combinations the algorithm cannot run with.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.population_size <= 1 {
            return Err(PlannerError::InvalidInput(
                "population size must be greater than 1".into(),
            ));
        }
        if self.generations == 0 {
            return Err(PlannerError::InvalidInput(
                "generation count must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(PlannerError::InvalidInput(
                "mutation rate must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            generations: 200,
            mutation_rate: 0.3,
            population_size: 100,
        }
    }
}
