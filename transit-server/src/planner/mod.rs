//! The genetic-algorithm route planner.
//!
//! [`route`] defines the genome (a sequence of visited steps) and its
//! operators, [`population`] the evolutionary loop, and [`orchestrator`]
//! the per-request pipeline that fans GA runs out over candidate start
//! stations and applies the walk-versus-transit decision.

pub mod config;
pub mod journey;
pub mod orchestrator;
pub mod population;
pub mod route;

pub use config::GaParams;
pub use journey::{
    DetailedStep, DirectWalkAdvisory, PlanOutcome, RouteDocument, RouteSummary, StationBrief,
    StationInfo, WalkReason,
};
pub use orchestrator::{PlanRequest, RoutePlanner};
pub use population::Population;
pub use route::{Route, VisitedStep};

#[cfg(test)]
mod planner_tests;
