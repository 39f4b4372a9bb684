//! Domain types for the transit trip planner.
//!
//! This module contains the core model types that represent the transit
//! network: coordinates, stations, transportation lines and the error
//! kinds shared across the crate.

mod coords;
mod error;
mod line;
mod station;

pub use coords::{walk_time_minutes, Coordinates, EARTH_RADIUS_KM, PT_SPEED_KMH, WALK_SPEED_KMH};
pub use error::PlannerError;
pub use line::{TransportMode, TransportationLine};
pub use station::{Station, StationCode};
