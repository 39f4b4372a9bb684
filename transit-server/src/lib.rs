//! Public transit trip planner server.
//!
//! Answers: "I'm standing at these coordinates and want to reach those
//! coordinates - how should I travel?" The planner is backed by an
//! in-memory transit graph built from a GTFS feed and searches it with a
//! multi-start parallel genetic algorithm.

pub mod config;
pub mod domain;
pub mod graph;
pub mod planner;
pub mod server;
