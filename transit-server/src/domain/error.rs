//! Error kinds shared across the planner.
//!
//! One enum covers the whole pipeline; the server boundary is the only
//! layer that turns these into wire payloads.

use super::station::StationCode;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PlannerError {
    /// Request parameters failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A station code has no entry in the graph.
    #[error("station {0} not found")]
    NotFound(StationCode),

    /// The graph holds no path between two stations.
    #[error("no path exists between stations {from} and {to}")]
    NoPath { from: StationCode, to: StationCode },

    /// No stations lie within the search radius of a coordinate.
    #[error("no stations found near {which} coordinates")]
    NoNearbyStations { which: &'static str },

    /// A record could not be parsed.
    #[error("malformed record: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A bug or impossible state.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PlannerError::InvalidInput("popSize must exceed 1".into());
        assert_eq!(err.to_string(), "invalid input: popSize must exceed 1");

        let err = PlannerError::NotFound(StationCode::new(12));
        assert_eq!(err.to_string(), "station 12 not found");

        let err = PlannerError::NoPath {
            from: StationCode::new(1),
            to: StationCode::new(2),
        };
        assert_eq!(err.to_string(), "no path exists between stations 1 and 2");

        let err = PlannerError::NoNearbyStations { which: "start" };
        assert_eq!(err.to_string(), "no stations found near start coordinates");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "stops.txt missing");
        let err = PlannerError::from(io);
        assert!(matches!(err, PlannerError::Io(_)));
        assert!(err.to_string().contains("stops.txt missing"));
    }
}
