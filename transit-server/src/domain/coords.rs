//! Geographic coordinates and great-circle distance.

/// Mean Earth radius in kilometers, used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed walking speed in km/h.
pub const WALK_SPEED_KMH: f64 = 5.0;

/// Assumed public-transport speed in km/h, used when a line carries no
/// usable per-edge travel time.
pub const PT_SPEED_KMH: f64 = 50.0;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle (haversine) distance to `other` in kilometers.
    ///
    /// Identical inputs short-circuit to exactly 0, and the intermediate
    /// `a` term is clamped to [0, 1] before `atan2` to guard against
    /// floating-point drift producing NaN.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        if (self.latitude - other.latitude).abs() < 1e-9
            && (self.longitude - other.longitude).abs() < 1e-9
        {
            return 0.0;
        }

        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let a = a.clamp(0.0, 1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Walking time between two coordinates in minutes at [`WALK_SPEED_KMH`].
///
/// Returns 0 when either coordinate is invalid or the distance does not
/// come out finite.
pub fn walk_time_minutes(from: Coordinates, to: Coordinates) -> f64 {
    if !from.is_valid() || !to.is_valid() {
        return 0.0;
    }
    let distance = from.distance_km(&to);
    if !distance.is_finite() {
        return 0.0;
    }
    distance / WALK_SPEED_KMH * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_bounds() {
        assert!(Coordinates::new(0.0, 0.0).is_valid());
        assert!(Coordinates::new(90.0, 180.0).is_valid());
        assert!(Coordinates::new(-90.0, -180.0).is_valid());

        assert!(!Coordinates::new(90.1, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, 180.1).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn identical_points_are_zero_distance() {
        let a = Coordinates::new(32.0853, 34.7818);
        assert_eq!(a.distance_km(&a), 0.0);
    }

    #[test]
    fn known_distance() {
        // One degree of longitude on the equator is about 111.19 km.
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 1.0);
        let d = a.distance_km(&b);
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 180.0);
        let d = a.distance_km(&b);
        assert!(d.is_finite());
        // Half the Earth's circumference.
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1.0);
    }

    #[test]
    fn walk_time_of_invalid_coords_is_zero() {
        let good = Coordinates::new(0.0, 0.0);
        let bad = Coordinates::new(f64::NAN, 0.0);
        assert_eq!(walk_time_minutes(good, bad), 0.0);
        assert_eq!(walk_time_minutes(bad, good), 0.0);
    }

    #[test]
    fn walk_time_matches_speed() {
        // 5 km at 5 km/h is an hour.
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 0.044966);
        let t = walk_time_minutes(a, b);
        assert!((t - 60.0).abs() < 0.5, "got {t}");
    }
}
