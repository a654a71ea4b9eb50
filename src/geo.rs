//! Great-circle distance between the fixed observer location and an
//! aircraft position.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// The fixed reference point from which all aircraft distances are measured.
/// Set once at startup from configuration.
#[derive(Debug, Clone, Copy)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
}

impl Observer {
    pub fn distance_to_km(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_km(latitude, longitude, self.latitude, self.longitude)
    }
}

/// Haversine distance in kilometres between two lat/lon points in decimal
/// degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1.0 for near-antipodal points, which
    // would take sqrt(a).asin() out of its domain.
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let d = haversine_km(46.0569, 14.5058, 46.0569, 14.5058);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = haversine_km(46.0569, 14.5058, 48.2082, 16.3738);
        let b = haversine_km(48.2082, 16.3738, 46.0569, 14.5058);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn known_distance_ljubljana_to_vienna() {
        // Ljubljana to Vienna is roughly 277 km
        let d = haversine_km(46.0569, 14.5058, 48.2082, 16.3738);
        assert!(d > 270.0 && d < 285.0);
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        // Half the Earth's circumference
        assert!((d - std::f64::consts::PI * 6371.0).abs() < 1.0);
    }

    #[test]
    fn observer_distance_matches_free_function() {
        let observer = Observer {
            latitude: 46.0569,
            longitude: 14.5058,
        };
        let a = observer.distance_to_km(45.0, 14.0);
        let b = haversine_km(45.0, 14.0, 46.0569, 14.5058);
        assert!((a - b).abs() < 1e-12);
    }
}
