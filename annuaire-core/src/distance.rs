//! Great-circle distance on a spherical Earth.

use geo::Coord;

/// Mean Earth radius in metres used by the Haversine approximation.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in metres between two WGS84 coordinates.
///
/// Uses the spherical-Earth Haversine approximation. The function is
/// deterministic and symmetric; non-finite inputs propagate as NaN.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use annuaire_core::haversine_distance;
///
/// let haguenau = Coord { x: 7.79, y: 48.82 };
/// let strasbourg = Coord { x: 7.75, y: 48.58 };
/// let metres = haversine_distance(haguenau, strasbourg);
/// assert!((26_000.0..28_000.0).contains(&metres));
/// ```
#[must_use]
pub fn haversine_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let phi_a = a.y.to_radians();
    let phi_b = b.y.to_radians();
    let delta_phi = (b.y - a.y).to_radians();
    let delta_lambda = (b.x - a.x).to_radians();

    let half_chord = (delta_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2);
    let angular_distance = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    EARTH_RADIUS_METERS * angular_distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TOLERANCE: f64 = 1.0e-6;

    #[rstest]
    #[case(Coord { x: 7.79, y: 48.82 })]
    #[case(Coord { x: 0.0, y: 0.0 })]
    #[case(Coord { x: -180.0, y: -90.0 })]
    fn distance_to_self_is_zero(#[case] point: Coord<f64>) {
        assert!(haversine_distance(point, point).abs() < TOLERANCE);
    }

    #[rstest]
    #[case(Coord { x: 7.79, y: 48.82 }, Coord { x: 7.75, y: 48.58 })]
    #[case(Coord { x: 2.35, y: 48.86 }, Coord { x: -0.13, y: 51.51 })]
    fn distance_is_symmetric(#[case] a: Coord<f64>, #[case] b: Coord<f64>) {
        let forward = haversine_distance(a, b);
        let backward = haversine_distance(b, a);
        assert!((forward - backward).abs() < TOLERANCE);
    }

    #[rstest]
    fn paris_to_london_is_about_344_km() {
        let paris = Coord { x: 2.3522, y: 48.8566 };
        let london = Coord { x: -0.1278, y: 51.5074 };
        let metres = haversine_distance(paris, london);
        assert!(
            (343_000.0..345_000.0).contains(&metres),
            "got {metres} metres"
        );
    }

    #[rstest]
    fn nan_inputs_propagate() {
        let origin = Coord { x: 0.0, y: 0.0 };
        let invalid = Coord { x: f64::NAN, y: 0.0 };
        assert!(haversine_distance(origin, invalid).is_nan());
    }
}
