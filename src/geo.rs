//! Great-circle distance between coordinates.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres, rounded to two decimal places.
///
/// Returns `None` when any coordinate is missing. Callers treat that as
/// "cannot price by distance", not as an error.
pub fn haversine_km(
    lat1: Option<f64>,
    lon1: Option<f64>,
    lat2: Option<f64>,
    lon2: Option<f64>,
) -> Option<f64> {
    let (lat1, lon1, lat2, lon2) = (lat1?, lon1?, lat2?, lon2?);

    let (rlat1, rlat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = rlat2 - rlat1;
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + rlat1.cos() * rlat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Some(round_2dp(EARTH_RADIUS_KM * c))
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const KATHMANDU: (f64, f64) = (27.7172, 85.3240);
    const POKHARA: (f64, f64) = (28.2096, 83.9856);

    #[test]
    fn any_missing_coordinate_is_undefined() {
        let full = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        for missing in 0..4 {
            let mut c = full;
            c[missing] = None;
            assert_eq!(haversine_km(c[0], c[1], c[2], c[3]), None);
        }
        assert_eq!(haversine_km(None, None, None, None), None);
    }

    #[test]
    fn kathmandu_to_pokhara() {
        let km = haversine_km(
            Some(KATHMANDU.0),
            Some(KATHMANDU.1),
            Some(POKHARA.0),
            Some(POKHARA.1),
        )
        .unwrap();
        assert!((km - 142.39).abs() < 0.01, "got {km}");
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let km = haversine_km(Some(0.0), Some(0.0), Some(0.0), Some(1.0)).unwrap();
        assert!((km - 111.19).abs() < 0.01, "got {km}");
    }

    #[test]
    fn same_point_is_zero() {
        let km = haversine_km(Some(KATHMANDU.0), Some(KATHMANDU.1), Some(KATHMANDU.0), Some(KATHMANDU.1));
        assert_eq!(km, Some(0.0));
    }

    #[test]
    fn symmetric() {
        let there = haversine_km(Some(KATHMANDU.0), Some(KATHMANDU.1), Some(POKHARA.0), Some(POKHARA.1));
        let back = haversine_km(Some(POKHARA.0), Some(POKHARA.1), Some(KATHMANDU.0), Some(KATHMANDU.1));
        assert_eq!(there, back);
    }
}
