//! Great-circle distance and the trial-site proximity join.

use serde::Serialize;

use crate::npi::Physician;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyPhysician {
    #[serde(flatten)]
    pub physician: Physician,
    pub distance_km: f64,
}

/// Keep the physicians within `max_km` of a reference point, annotated with
/// their distance (rounded to two decimals). The boundary is inclusive.
/// Physicians without coordinates are excluded, not returned with a null
/// distance.
pub fn physicians_within_radius(
    lat: f64,
    lon: f64,
    physicians: &[Physician],
    max_km: f64,
) -> Vec<NearbyPhysician> {
    let mut nearby = Vec::new();
    for physician in physicians {
        let (Some(p_lat), Some(p_lon)) = (physician.lat, physician.lon) else {
            continue;
        };
        let distance = haversine_km(lat, lon, p_lat, p_lon);
        if distance <= max_km {
            nearby.push(NearbyPhysician {
                physician: physician.clone(),
                distance_km: (distance * 100.0).round() / 100.0,
            });
        }
    }
    nearby
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, physicians_within_radius};
    use crate::npi::Physician;

    fn physician(npi: &str, lat: Option<f64>, lon: Option<f64>) -> Physician {
        Physician {
            npi: npi.to_string(),
            name: "Test Physician".to_string(),
            address: "100 Main St".to_string(),
            city: Some("Dallas".to_string()),
            state: Some("TX".to_string()),
            postal_code: None,
            specialty: None,
            credential: None,
            lat,
            lon,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(haversine_km(32.78, -96.80, 32.78, -96.80), 0.0);
        assert_eq!(haversine_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = haversine_km(32.78, -96.80, 29.76, -95.37);
        let ba = haversine_km(29.76, -95.37, 32.78, -96.80);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn known_distance_is_plausible() {
        // Dallas to Houston is roughly 360 km as the crow flies.
        let km = haversine_km(32.7767, -96.7970, 29.7604, -95.3698);
        assert!(km > 340.0 && km < 380.0, "got {km}");
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let origin = (32.7767, -96.7970);
        let other = (32.9, -96.9);
        let exact = haversine_km(origin.0, origin.1, other.0, other.1);

        let docs = vec![physician("1", Some(other.0), Some(other.1))];
        let at_radius = physicians_within_radius(origin.0, origin.1, &docs, exact);
        assert_eq!(at_radius.len(), 1);

        let below_distance = physicians_within_radius(origin.0, origin.1, &docs, exact - 1e-6);
        assert!(below_distance.is_empty());
    }

    #[test]
    fn missing_coordinates_are_excluded() {
        let docs = vec![
            physician("1", Some(32.78), Some(-96.80)),
            physician("2", None, None),
        ];
        let nearby = physicians_within_radius(32.78, -96.80, &docs, 50.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].physician.npi, "1");
        assert_eq!(nearby[0].distance_km, 0.0);
    }
}
