//! Simulated disposal containers around a city center.
//!
//! Locations are random on every call. Distances use a flat-earth
//! approximation (one degree ≈ 111 km on both axes), which is only
//! meaningful close to the equator and within a few kilometers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::ContainerColor;

pub const KM_PER_DEGREE: f64 = 111.0;

/// Parque Berrío, Medellín
pub const CITY_CENTER: GeoPoint = GeoPoint { lat: 6.2442, lon: -75.5812 };

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Planar distance in meters, rounded to the nearest meter
    pub fn approx_distance_m(&self, other: &GeoPoint) -> u64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        let km = (dlat * dlat + dlon * dlon).sqrt() * KM_PER_DEGREE;
        (km * 1000.0).round() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockContainer {
    pub id: u32,
    pub name: String,
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    pub distance_m: u64,
    pub types: Vec<ContainerColor>,
}

#[derive(Debug, Clone)]
pub struct ContainerLocator {
    pub center: GeoPoint,
    /// Half-width of the sampling square, in degrees
    pub spread_deg: f64,
    pub count: u32,
}

impl Default for ContainerLocator {
    fn default() -> Self {
        Self {
            center: CITY_CENTER,
            spread_deg: 0.02,
            count: 5,
        }
    }
}

impl ContainerLocator {
    /// Generates `count` containers around the center, nearest to `origin` first.
    pub fn nearby<R: Rng + ?Sized>(&self, origin: GeoPoint, rng: &mut R) -> Vec<MockContainer> {
        let mut containers: Vec<MockContainer> = (1..=self.count)
            .map(|id| {
                let point = self.sample_point(rng);
                MockContainer {
                    id,
                    name: format!("Contenedor #{}", id),
                    location: random_address(rng),
                    lat: point.lat,
                    lng: point.lon,
                    distance_m: point.approx_distance_m(&origin),
                    types: ContainerColor::BINS.to_vec(),
                }
            })
            .collect();

        containers.sort_by_key(|c| c.distance_m);
        containers
    }

    fn sample_point<R: Rng + ?Sized>(&self, rng: &mut R) -> GeoPoint {
        let spread = self.spread_deg;
        if spread <= 0.0 {
            return self.center;
        }
        GeoPoint {
            lat: self.center.lat + rng.gen_range(-spread..=spread),
            lon: self.center.lon + rng.gen_range(-spread..=spread),
        }
    }
}

fn random_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "Calle {} #{}-{}",
        rng.gen_range(10..=100),
        rng.gen_range(10..=80),
        rng.gen_range(10..=99)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_distance_approximation() {
        let a = GeoPoint::new(0.0, 0.0);
        assert_eq!(a.approx_distance_m(&GeoPoint::new(0.01, 0.0)), 1110);
        assert_eq!(a.approx_distance_m(&GeoPoint::new(0.003, 0.004)), 555);
        assert_eq!(a.approx_distance_m(&a), 0);
    }

    #[test]
    fn test_zero_spread_uses_center() {
        let locator = ContainerLocator { spread_deg: 0.0, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(1);
        let containers = locator.nearby(CITY_CENTER, &mut rng);
        assert!(containers.iter().all(|c| c.distance_m == 0));
    }

    #[test]
    fn test_address_format() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let address = random_address(&mut rng);
            let rest = address.strip_prefix("Calle ").unwrap();
            let (street, number) = rest.split_once(" #").unwrap();
            let (a, b) = number.split_once('-').unwrap();
            assert!((10..=100).contains(&street.parse::<u32>().unwrap()));
            assert!((10..=80).contains(&a.parse::<u32>().unwrap()));
            assert!((10..=99).contains(&b.parse::<u32>().unwrap()));
        }
    }
}
