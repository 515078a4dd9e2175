use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    #[serde(rename = "mi")]
    Miles,
    #[serde(rename = "km")]
    Kilometers,
}

impl Unit {
    pub fn earth_radius(self) -> f64 {
        match self {
            Unit::Miles => 3958.8,
            Unit::Kilometers => 6371.0,
        }
    }
}

/// Great-circle distance between two points.
pub fn haversine(a: Coordinates, b: Coordinates, unit: Unit) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    unit.earth_radius() * c
}

pub fn within_radius(origin: Coordinates, point: Coordinates, radius: f64, unit: Unit) -> bool {
    haversine(origin, point, unit) <= radius
}
