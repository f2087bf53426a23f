use serde::{Deserialize, Serialize};

/// A labeled stop supplied by the host. Degrees, unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }
}

/// Bare geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[cfg(test)]
mod tests {
    use super::GeoPoint;

    #[test]
    fn deserializes_host_stop_list() {
        let json = r#"[{"name":"Lisbon","lat":38.72,"lng":-9.14},{"name":"Kyoto","lat":35.01,"lng":135.77}]"#;
        let stops: Vec<GeoPoint> = serde_json::from_str(json).unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].name, "Kyoto");
        assert_eq!((stops[0].lat, stops[0].lng), (38.72, -9.14));
    }
}
