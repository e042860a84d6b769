use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct City {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl City {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    /// Lowercase name used in raw artifact filenames.
    pub fn file_stem(&self) -> String {
        self.name.to_lowercase()
    }

    /// The five cities collected by the default configuration.
    pub fn default_cities() -> Vec<City> {
        vec![
            City::new("Delhi", 28.7041, 77.1025),
            City::new("Mumbai", 19.0760, 72.8777),
            City::new("Bengaluru", 12.9716, 77.5946),
            City::new("Hyderabad", 17.3850, 78.4867),
            City::new("Kolkata", 22.5726, 88.3639),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_validation() {
        let city = City::new("Delhi", 28.7041, 77.1025);

        assert!(city.validate().is_ok());
        assert_eq!(city.file_stem(), "delhi");
    }

    #[test]
    fn test_invalid_coordinates() {
        let city = City::new("Broken", 28.7041, 181.0);

        assert!(city.validate().is_err());
    }

    #[test]
    fn test_default_cities() {
        let cities = City::default_cities();

        assert_eq!(cities.len(), 5);
        for city in &cities {
            assert!(city.validate().is_ok());
        }
    }
}
