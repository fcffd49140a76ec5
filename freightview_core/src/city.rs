//! City reference data.
//!
//! The catalog is loaded once and never mutated afterwards. Shipments copy
//! the cities they need at creation time, so a catalog reload never moves an
//! existing shipment.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;
use crate::geodesy::Coordinate;

/// A named city with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Unique key within a catalog
    pub name: String,

    /// City centre
    #[serde(flatten)]
    pub location: Coordinate,

    pub country: String,

    pub continent: String,
}

impl City {
    pub fn new(
        name: impl Into<String>,
        lat: f64,
        lng: f64,
        country: impl Into<String>,
        continent: impl Into<String>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            name: name.into(),
            location: Coordinate::new(lat, lng)?,
            country: country.into(),
            continent: continent.into(),
        })
    }
}

/// Read-only lookup of cities by name.
#[derive(Debug, Clone, Default)]
pub struct CityCatalog {
    cities: BTreeMap<String, City>,
}

impl CityCatalog {
    /// Builds a catalog, rejecting duplicate names and invalid coordinates.
    pub fn from_cities(cities: impl IntoIterator<Item = City>) -> Result<Self, CoreError> {
        let mut map = BTreeMap::new();
        for city in cities {
            if !city.location.is_valid() {
                return Err(CoreError::InvalidCoordinate {
                    lat: city.location.lat,
                    lng: city.location.lng,
                });
            }
            if map.contains_key(&city.name) {
                return Err(CoreError::DuplicateCity(city.name));
            }
            map.insert(city.name.clone(), city);
        }
        Ok(Self { cities: map })
    }

    /// Parses a JSON array of cities.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let cities: Vec<City> =
            serde_json::from_str(json).map_err(|e| CoreError::Catalog(e.to_string()))?;
        Self::from_cities(cities)
    }

    /// The built-in catalog of major world cities.
    pub fn world() -> Self {
        let cities = WORLD_CITIES
            .iter()
            .map(|&(name, lat, lng, country, continent)| City {
                name: name.to_string(),
                location: Coordinate { lat, lng },
                country: country.to_string(),
                continent: continent.to_string(),
            })
            .map(|c| (c.name.clone(), c))
            .collect();
        Self { cities }
    }

    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cities.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Cities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// Distinct continents, sorted.
    pub fn continents(&self) -> BTreeSet<&str> {
        self.cities.values().map(|c| c.continent.as_str()).collect()
    }
}

/// (name, lat, lng, country, continent)
const WORLD_CITIES: &[(&str, f64, f64, &str, &str)] = &[
    ("New York", 40.7128, -74.0060, "USA", "North America"),
    ("Los Angeles", 34.0522, -118.2437, "USA", "North America"),
    ("Chicago", 41.8781, -87.6298, "USA", "North America"),
    ("Miami", 25.7617, -80.1918, "USA", "North America"),
    ("San Francisco", 37.7749, -122.4194, "USA", "North America"),
    ("Seattle", 47.6062, -122.3321, "USA", "North America"),
    ("Boston", 42.3601, -71.0589, "USA", "North America"),
    ("Las Vegas", 36.1699, -115.1398, "USA", "North America"),
    ("Denver", 39.7392, -104.9903, "USA", "North America"),
    ("Atlanta", 33.7490, -84.3880, "USA", "North America"),
    ("Toronto", 43.6532, -79.3832, "Canada", "North America"),
    ("Vancouver", 49.2827, -123.1207, "Canada", "North America"),
    ("Montreal", 45.5017, -73.5673, "Canada", "North America"),
    ("Mexico City", 19.4326, -99.1332, "Mexico", "North America"),
    ("London", 51.5074, -0.1278, "UK", "Europe"),
    ("Paris", 48.8566, 2.3522, "France", "Europe"),
    ("Berlin", 52.5200, 13.4050, "Germany", "Europe"),
    ("Rome", 41.9028, 12.4964, "Italy", "Europe"),
    ("Madrid", 40.4168, -3.7038, "Spain", "Europe"),
    ("Amsterdam", 52.3676, 4.9041, "Netherlands", "Europe"),
    ("Vienna", 48.2082, 16.3738, "Austria", "Europe"),
    ("Zurich", 47.3769, 8.5417, "Switzerland", "Europe"),
    ("Geneva", 46.2044, 6.1432, "Switzerland", "Europe"),
    ("Stockholm", 59.3293, 18.0686, "Sweden", "Europe"),
    ("Copenhagen", 55.6761, 12.5683, "Denmark", "Europe"),
    ("Oslo", 59.9139, 10.7522, "Norway", "Europe"),
    ("Helsinki", 60.1699, 24.9384, "Finland", "Europe"),
    ("Warsaw", 52.2297, 21.0122, "Poland", "Europe"),
    ("Prague", 50.0755, 14.4378, "Czech Republic", "Europe"),
    ("Budapest", 47.4979, 19.0402, "Hungary", "Europe"),
    ("Brussels", 50.8503, 4.3517, "Belgium", "Europe"),
    ("Dublin", 53.3498, -6.2603, "Ireland", "Europe"),
    ("Lisbon", 38.7223, -9.1393, "Portugal", "Europe"),
    ("Barcelona", 41.3851, 2.1734, "Spain", "Europe"),
    ("Milan", 45.4642, 9.1900, "Italy", "Europe"),
    ("Munich", 48.1351, 11.5820, "Germany", "Europe"),
    ("Frankfurt", 50.1109, 8.6821, "Germany", "Europe"),
    ("Istanbul", 41.0082, 28.9784, "Turkey", "Europe"),
    ("Moscow", 55.7558, 37.6176, "Russia", "Europe"),
    ("Tokyo", 35.6762, 139.6503, "Japan", "Asia"),
    ("Seoul", 37.5665, 126.9780, "South Korea", "Asia"),
    ("Beijing", 39.9042, 116.4074, "China", "Asia"),
    ("Shanghai", 31.2304, 121.4737, "China", "Asia"),
    ("Hong Kong", 22.3193, 114.1694, "Hong Kong", "Asia"),
    ("Singapore", 1.3521, 103.8198, "Singapore", "Asia"),
    ("Mumbai", 19.0760, 72.8777, "India", "Asia"),
    ("Delhi", 28.7041, 77.1025, "India", "Asia"),
    ("Bangalore", 12.9716, 77.5946, "India", "Asia"),
    ("Bangkok", 13.7563, 100.5018, "Thailand", "Asia"),
    ("Kuala Lumpur", 3.1390, 101.6869, "Malaysia", "Asia"),
    ("Jakarta", -6.2088, 106.8456, "Indonesia", "Asia"),
    ("Manila", 14.5995, 120.9842, "Philippines", "Asia"),
    ("Taipei", 25.0330, 121.5654, "Taiwan", "Asia"),
    ("Dubai", 25.2048, 55.2708, "UAE", "Middle East"),
    ("Abu Dhabi", 24.2539, 54.3773, "UAE", "Middle East"),
    ("Doha", 25.2854, 51.5310, "Qatar", "Middle East"),
    ("Riyadh", 24.7136, 46.6753, "Saudi Arabia", "Middle East"),
    ("Tel Aviv", 32.0853, 34.7818, "Israel", "Middle East"),
    ("Cairo", 30.0444, 31.2357, "Egypt", "Africa"),
    ("Sydney", -33.8688, 151.2093, "Australia", "Oceania"),
    ("Melbourne", -37.8136, 144.9631, "Australia", "Oceania"),
    ("Brisbane", -27.4698, 153.0251, "Australia", "Oceania"),
    ("Perth", -31.9505, 115.8605, "Australia", "Oceania"),
    ("Auckland", -36.8485, 174.7633, "New Zealand", "Oceania"),
    ("São Paulo", -23.5505, -46.6333, "Brazil", "South America"),
    ("Rio de Janeiro", -22.9068, -43.1729, "Brazil", "South America"),
    ("Buenos Aires", -34.6118, -58.3960, "Argentina", "South America"),
    ("Lima", -12.0464, -77.0428, "Peru", "South America"),
    ("Bogotá", 4.7110, -74.0721, "Colombia", "South America"),
    ("Santiago", -33.4489, -70.6693, "Chile", "South America"),
];
