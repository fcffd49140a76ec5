//! Validation of shipment creation requests.
//!
//! A request is checked in full before any state is touched: missing fields
//! first (all reported together), then the city keys, then the route.
//! Optional fields are filled in afterwards from fixed pools.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::city::{City, CityCatalog};
use crate::error::CoreError;
use crate::shipment::{Manifest, Priority};

/// Customers assigned when a request leaves the field blank.
pub const CUSTOMER_NAMES: &[&str] = &[
    "John Smith",
    "Sarah Johnson",
    "Michael Brown",
    "Emily Davis",
    "David Wilson",
    "Jessica Miller",
    "Christopher Taylor",
    "Amanda Anderson",
    "Matthew Thomas",
    "Ashley Jackson",
    "Daniel White",
    "Jennifer Harris",
    "James Martin",
    "Lisa Thompson",
    "Robert Garcia",
    "Maria Rodriguez",
    "William Martinez",
    "Elizabeth Robinson",
    "Joseph Clark",
    "Susan Lewis",
    "Dr. Sarah Johnson",
    "Prof. Michael Chen",
    "Ms. Emily Parker",
    "Mr. David Kumar",
    "Dr. Jennifer Lee",
    "Prof. Robert Singh",
    "Ms. Amanda Wilson",
    "Mr. James Brown",
];

/// Range for auto-assigned weights, kg.
const DEFAULT_WEIGHT_RANGE_KG: std::ops::Range<f64> = 1.0..26.0;

/// A request to create a shipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipment {
    pub name: String,
    pub origin_city: String,
    pub destination_city: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl CreateShipment {
    pub fn new(
        name: impl Into<String>,
        origin_city: impl Into<String>,
        destination_city: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin_city: origin_city.into(),
            destination_city: destination_city.into(),
            ..Self::default()
        }
    }

    pub fn customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn weight_kg(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Resolves the origin and destination cities.
    pub fn validate<'c>(&self, catalog: &'c CityCatalog) -> Result<(&'c City, &'c City), CoreError> {
        let name = self.name.trim();
        let origin = self.origin_city.trim();
        let destination = self.destination_city.trim();

        let missing: Vec<&'static str> = [
            ("name", name),
            ("originCity", origin),
            ("destinationCity", destination),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(CoreError::MissingFields(missing));
        }

        let origin_city = catalog.get(origin).ok_or_else(|| CoreError::InvalidCity {
            role: "origin",
            name: origin.to_string(),
        })?;
        let destination_city = catalog.get(destination).ok_or_else(|| CoreError::InvalidCity {
            role: "destination",
            name: destination.to_string(),
        })?;
        if origin == destination {
            return Err(CoreError::SameOriginDestination(origin.to_string()));
        }

        if let Some(weight) = self.weight_kg {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(CoreError::InvalidWeight(weight));
            }
        }

        Ok((origin_city, destination_city))
    }

    /// Builds the manifest, filling blanks with random defaults.
    ///
    /// Call after [`validate`](Self::validate) succeeds.
    pub fn manifest<R: Rng + ?Sized>(&self, rng: &mut R) -> Manifest {
        let customer = self
            .customer
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| CUSTOMER_NAMES[rng.gen_range(0..CUSTOMER_NAMES.len())].to_string());

        let weight_kg = self
            .weight_kg
            .unwrap_or_else(|| (rng.gen_range(DEFAULT_WEIGHT_RANGE_KG) * 10.0).round() / 10.0);

        Manifest {
            name: self.name.trim().to_string(),
            customer,
            customer_phone: phone_number(rng),
            weight_kg,
            priority: self.priority.unwrap_or_default(),
        }
    }
}

/// A random North American style number, e.g. `+1-415-555-0199`.
fn phone_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "+1-{}-{}-{}",
        rng.gen_range(100..1000),
        rng.gen_range(100..1000),
        rng.gen_range(1000..10000)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_valid_request() {
        let catalog = CityCatalog::world();
        let req = CreateShipment::new("Electronics", "Tokyo", "New York");

        let (origin, destination) = req.validate(&catalog).unwrap();
        assert_eq!(origin.name, "Tokyo");
        assert_eq!(destination.name, "New York");
    }

    #[test]
    fn test_reports_every_missing_field() {
        let catalog = CityCatalog::world();
        let req = CreateShipment::new("  ", "", "Paris");

        assert_eq!(
            req.validate(&catalog),
            Err(CoreError::MissingFields(vec!["name", "originCity"]))
        );
    }

    #[test]
    fn test_unknown_cities() {
        let catalog = CityCatalog::world();

        let err = CreateShipment::new("X", "Atlantis", "Paris").validate(&catalog).unwrap_err();
        assert_eq!(err, CoreError::InvalidCity { role: "origin", name: "Atlantis".into() });

        let err = CreateShipment::new("X", "Paris", "El Dorado").validate(&catalog).unwrap_err();
        assert_eq!(err, CoreError::InvalidCity { role: "destination", name: "El Dorado".into() });
    }

    #[test]
    fn test_same_origin_and_destination() {
        let catalog = CityCatalog::world();
        let err = CreateShipment::new("X", "Paris", " Paris ").validate(&catalog).unwrap_err();
        assert_eq!(err, CoreError::SameOriginDestination("Paris".into()));
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_bad_weight() {
        let catalog = CityCatalog::world();
        let req = CreateShipment::new("X", "Paris", "Rome").weight_kg(-2.0);
        assert_eq!(req.validate(&catalog), Err(CoreError::InvalidWeight(-2.0)));
    }

    #[test]
    fn test_manifest_defaults() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let manifest = CreateShipment::new(" Books ", "Paris", "Rome").manifest(&mut rng);

        assert_eq!(manifest.name, "Books");
        assert!(CUSTOMER_NAMES.contains(&manifest.customer.as_str()));
        assert!((1.0..=26.0).contains(&manifest.weight_kg));
        assert_eq!(manifest.priority, Priority::Medium);

        let parts: Vec<&str> = manifest.customer_phone.split('-').collect();
        assert_eq!(parts.len(), 4, "{}", manifest.customer_phone);
        assert_eq!(parts[0], "+1");
        assert_eq!((parts[1].len(), parts[2].len(), parts[3].len()), (3, 3, 4));
        assert!(parts[1..].iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_manifest_keeps_provided_values() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let manifest = CreateShipment::new("Books", "Paris", "Rome")
            .customer("Ada Lovelace")
            .weight_kg(3.5)
            .priority(Priority::High)
            .manifest(&mut rng);

        assert_eq!(manifest.customer, "Ada Lovelace");
        assert_eq!(manifest.weight_kg, 3.5);
        assert_eq!(manifest.priority, Priority::High);
    }

    #[test]
    fn test_deserializes_camel_case_request() {
        let req: CreateShipment = serde_json::from_str(
            r#"{"name": "Parts", "originCity": "Munich", "destinationCity": "Shanghai", "priority": "Low"}"#,
        )
        .unwrap();
        assert_eq!(req.priority, Some(Priority::Low));
        assert!(req.customer.is_none());
    }
}
