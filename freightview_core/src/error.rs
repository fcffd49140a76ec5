//! Error types for the FreightView engine.

use freightview_env::ShipmentId;
use thiserror::Error;

use crate::shipment::Status;

/// Errors surfaced by the engine's operations.
///
/// Validation errors are raised before any state is touched; transition
/// errors leave the shipment exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid {role} city: {name}")]
    InvalidCity { role: &'static str, name: String },

    #[error("Origin and destination must be different (both '{0}')")]
    SameOriginDestination(String),

    #[error("Invalid weight: {0} kg")]
    InvalidWeight(f64),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid coordinate: ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Duplicate city in catalog: {0}")]
    DuplicateCity(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Shipment not found: {0}")]
    NotFound(ShipmentId),

    #[error("Cannot move {id} from {from} to {to}")]
    InvalidTransition { id: ShipmentId, from: Status, to: Status },

    #[error("Shipment {0} is already cancelled")]
    AlreadyCancelled(ShipmentId),

    #[error("Duplicate shipment id: {0}")]
    DuplicateShipment(ShipmentId),

    #[error("Corrupt shipment {id}: {reason}")]
    CorruptShipment { id: ShipmentId, reason: String },

    #[error("Tick interval must be positive and finite, got {0}s")]
    InvalidTickInterval(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// True for input errors the caller can fix and retry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFields(_)
                | Self::InvalidCity { .. }
                | Self::SameOriginDestination(_)
                | Self::InvalidWeight(_)
                | Self::InvalidPriority(_)
        )
    }

    /// True for rejected lifecycle transitions.
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. } | Self::AlreadyCancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_all() {
        let err = CoreError::MissingFields(vec!["name", "originCity"]);
        assert_eq!(err.to_string(), "Missing required fields: name, originCity");
        assert!(err.is_validation());
        assert!(!err.is_transition());
    }

    #[test]
    fn test_transition_classification() {
        let err = CoreError::InvalidTransition {
            id: ShipmentId(4),
            from: Status::Delivered,
            to: Status::Cancelled,
        };
        assert!(err.is_transition());
        assert_eq!(err.to_string(), "Cannot move PKG004 from Delivered to Cancelled");
        assert!(CoreError::AlreadyCancelled(ShipmentId(1)).is_transition());
        assert!(!CoreError::NotFound(ShipmentId(1)).is_transition());
    }
}
