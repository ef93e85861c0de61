//! Carrier registry
//!
//! The registry holds the configured carrier interfaces in resolution order
//! and answers "whose number is this?" without any if-else chain over
//! carriers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shiptrack_core::{CarrierRegistry, CarrierIdentity, TrackerConfig};
//!
//! let registry = CarrierRegistry::with_defaults(&TrackerConfig::default());
//!
//! assert_eq!(registry.resolve("1Z648616E192760718"), Some(CarrierIdentity::Ups));
//! assert_eq!(registry.resolve("14324423523"), None);
//! ```
//!
//! ## Resolution Order
//!
//! Carriers are scanned in registration order and the first one whose
//! format rules accept the number wins. The default order is DHL, FedEx,
//! UPS, USPS.

use crate::carriers::CarrierInterface;
use crate::config::TrackerConfig;
use crate::number::normalize;
use crate::traits::{Carrier, CarrierIdentity};

/// Ordered set of carrier interfaces
///
/// ## Thread Safety
///
/// The registry is immutable once built and holds carriers by value, so a
/// shared reference can be used from any number of tasks.
#[derive(Debug, Clone, Default)]
pub struct CarrierRegistry {
    carriers: Vec<CarrierInterface>,
}

impl CarrierRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every known carrier, in default order
    pub fn with_defaults(config: &TrackerConfig) -> Self {
        let mut registry = Self::new();
        for identity in CarrierIdentity::ALL {
            registry.register(CarrierInterface::from_config(identity, config));
        }
        registry
    }

    /// Register a carrier interface
    ///
    /// A carrier whose identity is already registered is replaced in place,
    /// keeping its position in the resolution order.
    pub fn register(&mut self, carrier: impl Into<CarrierInterface>) {
        let carrier = carrier.into();
        let identity = carrier.identity();

        match self.carriers.iter_mut().find(|c| c.identity() == identity) {
            Some(existing) => {
                tracing::debug!("Replacing carrier {}", identity);
                *existing = carrier;
            }
            None => {
                tracing::debug!("Registering carrier {}", identity);
                self.carriers.push(carrier);
            }
        }
    }

    /// Identify the carrier of a raw tracking number
    ///
    /// # Returns
    ///
    /// - `Some(identity)`: the first registered carrier that recognizes the number
    /// - `None`: no carrier recognizes it (including empty input)
    pub fn resolve(&self, raw: &str) -> Option<CarrierIdentity> {
        let number = normalize(raw);
        let identity = self
            .carriers
            .iter()
            .find(|carrier| carrier.identify(&number))
            .map(|carrier| carrier.identity());

        tracing::debug!("Resolved {:?} to {:?}", number, identity);
        identity
    }

    /// The registered interface for `identity`
    pub fn carrier(&self, identity: CarrierIdentity) -> Option<&CarrierInterface> {
        self.carriers.iter().find(|c| c.identity() == identity)
    }

    /// Check if a carrier is registered
    pub fn has_carrier(&self, identity: CarrierIdentity) -> bool {
        self.carrier(identity).is_some()
    }

    /// Registered identities, in resolution order
    pub fn identities(&self) -> Vec<CarrierIdentity> {
        self.carriers.iter().map(|carrier| carrier.identity()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carriers::{DhlInterface, UpsInterface};

    #[test]
    fn test_default_order() {
        let registry = CarrierRegistry::with_defaults(&TrackerConfig::default());
        assert_eq!(
            registry.identities(),
            vec![
                CarrierIdentity::Dhl,
                CarrierIdentity::Fedex,
                CarrierIdentity::Ups,
                CarrierIdentity::Usps
            ]
        );
    }

    #[test]
    fn test_resolve() {
        let registry = CarrierRegistry::with_defaults(&TrackerConfig::default());
        assert_eq!(registry.resolve("1Z12345E0205271688"), Some(CarrierIdentity::Ups));
        assert_eq!(registry.resolve("449044304137821"), Some(CarrierIdentity::Fedex));
        assert_eq!(registry.resolve("9205596900128506211821"), Some(CarrierIdentity::Usps));
        assert_eq!(registry.resolve("JJD0123456"), Some(CarrierIdentity::Dhl));
        assert_eq!(registry.resolve("14324423523"), None);
        assert_eq!(registry.resolve(""), None);
        assert_eq!(registry.resolve("   "), None);
    }

    #[test]
    fn test_resolution_is_first_match() {
        // 22 digits starting with 96 fit both FedEx Ground-96 and USPS IMpb
        let registry = CarrierRegistry::with_defaults(&TrackerConfig::default());
        assert_eq!(registry.resolve("9611020019343586678996"), Some(CarrierIdentity::Fedex));

        let mut registry = CarrierRegistry::new();
        registry.register(CarrierInterface::from_config(CarrierIdentity::Usps, &TrackerConfig::default()));
        registry.register(CarrierInterface::from_config(CarrierIdentity::Fedex, &TrackerConfig::default()));
        assert_eq!(registry.resolve("9611020019343586678996"), Some(CarrierIdentity::Usps));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = CarrierRegistry::with_defaults(&TrackerConfig::default());
        assert!(!registry.carrier(CarrierIdentity::Ups).unwrap().validate("1Z12345E0205271688"));

        registry.register(UpsInterface::new(None, true));
        assert_eq!(registry.identities().len(), 4);
        assert_eq!(registry.identities()[2], CarrierIdentity::Ups);
        assert!(registry.carrier(CarrierIdentity::Ups).unwrap().validate("1Z12345E0205271688"));
    }

    #[test]
    fn test_partial_registry() {
        let mut registry = CarrierRegistry::new();
        registry.register(DhlInterface::new(None, false));

        assert!(registry.has_carrier(CarrierIdentity::Dhl));
        assert!(!registry.has_carrier(CarrierIdentity::Ups));
        assert_eq!(registry.resolve("1Z648616E192760718"), None);
        assert!(registry.carrier(CarrierIdentity::Ups).is_none());
    }
}
