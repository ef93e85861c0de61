//! Package tracker
//!
//! The tracker ties the pieces together:
//!
//! ```text
//!  raw number ──► CarrierRegistry::resolve ──► Package
//!                                                │ track()
//!                                                ▼
//!            Carrier::validate ──► Carrier::build_request
//!                                                │
//!                                                ▼
//!                        Transport::send ──► Carrier::parse_response ──► TrackingInfo
//! ```
//!
//! Identification and validation never touch the network; only
//! [`Package::track`] does, and it makes exactly one request.

use std::fmt;
use std::sync::Arc;

use quick_xml::escape::escape;
use tracing::{debug, info, warn};

use crate::carriers::CarrierInterface;
use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::model::TrackingInfo;
use crate::number::TrackingNumber;
use crate::registry::CarrierRegistry;
use crate::traits::{Carrier, CarrierIdentity, Transport};

/// Entry point for identifying and tracking packages
pub struct PackageTracker {
    registry: CarrierRegistry,
    transport: Arc<dyn Transport>,
}

impl PackageTracker {
    /// Create a tracker with every known carrier
    ///
    /// # Returns
    ///
    /// - `Ok(PackageTracker)`: configuration is valid
    /// - `Err(Error::Config)`: a configured section is incomplete
    pub fn new(config: TrackerConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        debug!(
            "Creating tracker (testing={}, transport={})",
            config.testing,
            transport.transport_name()
        );
        Ok(Self::with_registry(CarrierRegistry::with_defaults(&config), transport))
    }

    /// Create a tracker over a prepared registry
    pub fn with_registry(registry: CarrierRegistry, transport: Arc<dyn Transport>) -> Self {
        Self { registry, transport }
    }

    /// The carrier registry
    pub fn registry(&self) -> &CarrierRegistry {
        &self.registry
    }

    /// Identify the carrier of `raw` and wrap it in a [`Package`]
    ///
    /// # Returns
    ///
    /// - `Ok(Package)`: a carrier recognizes the number
    /// - `Err(Error::UnsupportedShipper)`: no carrier does
    pub fn package(&self, raw: &str) -> Result<Package> {
        let identity = self
            .registry
            .resolve(raw)
            .ok_or_else(|| Error::unsupported(format!("no carrier recognizes '{}'", raw.trim())))?;
        self.package_with(raw, identity)
    }

    /// Wrap `raw` in a [`Package`] for a named carrier, skipping identification
    ///
    /// `service` is a carrier name such as `"ups"` or `"FedEx"`.
    pub fn package_for(&self, raw: &str, service: &str) -> Result<Package> {
        let identity: CarrierIdentity = service.parse()?;
        self.package_with(raw, identity)
    }

    /// Render `raw` as an HTML link to its carrier's tracking page
    ///
    /// A number no carrier recognizes comes back as escaped text, without a
    /// link.
    pub fn linkify(&self, raw: &str) -> String {
        match self.package(raw) {
            Ok(package) => format!(
                "<a href=\"{}\">{}</a>",
                escape(package.url().as_str()),
                escape(raw)
            ),
            Err(e) => {
                debug!("Not linking '{}': {}", raw, e);
                escape(raw).into_owned()
            }
        }
    }

    fn package_with(&self, raw: &str, identity: CarrierIdentity) -> Result<Package> {
        let carrier = self
            .registry
            .carrier(identity)
            .ok_or_else(|| Error::unsupported(format!("carrier {} is not registered", identity)))?;

        Ok(Package {
            number: TrackingNumber::new(raw),
            carrier: carrier.clone(),
            transport: Arc::clone(&self.transport),
        })
    }
}

/// A tracking number bound to its carrier
pub struct Package {
    number: TrackingNumber,
    carrier: CarrierInterface,
    transport: Arc<dyn Transport>,
}

impl Package {
    /// The carrier this package belongs to
    pub fn shipper(&self) -> CarrierIdentity {
        self.carrier.identity()
    }

    /// The normalized tracking number
    pub fn tracking_number(&self) -> &TrackingNumber {
        &self.number
    }

    /// Whether the number passes the carrier's format and check digit rules
    pub fn validate(&self) -> bool {
        self.carrier.validate(self.number.as_str())
    }

    /// The carrier's public tracking page
    pub fn url(&self) -> String {
        self.carrier.url(&self.number)
    }

    /// Query the carrier for the package's status
    ///
    /// # Returns
    ///
    /// - `Ok(TrackingInfo)`: current status and event history
    /// - `Err(Error::InvalidTrackingNumber)`: the number fails validation, or
    ///   the carrier does not know it
    /// - `Err(Error::TrackFailed)`: the carrier reported an error
    /// - `Err(Error::Config)`: no credentials for this carrier
    /// - other errors: transport failures
    pub async fn track(&self) -> Result<TrackingInfo> {
        let identity = self.shipper();

        if !self.validate() {
            warn!("{} number {} failed validation", identity, self.number);
            return Err(Error::invalid_number(self.number.as_str()));
        }

        let request = self.carrier.build_request(&self.number)?;
        info!(
            "Tracking {} {} via {} ({} {})",
            identity,
            self.number,
            self.transport.transport_name(),
            request.method,
            request.url
        );

        let response = self.transport.send(&request).await?;
        debug!("{} answered HTTP {} ({} bytes)", identity, response.status, response.body.len());

        match self.carrier.parse_response(&self.number, &response) {
            Ok(info) => {
                info!("{} {}: {}", identity, self.number, info.status);
                Ok(info)
            }
            Err(e) => {
                warn!("Tracking {} {} failed: {}", identity, self.number, e);
                Err(e)
            }
        }
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("shipper", &self.shipper())
            .field("tracking_number", &self.number)
            .field("transport", &self.transport.transport_name())
            .finish()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Package(shipper={}, tracking_number={})>", self.shipper(), self.number)
    }
}
