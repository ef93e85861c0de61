// # Carrier Trait
//
// Defines the uniform contract every carrier interface implements.
//
// ## Implementations
//
// - UPS, FedEx, USPS, DHL: `crate::carriers`
//
// ## Usage
//
// ```rust,ignore
// use shiptrack_core::Carrier;
//
// let ups = UpsInterface::new(None, false);
// assert!(ups.identify("1Z 648616 E19 2760718"));
// assert!(ups.validate("1Z648616E192760718"));
// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::TrackingInfo;
use crate::number::TrackingNumber;
use crate::traits::transport::{TrackRequest, TransportResponse};

/// The carriers shiptrack knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarrierIdentity {
    Ups,
    Fedex,
    Usps,
    Dhl,
}

impl CarrierIdentity {
    /// All carriers, in default registration order
    pub const ALL: [CarrierIdentity; 4] = [
        CarrierIdentity::Dhl,
        CarrierIdentity::Fedex,
        CarrierIdentity::Ups,
        CarrierIdentity::Usps,
    ];

    /// Display name ("UPS", "FedEx", ...)
    pub fn name(self) -> &'static str {
        match self {
            CarrierIdentity::Ups => "UPS",
            CarrierIdentity::Fedex => "FedEx",
            CarrierIdentity::Usps => "USPS",
            CarrierIdentity::Dhl => "DHL",
        }
    }
}

impl fmt::Display for CarrierIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CarrierIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ups" => Ok(CarrierIdentity::Ups),
            "fedex" => Ok(CarrierIdentity::Fedex),
            "usps" => Ok(CarrierIdentity::Usps),
            "dhl" => Ok(CarrierIdentity::Dhl),
            other => Err(Error::unsupported(format!("unknown service '{}'", other))),
        }
    }
}

/// Trait for carrier interfaces
///
/// `identify` and `validate` are pure: no I/O, no shared mutable state, and
/// they never fail. A number that does not fit the carrier is simply `false`.
///
/// Request building and response parsing are the only fallible operations;
/// the network round-trip in between belongs to a [`crate::Transport`].
///
/// # Thread Safety
///
/// Implementations are immutable after construction and shared across
/// tasks by reference.
pub trait Carrier: Send + Sync {
    /// Which carrier this is
    fn identity(&self) -> CarrierIdentity;

    /// Normalize `raw` and check it against the carrier's format rules only
    fn identify(&self, raw: &str) -> bool;

    /// Format rules first, then the check digit of the matching format
    ///
    /// In testing mode, carrier-documented sandbox numbers validate without
    /// a checksum.
    fn validate(&self, raw: &str) -> bool;

    /// Public tracking page for the number
    fn url(&self, number: &TrackingNumber) -> String;

    /// Request descriptor for the carrier's tracking API
    ///
    /// # Returns
    ///
    /// - `Ok(TrackRequest)`: ready to hand to a transport
    /// - `Err(Error::Config)`: the carrier has no credentials configured
    fn build_request(&self, number: &TrackingNumber) -> Result<TrackRequest>;

    /// Decode the carrier's response into a [`TrackingInfo`]
    ///
    /// # Returns
    ///
    /// - `Ok(TrackingInfo)`: the shipment status
    /// - `Err(Error::InvalidTrackingNumber)`: the carrier rejected the number
    /// - `Err(Error::TrackFailed)`: the carrier reported an error
    fn parse_response(
        &self,
        number: &TrackingNumber,
        response: &TransportResponse,
    ) -> Result<TrackingInfo>;
}
