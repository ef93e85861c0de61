//! Core traits for shiptrack
//!
//! - [`Carrier`]: identify, validate and talk to one carrier
//! - [`Transport`]: deliver a carrier request descriptor over the network

pub mod carrier;
pub mod transport;

pub use carrier::{Carrier, CarrierIdentity};
pub use transport::{HttpMethod, RequestBody, TrackRequest, Transport, TransportResponse};
