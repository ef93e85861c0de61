// # shiptrack-core
//
// Core library for identifying, validating and tracking parcel numbers.
//
// ## Architecture Overview
//
// - **normalize / TrackingNumber**: canonical form of a raw number
// - **FormatRule**: length, prefix and character-class shape of a number
// - **ChecksumSpec**: weighted-digit check digits, described as data
// - **Carrier**: per-carrier identify / validate / request / parse contract
// - **CarrierRegistry**: ordered carriers, first match wins
// - **PackageTracker**: resolves a number and tracks it over a `Transport`
//
// ## Design Principles
//
// 1. **Pure core**: identification and validation answer `bool`, never fail
//    and never touch the network
// 2. **Carriers as data**: format rules and checksum parameters are tables,
//    not per-carrier branches
// 3. **Transport at the edge**: the only I/O is one request per `track()`,
//    behind the `Transport` trait

pub mod carriers;
pub mod checksum;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod number;
pub mod registry;
pub mod tracker;
pub mod traits;

// Re-export core types for convenience
pub use carriers::{CarrierInterface, DhlInterface, FedexInterface, UpsInterface, UspsInterface};
pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use model::{TrackingEvent, TrackingInfo};
pub use number::{TrackingNumber, normalize};
pub use registry::CarrierRegistry;
pub use tracker::{Package, PackageTracker};
pub use traits::{
    Carrier, CarrierIdentity, HttpMethod, RequestBody, TrackRequest, Transport, TransportResponse,
};
