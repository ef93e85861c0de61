//! Carrier interfaces
//!
//! One module per carrier. Each interface owns its format rules, its check
//! digit branch, its sandbox allow-list and its API schema:
//!
//! - [`UpsInterface`]: `1Z` numbers, JSON Track API
//! - [`FedexInterface`]: Express, Ground-96 and SSC-18 numbers, SOAP Track v5
//! - [`UspsInterface`]: IMpb, 10-digit and S10 numbers, Web Tools TrackV2 XML
//! - [`DhlInterface`]: Express and eCommerce numbers, Shipment Tracking JSON API
//!
//! [`CarrierInterface`] closes the set so the registry can hold carriers by
//! value.

pub mod dhl;
pub mod fedex;
pub mod ups;
pub mod usps;

pub use dhl::DhlInterface;
pub use fedex::FedexInterface;
pub use ups::UpsInterface;
pub use usps::UspsInterface;

use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::model::TrackingInfo;
use crate::number::TrackingNumber;
use crate::traits::{Carrier, CarrierIdentity, TrackRequest, TransportResponse};

/// A configured carrier interface
#[derive(Debug, Clone)]
pub enum CarrierInterface {
    Ups(UpsInterface),
    Fedex(FedexInterface),
    Usps(UspsInterface),
    Dhl(DhlInterface),
}

impl CarrierInterface {
    /// Build the interface for `identity` from its configuration section
    pub fn from_config(identity: CarrierIdentity, config: &TrackerConfig) -> Self {
        match identity {
            CarrierIdentity::Ups => UpsInterface::new(config.ups.clone(), config.testing).into(),
            CarrierIdentity::Fedex => {
                FedexInterface::new(config.fedex.clone(), config.testing).into()
            }
            CarrierIdentity::Usps => UspsInterface::new(config.usps.clone(), config.testing).into(),
            CarrierIdentity::Dhl => DhlInterface::new(config.dhl.clone(), config.testing).into(),
        }
    }

    fn as_carrier(&self) -> &dyn Carrier {
        match self {
            CarrierInterface::Ups(ups) => ups,
            CarrierInterface::Fedex(fedex) => fedex,
            CarrierInterface::Usps(usps) => usps,
            CarrierInterface::Dhl(dhl) => dhl,
        }
    }
}

impl From<UpsInterface> for CarrierInterface {
    fn from(ups: UpsInterface) -> Self {
        CarrierInterface::Ups(ups)
    }
}

impl From<FedexInterface> for CarrierInterface {
    fn from(fedex: FedexInterface) -> Self {
        CarrierInterface::Fedex(fedex)
    }
}

impl From<UspsInterface> for CarrierInterface {
    fn from(usps: UspsInterface) -> Self {
        CarrierInterface::Usps(usps)
    }
}

impl From<DhlInterface> for CarrierInterface {
    fn from(dhl: DhlInterface) -> Self {
        CarrierInterface::Dhl(dhl)
    }
}

impl Carrier for CarrierInterface {
    fn identity(&self) -> CarrierIdentity {
        self.as_carrier().identity()
    }

    fn identify(&self, raw: &str) -> bool {
        self.as_carrier().identify(raw)
    }

    fn validate(&self, raw: &str) -> bool {
        self.as_carrier().validate(raw)
    }

    fn url(&self, number: &TrackingNumber) -> String {
        self.as_carrier().url(number)
    }

    fn build_request(&self, number: &TrackingNumber) -> Result<TrackRequest> {
        self.as_carrier().build_request(number)
    }

    fn parse_response(
        &self,
        number: &TrackingNumber,
        response: &TransportResponse,
    ) -> Result<TrackingInfo> {
        self.as_carrier().parse_response(number, response)
    }
}

/// Join the non-empty parts of a location with `,`
pub(crate) fn join_location<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    let parts: Vec<&str> = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}

/// Parse an ISO 8601 timestamp, keeping the carrier's local time
///
/// Offsets are accepted and dropped; timestamps without an offset are taken
/// as they are.
pub(crate) fn parse_timestamp(carrier: CarrierIdentity, value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map_err(|e| {
        Error::provider(carrier.name(), format!("invalid timestamp '{}': {}", value, e))
    })
}

/// Name of the document's root element, without namespace prefix
pub(crate) fn xml_root(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(|e| Error::xml(e.to_string()))? {
            Event::Start(e) | Event::Empty(e) => {
                return utf8(e.local_name().as_ref()).map(str::to_owned);
            }
            Event::Eof => return Err(Error::xml("document has no root element")),
            _ => {}
        }
    }
}

/// Rewrite a document with every element and attribute name reduced to its
/// local name, dropping namespace declarations
///
/// Carrier documents disagree on prefixes (`soapenv:`, `SOAP-ENV:`, `v5:`,
/// none at all); the typed schemas only ever name local names.
pub(crate) fn strip_namespaces(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());

    loop {
        let event = match reader.read_event().map_err(|e| Error::xml(e.to_string()))? {
            Event::Start(e) => Event::Start(local_start(&e)?),
            Event::Empty(e) => Event::Empty(local_start(&e)?),
            Event::End(e) => {
                let name = utf8(e.local_name().as_ref())?.to_owned();
                Event::End(BytesEnd::new(name))
            }
            Event::Eof => break,
            other => other,
        };
        writer
            .write_event(event)
            .map_err(|e| Error::xml(e.to_string()))?;
    }

    String::from_utf8(writer.into_inner()).map_err(|e| Error::xml(e.to_string()))
}

fn local_start(start: &BytesStart<'_>) -> Result<BytesStart<'static>> {
    let mut local = BytesStart::new(utf8(start.local_name().as_ref())?.to_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| Error::xml(e.to_string()))?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = attribute.key.local_name();
        local.push_attribute((key.as_ref(), attribute.value.as_ref()));
    }
    Ok(local)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::xml(e.to_string()))
}
