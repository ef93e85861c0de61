//! USPS
//!
//! USPS domestic and international numbers and the Web Tools TrackV2 API.
//!
//! ## Number Formats
//!
//! - IMpb / USPS Tracking: 22 digits, mod 10 check digit
//! - IMpb long form: 26 digits starting with `9`
//! - Legacy: 10 digits
//! - S10 (UPU international): `EA123456789US`
//!
//! Only the 22-digit form carries a check digit shiptrack verifies; the other
//! shapes validate on their format alone.
//!
//! ## API Reference
//!
//! - TrackV2: GET `ShippingAPI.dll?API=TrackV2&XML=<TrackFieldRequest .../>`

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quick_xml::escape::escape;
use serde::Deserialize;

use crate::carriers::{join_location, strip_namespaces, xml_root};
use crate::checksum::{self, split_check};
use crate::config::{UspsConfig, UspsServer};
use crate::error::{Error, Result};
use crate::format::{ALL_DIGITS, CharClass, FormatRule, Segment, classify};
use crate::model::TrackingInfo;
use crate::number::{TrackingNumber, normalize};
use crate::traits::{Carrier, CarrierIdentity, TrackRequest, TransportResponse};

const CLICK_URL: &str =
    "http://trkcnfrm1.smi.usps.com/PTSInternetWeb/InterLabelInquiry.do?origTrackNum=";

/// Published USPS sandbox numbers
const TEST_NUMBERS: &[&str] = &["9400100000000000000000", "9205500000000000000000"];

/// Service names by the first two letters of an S10 number
const SERVICE_TYPES: &[(&str, &str)] = &[
    ("EA", "express mail"),
    ("EC", "express mail international"),
    ("CP", "priority mail international"),
    ("RA", "registered mail"),
    ("RF", "registered foreign"),
];

const DEFAULT_SERVICE: &str = "USPS";

/// USPS number shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UspsFormat {
    Impb,
    Legacy,
    S10,
    ImpbLong,
}

const S10_SEGMENTS: &[Segment] = &[
    Segment::span(0, 2, CharClass::Alpha),
    Segment::span(2, 9, CharClass::Digit),
    Segment::span(11, 13, CharClass::Alpha),
];

const FORMATS: &[(UspsFormat, FormatRule)] = &[
    (UspsFormat::Impb, FormatRule::exact(22, "", ALL_DIGITS)),
    (UspsFormat::Legacy, FormatRule::exact(10, "", ALL_DIGITS)),
    (UspsFormat::S10, FormatRule::exact(13, "", S10_SEGMENTS)),
    (UspsFormat::ImpbLong, FormatRule::exact(26, "9", ALL_DIGITS)),
];

impl UspsServer {
    fn base_url(self) -> &'static str {
        match self {
            UspsServer::Test => "http://testing.shippingapis.com/ShippingAPITest.dll",
            UspsServer::SecureTest => "https://secure.shippingapis.com/ShippingAPITest.dll",
            UspsServer::Production => "http://production.shippingapis.com/ShippingAPI.dll",
            UspsServer::Secure => "https://secure.shippingapis.com/ShippingAPI.dll",
        }
    }
}

/// USPS carrier interface
#[derive(Debug, Clone)]
pub struct UspsInterface {
    config: Option<UspsConfig>,
    testing: bool,
}

impl UspsInterface {
    pub fn new(config: Option<UspsConfig>, testing: bool) -> Self {
        Self { config, testing }
    }

    /// Shape of the number, if it is a USPS number
    pub fn format(&self, raw: &str) -> Option<UspsFormat> {
        classify(FORMATS, &normalize(raw))
    }

    fn server(&self, config: &UspsConfig) -> UspsServer {
        config.server.unwrap_or(if self.testing {
            UspsServer::Test
        } else {
            UspsServer::Production
        })
    }

    fn credentials(&self) -> Result<&UspsConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::config("no [usps] credentials configured"))
    }
}

impl Carrier for UspsInterface {
    fn identity(&self) -> CarrierIdentity {
        CarrierIdentity::Usps
    }

    fn identify(&self, raw: &str) -> bool {
        self.format(raw).is_some()
    }

    fn validate(&self, raw: &str) -> bool {
        let number = normalize(raw);
        let Some(format) = classify(FORMATS, &number) else {
            tracing::debug!("Number {} is not a USPS number", number);
            return false;
        };

        if format != UspsFormat::Impb {
            return true;
        }

        if self.testing && TEST_NUMBERS.contains(&number.as_str()) {
            tracing::info!("Tracking number {} is a USPS test number, skipping check", number);
            return true;
        }

        let Some((payload, check)) = split_check(&number) else {
            return false;
        };
        let valid = checksum::GS1_MOD10.verify(payload, check);
        tracing::debug!("USPS {} check digit {}: valid={}", number, check, valid);
        valid
    }

    fn url(&self, number: &TrackingNumber) -> String {
        format!("{}{}", CLICK_URL, number)
    }

    fn build_request(&self, number: &TrackingNumber) -> Result<TrackRequest> {
        let config = self.credentials()?;
        let xml = format!(
            r#"<TrackFieldRequest USERID="{}"><TrackID ID="{}"/></TrackFieldRequest>"#,
            escape(config.userid.as_str()),
            escape(number.as_str()),
        );

        Ok(TrackRequest::get(self.server(config).base_url())
            .with_query("API", "TrackV2")
            .with_query("XML", xml))
    }

    fn parse_response(
        &self,
        number: &TrackingNumber,
        response: &TransportResponse,
    ) -> Result<TrackingInfo> {
        let document = strip_namespaces(&response.body)?;

        // system errors come back as a bare <Error> document
        if xml_root(&document)? == "Error" {
            let error: UspsError = quick_xml::de::from_str(&document)?;
            tracing::error!("USPS track failed: {} {}", error.number, error.description);
            return Err(Error::track_failed("USPS", error.description));
        }

        let document: UspsTrackResponse = quick_xml::de::from_str(&document)?;
        let track_info = document.track_info;

        if let Some(error) = track_info.error {
            tracing::error!("USPS track failed: {} {}", error.number, error.description);
            return Err(Error::track_failed("USPS", error.description));
        }

        let summary = track_info
            .track_summary
            .ok_or_else(|| Error::provider("USPS", "response has no TrackSummary"))?;
        let last_update = summary
            .timestamp()?
            .ok_or_else(|| Error::provider("USPS", "TrackSummary has no EventDate"))?;
        let location = summary.location();
        let status = summary.event.clone();

        let service = number
            .as_str()
            .get(..2)
            .and_then(|code| SERVICE_TYPES.iter().find(|(prefix, _)| *prefix == code))
            .map(|(_, name)| *name)
            .unwrap_or(DEFAULT_SERVICE);

        let delivered = status.to_ascii_uppercase().starts_with("DELIVERED");

        let mut info = TrackingInfo::new(number.as_str(), CarrierIdentity::Usps, status.clone(), last_update);
        info.location = location.clone();
        info.service = Some(service.to_string());
        info.link = Some(self.url(number));

        // the summary is not repeated in the detail list
        if delivered {
            info.delivery_date = Some(last_update);
            info.add_event(last_update, location, status);
        }

        for detail in &track_info.track_details {
            match detail.timestamp()? {
                Some(date) => {
                    info.add_event(date, detail.location(), detail.event.clone());
                }
                None => tracing::debug!("Skipping undated USPS event '{}'", detail.event),
            }
        }

        Ok(info)
    }
}

// ----------------------------------------------------------------------------
// Response schema
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UspsError {
    #[serde(default)]
    number: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct UspsTrackResponse {
    #[serde(rename = "TrackInfo")]
    track_info: UspsTrackInfo,
}

#[derive(Debug, Deserialize)]
struct UspsTrackInfo {
    #[serde(rename = "Error", default)]
    error: Option<UspsError>,
    #[serde(rename = "TrackSummary", default)]
    track_summary: Option<UspsEvent>,
    #[serde(rename = "TrackDetail", default)]
    track_details: Vec<UspsEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UspsEvent {
    #[serde(default)]
    event_time: Option<String>,
    #[serde(default)]
    event_date: Option<String>,
    #[serde(default)]
    event: String,
    #[serde(default)]
    event_city: Option<String>,
    #[serde(default)]
    event_state: Option<String>,
    #[serde(default)]
    event_country: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl UspsEvent {
    /// `EventDate` plus `EventTime`; events without a time happened at midnight
    fn timestamp(&self) -> Result<Option<NaiveDateTime>> {
        let Some(date) = non_empty(&self.event_date) else {
            return Ok(None);
        };
        let date = NaiveDate::parse_from_str(date, "%B %d, %Y")
            .map_err(|e| Error::provider("USPS", format!("invalid EventDate '{}': {}", date, e)))?;

        let time = match non_empty(&self.event_time) {
            Some(time) => NaiveTime::parse_from_str(time, "%I:%M %p").map_err(|e| {
                Error::provider("USPS", format!("invalid EventTime '{}': {}", time, e))
            })?,
            None => NaiveTime::MIN,
        };
        Ok(Some(date.and_time(time)))
    }

    /// `City,State,Country`; domestic events leave the country empty
    fn location(&self) -> Option<String> {
        let city = non_empty(&self.event_city);
        let state = non_empty(&self.event_state);
        if city.is_none() && state.is_none() {
            return None;
        }
        let country = non_empty(&self.event_country).unwrap_or("US");
        join_location([city, state, Some(country)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usps(testing: bool, server: Option<UspsServer>) -> UspsInterface {
        let config = UspsConfig {
            userid: "USPSUSER".to_string(),
            password: None,
            server,
        };
        UspsInterface::new(Some(config), testing)
    }

    const IN_TRANSIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrackResponse>
  <TrackInfo ID="9205596900128506211821">
    <TrackSummary>
      <EventTime>8:12 am</EventTime>
      <EventDate>June 20, 2010</EventDate>
      <Event>Arrival at Unit</Event>
      <EventCity>NEWTON</EventCity>
      <EventState>IA</EventState>
      <EventZIPCode>50208</EventZIPCode>
      <EventCountry/>
    </TrackSummary>
    <TrackDetail>
      <EventTime>9:24 pm</EventTime>
      <EventDate>June 19, 2010</EventDate>
      <Event>Processed through Sort Facility</Event>
      <EventCity>DES MOINES</EventCity>
      <EventState>IA</EventState>
      <EventCountry></EventCountry>
    </TrackDetail>
    <TrackDetail>
      <EventTime/>
      <EventDate>June 18, 2010</EventDate>
      <Event>Shipping Label Created</Event>
      <EventCity>TORONTO</EventCity>
      <EventState>ON</EventState>
      <EventCountry>CANADA</EventCountry>
    </TrackDetail>
    <TrackDetail>
      <EventTime/>
      <EventDate/>
      <Event>Pre-Shipment Info Sent to USPS</Event>
    </TrackDetail>
  </TrackInfo>
</TrackResponse>"#;

    const DELIVERED: &str = r#"<TrackResponse><TrackInfo ID="EA123456785US">
<TrackSummary><EventTime>10:45 am</EventTime><EventDate>June 21, 2010</EventDate><Event>DELIVERED</Event><EventCity>NEWTON</EventCity><EventState>IA</EventState><EventCountry/></TrackSummary>
<TrackDetail><EventTime>8:12 am</EventTime><EventDate>June 21, 2010</EventDate><Event>Out for Delivery</Event><EventCity>NEWTON</EventCity><EventState>IA</EventState><EventCountry/></TrackDetail>
</TrackInfo></TrackResponse>"#;

    #[test]
    fn test_identify_shapes() {
        let usps = usps(false, None);
        assert_eq!(usps.format("9205596900128506211821"), Some(UspsFormat::Impb));
        assert_eq!(usps.format("0123456789"), Some(UspsFormat::Legacy));
        assert_eq!(usps.format("ea123456789us"), Some(UspsFormat::S10));
        assert_eq!(usps.format("92055969001285062118210000"), Some(UspsFormat::ImpbLong));
        assert_eq!(usps.format("12055969001285062118210000"), None);
        assert_eq!(usps.format("E1123456789US"), None);
        assert_eq!(usps.format("EA123456X89US"), None);
        assert!(!usps.identify("1Z648616E192760718"));
    }

    #[test]
    fn test_s10_check_positions_unconstrained() {
        assert!(usps(false, None).identify("EA1234567AAUS"));
    }

    #[test]
    fn test_validate_impb_checksum() {
        let usps = usps(false, None);
        assert!(usps.validate("9205596900128506211821"));
        assert!(usps.validate("9205 5969 0012 8506 2118 21"));
        assert!(usps.validate("7196901075600307738508"));
        assert!(!usps.validate("7196901075600307738501"));
        assert!(!usps.validate("9405503699300451134169"));
    }

    #[test]
    fn test_validate_format_only_shapes() {
        let usps = usps(false, None);
        assert!(usps.validate("0123456789"));
        assert!(usps.validate("EA123456789US"));
        assert!(usps.validate("92055969001285062118210000"));
    }

    #[test]
    fn test_sandbox_numbers() {
        assert!(!usps(false, None).validate("9400100000000000000000"));
        assert!(usps(true, None).validate("9400100000000000000000"));
        assert!(usps(true, None).validate("9205500000000000000000"));
    }

    #[test]
    fn test_build_request() {
        let num = TrackingNumber::new("9205596900128506211821");

        let request = usps(false, None).build_request(&num).unwrap();
        assert_eq!(request.url, "http://production.shippingapis.com/ShippingAPI.dll");
        assert_eq!(request.query_param("API"), Some("TrackV2"));
        assert_eq!(
            request.query_param("XML"),
            Some(r#"<TrackFieldRequest USERID="USPSUSER"><TrackID ID="9205596900128506211821"/></TrackFieldRequest>"#)
        );

        let request = usps(true, None).build_request(&num).unwrap();
        assert_eq!(request.url, "http://testing.shippingapis.com/ShippingAPITest.dll");

        let request = usps(true, Some(UspsServer::Secure)).build_request(&num).unwrap();
        assert_eq!(request.url, "https://secure.shippingapis.com/ShippingAPI.dll");
    }

    #[test]
    fn test_build_request_requires_credentials() {
        let usps = UspsInterface::new(None, false);
        assert!(matches!(
            usps.build_request(&TrackingNumber::new("0123456789")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_in_transit() {
        let num = TrackingNumber::new("9205596900128506211821");
        let info = usps(false, None)
            .parse_response(&num, &TransportResponse::new(200, IN_TRANSIT))
            .unwrap();

        assert_eq!(info.carrier, CarrierIdentity::Usps);
        assert_eq!(info.status, "Arrival at Unit");
        assert_eq!(info.last_update.to_string(), "2010-06-20 08:12:00");
        assert_eq!(info.location.as_deref(), Some("NEWTON,IA,US"));
        assert_eq!(info.service.as_deref(), Some("USPS"));
        assert_eq!(info.delivery_date, None);
        assert!(!info.is_delivered());

        // the undated event is skipped
        assert_eq!(info.events.len(), 2);
        assert_eq!(info.events[0].date.to_string(), "2010-06-19 21:24:00");
        assert_eq!(info.events[0].location.as_deref(), Some("DES MOINES,IA,US"));
        assert_eq!(info.events[1].date.to_string(), "2010-06-18 00:00:00");
        assert_eq!(info.events[1].location.as_deref(), Some("TORONTO,ON,CANADA"));
        assert_eq!(info.last_event().unwrap().detail, "Processed through Sort Facility");
    }

    #[test]
    fn test_parse_delivered_adds_summary_event() {
        let num = TrackingNumber::new("EA123456785US");
        let info = usps(false, None)
            .parse_response(&num, &TransportResponse::new(200, DELIVERED))
            .unwrap();

        assert!(info.is_delivered());
        assert_eq!(info.service.as_deref(), Some("express mail"));
        assert_eq!(info.delivery_date, Some(info.last_update));
        assert_eq!(info.events.len(), 2);
        assert_eq!(info.events[0].detail, "DELIVERED");
        assert_eq!(info.last_event().unwrap().detail, "DELIVERED");
    }

    #[test]
    fn test_parse_system_error() {
        let body = r#"<?xml version="1.0"?><Error><Number>80040B1A</Number><Description>Authorization failure.</Description><Source>USPSCOM::DoAuth</Source></Error>"#;
        let err = usps(false, None)
            .parse_response(&TrackingNumber::new("0123456789"), &TransportResponse::new(200, body))
            .unwrap_err();
        assert!(matches!(err, Error::TrackFailed { .. }));
        assert!(err.to_string().contains("Authorization failure."));
    }

    #[test]
    fn test_parse_track_info_error() {
        let body = r#"<TrackResponse><TrackInfo ID="0123456789"><Error><Number>-2147219302</Number><Description>The Postal Service could not locate the tracking information for your request.</Description></Error></TrackInfo></TrackResponse>"#;
        let err = usps(false, None)
            .parse_response(&TrackingNumber::new("0123456789"), &TransportResponse::new(200, body))
            .unwrap_err();
        assert!(matches!(err, Error::TrackFailed { .. }));
        assert!(err.to_string().contains("could not locate"));
    }
}
