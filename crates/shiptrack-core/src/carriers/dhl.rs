//! DHL
//!
//! DHL Express and eCommerce numbers and the DHL Shipment Tracking (unified)
//! JSON API.
//!
//! DHL numbers carry no check digit shiptrack can verify, so validation is
//! format matching alone.
//!
//! ## API Reference
//!
//! - Track: GET `https://api-eu.dhl.com/track/shipments?trackingNumber=...`
//! - Sandbox: GET `https://api-test.dhl.com/track/shipments?trackingNumber=...`
//! - Authentication: `DHL-API-Key` header

use serde::Deserialize;

use crate::carriers::{join_location, parse_timestamp};
use crate::config::DhlConfig;
use crate::error::{Error, Result};
use crate::format::{CharClass, FormatRule, Segment};
use crate::model::TrackingInfo;
use crate::number::{TrackingNumber, normalize};
use crate::traits::{Carrier, CarrierIdentity, TrackRequest, TransportResponse};

const API_URL_TEST: &str = "https://api-test.dhl.com/track/shipments";
const API_URL_PRODUCTION: &str = "https://api-eu.dhl.com/track/shipments";

const CLICK_URL: &str = "https://www.dhl.com/en/express/tracking.html";

const STATUS_DELIVERED: &str = "delivered";

const DIGITS_FROM_2: &[Segment] = &[Segment::tail(2, CharClass::Digit)];
const DIGITS_FROM_3: &[Segment] = &[Segment::tail(3, CharClass::Digit)];
const DIGITS_FROM_4: &[Segment] = &[Segment::tail(4, CharClass::Digit)];
const DIGITS_FROM_5: &[Segment] = &[Segment::tail(5, CharClass::Digit)];
const ALPHANUMERIC_FROM_2: &[Segment] = &[Segment::tail(2, CharClass::Alphanumeric)];

const fn ecommerce(prefix: &'static str) -> FormatRule {
    FormatRule::ranged(10, 39, prefix, ALPHANUMERIC_FROM_2)
}

/// Fixed-length forms come first
const FORMATS: &[FormatRule] = &[
    FormatRule::exact(10, "000", DIGITS_FROM_3),
    FormatRule::exact(10, "JJD00", DIGITS_FROM_5),
    FormatRule::exact(10, "JJD01", DIGITS_FROM_5),
    FormatRule::exact(10, "JVGL", DIGITS_FROM_4),
    FormatRule::exact(10, "3S", DIGITS_FROM_2),
    FormatRule::exact(10, "JJD", DIGITS_FROM_3),
    ecommerce("GM"),
    ecommerce("LX"),
    ecommerce("RX"),
];

/// DHL carrier interface
#[derive(Debug, Clone)]
pub struct DhlInterface {
    config: Option<DhlConfig>,
    testing: bool,
}

impl DhlInterface {
    pub fn new(config: Option<DhlConfig>, testing: bool) -> Self {
        Self { config, testing }
    }

    fn api_url(&self) -> &'static str {
        if self.testing {
            API_URL_TEST
        } else {
            API_URL_PRODUCTION
        }
    }

    fn credentials(&self) -> Result<&DhlConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::config("no [dhl] credentials configured"))
    }
}

impl Carrier for DhlInterface {
    fn identity(&self) -> CarrierIdentity {
        CarrierIdentity::Dhl
    }

    fn identify(&self, raw: &str) -> bool {
        let number = normalize(raw);
        FORMATS.iter().any(|rule| rule.matches(&number))
    }

    fn validate(&self, raw: &str) -> bool {
        let valid = self.identify(raw);
        tracing::debug!("DHL {}: valid={} (format only)", normalize(raw), valid);
        valid
    }

    fn url(&self, number: &TrackingNumber) -> String {
        format!("{}?AWB={}&brand=DHL", CLICK_URL, number)
    }

    fn build_request(&self, number: &TrackingNumber) -> Result<TrackRequest> {
        let config = self.credentials()?;
        Ok(TrackRequest::get(self.api_url())
            .with_query("trackingNumber", number.as_str())
            .with_header("DHL-API-Key", config.api_key.as_str())
            .with_header("Accept", "application/json"))
    }

    fn parse_response(
        &self,
        number: &TrackingNumber,
        response: &TransportResponse,
    ) -> Result<TrackingInfo> {
        if response.status == 404 {
            tracing::error!("DHL does not know {}", number);
            return Err(Error::invalid_number(number.as_str()));
        }

        if !response.is_success() {
            let message = serde_json::from_str::<DhlProblem>(&response.body)
                .map(DhlProblem::describe)
                .unwrap_or_else(|_| format!("HTTP {}", response.status));
            tracing::error!("DHL track failed: {}", message);
            return Err(Error::track_failed("DHL", message));
        }

        let document: DhlDocument = serde_json::from_str(&response.body)?;
        let shipment = document
            .shipments
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_number(number.as_str()))?;

        let status = &shipment.status;
        let last_update = parse_timestamp(CarrierIdentity::Dhl, &status.timestamp)?;

        let delivery_date = if status.status_code.as_deref() == Some(STATUS_DELIVERED) {
            Some(last_update)
        } else {
            shipment
                .estimated_time_of_delivery
                .as_deref()
                .map(|timestamp| parse_timestamp(CarrierIdentity::Dhl, timestamp))
                .transpose()?
        };

        let mut info = TrackingInfo::new(number.as_str(), CarrierIdentity::Dhl, status.summary(), last_update);
        info.delivery_date = delivery_date;
        info.location = status.location();
        info.delivery_detail = status.remark.clone();
        info.service = shipment.service.clone();
        info.link = Some(self.url(number));

        for event in &shipment.events {
            info.add_event(
                parse_timestamp(CarrierIdentity::Dhl, &event.timestamp)?,
                event.location(),
                event.detail(),
            );
        }

        Ok(info)
    }
}

// ----------------------------------------------------------------------------
// Response schema
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DhlDocument {
    #[serde(default)]
    shipments: Vec<DhlShipment>,
}

/// RFC 7807 problem document returned on errors
#[derive(Debug, Deserialize)]
struct DhlProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl DhlProblem {
    fn describe(self) -> String {
        match (self.title, self.detail) {
            (Some(title), Some(detail)) => format!("{}: {}", title, detail),
            (Some(message), None) | (None, Some(message)) => message,
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlShipment {
    #[serde(default)]
    service: Option<String>,
    status: DhlStatus,
    #[serde(default)]
    estimated_time_of_delivery: Option<String>,
    #[serde(default)]
    events: Vec<DhlStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlStatus {
    timestamp: String,
    #[serde(default)]
    location: Option<DhlLocation>,
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    remark: Option<String>,
}

impl DhlStatus {
    fn summary(&self) -> String {
        self.status
            .clone()
            .or_else(|| self.description.clone())
            .or_else(|| self.status_code.clone())
            .unwrap_or_default()
    }

    fn detail(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.status.clone())
            .unwrap_or_default()
    }

    fn location(&self) -> Option<String> {
        let address = self.location.as_ref()?.address.as_ref()?;
        join_location([address.address_locality.as_deref(), address.country_code.as_deref()])
    }
}

#[derive(Debug, Deserialize)]
struct DhlLocation {
    #[serde(default)]
    address: Option<DhlAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlAddress {
    #[serde(default)]
    address_locality: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dhl(testing: bool) -> DhlInterface {
        let config = DhlConfig {
            api_key: "dhl-secret".to_string(),
        };
        DhlInterface::new(Some(config), testing)
    }

    const IN_TRANSIT: &str = r#"{
        "shipments": [{
            "id": "JJD0123456",
            "service": "express",
            "status": {
                "timestamp": "2023-05-02T10:15:00+02:00",
                "location": {"address": {"addressLocality": "Leipzig - Germany", "countryCode": "DE"}},
                "statusCode": "transit",
                "status": "TRANSIT",
                "description": "Shipment has departed from a DHL facility"
            },
            "estimatedTimeOfDelivery": "2023-05-04T18:00:00Z",
            "events": [
                {
                    "timestamp": "2023-05-02T10:15:00+02:00",
                    "location": {"address": {"addressLocality": "Leipzig - Germany"}},
                    "statusCode": "transit",
                    "description": "Shipment has departed from a DHL facility"
                },
                {
                    "timestamp": "2023-05-01T16:40:00",
                    "statusCode": "pre-transit",
                    "status": "Shipment picked up"
                }
            ]
        }]
    }"#;

    #[test]
    fn test_identify_fixed_forms() {
        let dhl = dhl(false);
        for number in ["0001234567", "JJD0012345", "JJD0112345", "JVGL123456", "3S12345678", "JJD0123456"] {
            assert!(dhl.identify(number), "{}", number);
        }
        assert!(!dhl.identify("JJD012345"));
        assert!(!dhl.identify("JJD01234567"));
        assert!(!dhl.identify("JJDA123456"));
        assert!(!dhl.identify("0011234567"));
    }

    #[test]
    fn test_identify_ecommerce_forms() {
        let dhl = dhl(false);
        assert!(dhl.identify("GM2951173225174494"));
        assert!(dhl.identify("lx123456789de"));
        assert!(dhl.identify("RX12345678"));
        assert!(!dhl.identify("RX1234567"));
        assert!(!dhl.identify(&format!("GM{}", "1".repeat(38))));
        assert!(!dhl.identify("GM12345-6789"));
    }

    #[test]
    fn test_validate_is_format_only() {
        let dhl = dhl(false);
        assert!(dhl.validate("JJD0123456"));
        assert!(dhl.validate("JJD 012 3456"));
        assert!(!dhl.validate("14324423523"));
        assert!(!dhl.validate(""));
    }

    #[test]
    fn test_url() {
        assert_eq!(
            dhl(false).url(&TrackingNumber::new("JJD0123456")),
            "https://www.dhl.com/en/express/tracking.html?AWB=JJD0123456&brand=DHL"
        );
    }

    #[test]
    fn test_build_request() {
        let num = TrackingNumber::new("JJD0123456");
        let request = dhl(false).build_request(&num).unwrap();
        assert_eq!(request.url, API_URL_PRODUCTION);
        assert_eq!(request.query_param("trackingNumber"), Some("JJD0123456"));
        assert_eq!(request.header("DHL-API-Key"), Some("dhl-secret"));
        assert!(request.body.is_none());

        assert_eq!(dhl(true).build_request(&num).unwrap().url, API_URL_TEST);
        assert!(matches!(
            DhlInterface::new(None, false).build_request(&num),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_in_transit() {
        let num = TrackingNumber::new("JJD0123456");
        let info = dhl(false)
            .parse_response(&num, &TransportResponse::new(200, IN_TRANSIT))
            .unwrap();

        assert_eq!(info.carrier, CarrierIdentity::Dhl);
        assert_eq!(info.status, "TRANSIT");
        assert_eq!(info.last_update.to_string(), "2023-05-02 10:15:00");
        assert_eq!(info.delivery_date.unwrap().to_string(), "2023-05-04 18:00:00");
        assert_eq!(info.location.as_deref(), Some("Leipzig - Germany,DE"));
        assert_eq!(info.service.as_deref(), Some("express"));
        assert_eq!(info.events.len(), 2);
        assert_eq!(info.events[0].location.as_deref(), Some("Leipzig - Germany"));
        assert_eq!(info.events[1].detail, "Shipment picked up");
        assert_eq!(info.events[1].location, None);
    }

    #[test]
    fn test_parse_delivered() {
        let body = r#"{"shipments": [{"status": {
            "timestamp": "2023-05-04T11:02:00Z",
            "statusCode": "delivered",
            "status": "DELIVERED",
            "remark": "Signed for by: MUELLER"
        }}]}"#;
        let info = dhl(false)
            .parse_response(&TrackingNumber::new("JJD0123456"), &TransportResponse::new(200, body))
            .unwrap();

        assert!(info.is_delivered());
        assert_eq!(info.delivery_date, Some(info.last_update));
        assert_eq!(info.delivery_detail.as_deref(), Some("Signed for by: MUELLER"));
        assert!(info.events.is_empty());
    }

    #[test]
    fn test_parse_not_found() {
        let body = r#"{"title": "No result found", "status": 404, "detail": "No shipment with given tracking number found."}"#;
        let err = dhl(false)
            .parse_response(&TrackingNumber::new("JJD0123456"), &TransportResponse::new(404, body))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTrackingNumber(_)));
    }

    #[test]
    fn test_parse_problem_document() {
        let body = r#"{"title": "Bad Request", "status": 400, "detail": "Invalid tracking number format"}"#;
        let err = dhl(false)
            .parse_response(&TrackingNumber::new("JJD0123456"), &TransportResponse::new(400, body))
            .unwrap_err();
        assert!(matches!(err, Error::TrackFailed { .. }));
        assert!(err.to_string().contains("Bad Request: Invalid tracking number format"));
    }

    #[test]
    fn test_parse_empty_shipments() {
        let err = dhl(false)
            .parse_response(&TrackingNumber::new("JJD0123456"), &TransportResponse::new(200, r#"{"shipments": []}"#))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTrackingNumber(_)));
    }
}
