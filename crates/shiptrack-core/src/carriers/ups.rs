//! UPS
//!
//! `1Z` tracking numbers and the UPS Tracking JSON API.
//!
//! ## Number Format
//!
//! ```text
//! 1Z 648616 E1 9276071 8
//! -- ------ -- ------- -
//! |  |      |  |       check digit (mod 10, alpha-weighted)
//! |  |      |  package id
//! |  |      service code
//! |  shipper account
//! prefix
//! ```
//!
//! ## API Reference
//!
//! - Track: POST `https://onlinetools.ups.com/rest/Track`
//! - Customer integration environment: POST `https://wwwcie.ups.com/rest/Track`

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::json;

use crate::carriers::join_location;
use crate::checksum::{self, split_check};
use crate::config::UpsConfig;
use crate::error::{Error, Result};
use crate::format::FormatRule;
use crate::model::TrackingInfo;
use crate::number::{TrackingNumber, normalize};
use crate::traits::{Carrier, CarrierIdentity, RequestBody, TrackRequest, TransportResponse};

const API_URL_TEST: &str = "https://wwwcie.ups.com/rest/Track";
const API_URL_PRODUCTION: &str = "https://onlinetools.ups.com/rest/Track";

const CLICK_URL: &str =
    "http://wwwapps.ups.com/WebTracking/processInputRequest?TypeOfInquiryNumber=T&InquiryNumber1=";

const FORMAT: FormatRule = FormatRule::exact(18, "1Z", &[]);

/// Numbers from the UPS developer guide; most have invalid check digits
const TEST_NUMBERS: &[&str] = &[
    "1Z12345E0205271688",
    "1Z12345E6605272234",
    "1Z12345E0305271640",
    "1Z12345E1305277940",
    "1Z12345E6205277936",
    "1Z648616E192760718",
    "1ZWX0692YP40636269",
    "1Z12345E1505270452",
];

/// Fault codes UPS uses for numbers it does not know
const INVALID_NUMBER_CODES: &[&str] = &["151018", "151022", "154010", "151044"];

/// Basic service: delivered to the local post office
const SERVICE_BASIC: &str = "031";

/// UPS carrier interface
#[derive(Debug, Clone)]
pub struct UpsInterface {
    config: Option<UpsConfig>,
    testing: bool,
}

impl UpsInterface {
    pub fn new(config: Option<UpsConfig>, testing: bool) -> Self {
        Self { config, testing }
    }

    fn api_url(&self) -> &'static str {
        if self.testing {
            API_URL_TEST
        } else {
            API_URL_PRODUCTION
        }
    }

    fn credentials(&self) -> Result<&UpsConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::config("no [ups] credentials configured"))
    }
}

impl Carrier for UpsInterface {
    fn identity(&self) -> CarrierIdentity {
        CarrierIdentity::Ups
    }

    fn identify(&self, raw: &str) -> bool {
        FORMAT.matches(&normalize(raw))
    }

    fn validate(&self, raw: &str) -> bool {
        let number = normalize(raw);
        if !FORMAT.matches(&number) {
            tracing::debug!("Number {} is not a UPS number", number);
            return false;
        }

        if self.testing && TEST_NUMBERS.contains(&number.as_str()) {
            tracing::info!("Tracking number {} is a UPS test number, skipping check", number);
            return true;
        }

        let Some((body, check)) = split_check(&number) else {
            return false;
        };
        let valid = checksum::UPS.verify(&body[2..], check);
        tracing::debug!("UPS {} check digit {}: valid={}", number, check, valid);
        valid
    }

    fn url(&self, number: &TrackingNumber) -> String {
        format!("{}{}", CLICK_URL, number)
    }

    fn build_request(&self, number: &TrackingNumber) -> Result<TrackRequest> {
        let credentials = self.credentials()?;

        let body = json!({
            "UPSSecurity": {
                "UsernameToken": {
                    "Username": credentials.user_id,
                    "Password": credentials.password,
                },
                "ServiceAccessToken": {
                    "AccessLicenseNumber": credentials.license_number,
                },
            },
            "TrackRequest": {
                "Request": {
                    "TransactionReference": {
                        "CustomerContext": "track request",
                    },
                    "RequestOption": "1",
                },
                "InquiryNumber": number.as_str(),
            },
        });

        Ok(TrackRequest::post(self.api_url(), RequestBody::Json(body))
            .with_header("Accept", "application/json"))
    }

    fn parse_response(
        &self,
        number: &TrackingNumber,
        response: &TransportResponse,
    ) -> Result<TrackingInfo> {
        let document: UpsDocument = serde_json::from_str(&response.body)?;

        if let Some(fault) = document.fault {
            return Err(fault.into_error());
        }

        let root = document
            .track_response
            .ok_or_else(|| Error::provider("UPS", "response has neither TrackResponse nor Fault"))?;

        let response_status = &root.response.response_status;
        if response_status.code.trim() != "1" {
            return Err(Error::track_failed("UPS", response_status.description.clone()));
        }

        let shipment = root.shipment;
        let service_code = shipment
            .shipment_type
            .as_ref()
            .map(|shipment_type| shipment_type.code.as_str())
            .unwrap_or(shipment.service.code.as_str());

        let mut service = shipment.service.description.clone();
        if !service.starts_with("UPS") {
            service = format!("UPS {}", service);
        }

        let activities = shipment.package.activity.into_vec();
        // UPS lists the most recent activity first
        let latest = activities
            .first()
            .ok_or_else(|| Error::provider("UPS", "shipment has no activity"))?;

        let status = latest.status.description.clone();
        let kind = latest.status.kind();
        let last_update = latest.timestamp()?;

        let (location, delivery_date) = if service_code == SERVICE_BASIC {
            let location = shipment
                .ship_to
                .as_ref()
                .and_then(|ship_to| ship_to.address.as_ref())
                .and_then(UpsAddress::location);
            (location, Some(last_update))
        } else {
            let location = if kind.contains('M') || kind.contains('P') {
                None
            } else {
                latest
                    .activity_location
                    .as_ref()
                    .and_then(|l| l.address.as_ref())
                    .and_then(UpsAddress::location)
            };

            let delivery_date = if kind == "D" {
                Some(last_update)
            } else if let Some(date) = &shipment.package.rescheduled_delivery_date {
                Some(parse_date(date)?.and_time(NaiveTime::MIN))
            } else if let Some(date) = &shipment.scheduled_delivery_date {
                Some(parse_date(date)?.and_time(NaiveTime::MIN))
            } else {
                None
            };
            (location, delivery_date)
        };

        let delivery_detail = latest
            .activity_location
            .as_ref()
            .and_then(|l| l.description.clone())
            .unwrap_or_else(|| status.clone());

        let mut info = TrackingInfo::new(number.as_str(), CarrierIdentity::Ups, status, last_update);
        info.delivery_date = delivery_date;
        info.location = location;
        info.delivery_detail = Some(delivery_detail);
        info.service = Some(service);
        info.link = Some(self.url(number));

        for activity in &activities {
            let location = activity
                .activity_location
                .as_ref()
                .and_then(|l| l.address.as_ref())
                .filter(|address| address.city.is_some())
                .and_then(UpsAddress::location);
            info.add_event(activity.timestamp()?, location, activity.status.description.clone());
        }

        Ok(info)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d")
        .map_err(|e| Error::provider("UPS", format!("invalid date '{}': {}", value, e)))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H%M%S")
        .map_err(|e| Error::provider("UPS", format!("invalid time '{}': {}", value, e)))
}

// ----------------------------------------------------------------------------
// Response schema
// ----------------------------------------------------------------------------

/// UPS sends a single object where a list holds one entry
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsDocument {
    #[serde(default)]
    track_response: Option<UpsTrackResponse>,
    #[serde(default)]
    fault: Option<UpsFault>,
}

#[derive(Debug, Deserialize)]
struct UpsFault {
    detail: UpsFaultDetail,
}

impl UpsFault {
    fn into_error(self) -> Error {
        let primary = self.detail.errors.error_detail.primary_error_code;
        tracing::error!("UPS track failed: {} {}", primary.code, primary.description);

        if INVALID_NUMBER_CODES.contains(&primary.code.as_str()) {
            Error::invalid_number(primary.description)
        } else {
            Error::track_failed("UPS", primary.description)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsFaultDetail {
    errors: UpsErrors,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsErrors {
    error_detail: UpsErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsErrorDetail {
    primary_error_code: UpsCode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsCode {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsTrackResponse {
    response: UpsResponse,
    shipment: UpsShipment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsResponse {
    response_status: UpsCode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsShipment {
    #[serde(default)]
    shipment_type: Option<UpsCode>,
    service: UpsCode,
    #[serde(default)]
    ship_to: Option<UpsShipTo>,
    #[serde(default)]
    scheduled_delivery_date: Option<String>,
    package: UpsPackage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsShipTo {
    #[serde(default)]
    address: Option<UpsAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsPackage {
    activity: OneOrMany<UpsActivity>,
    #[serde(default)]
    rescheduled_delivery_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsActivity {
    #[serde(default)]
    activity_location: Option<UpsActivityLocation>,
    status: UpsStatus,
    date: String,
    time: String,
}

impl UpsActivity {
    fn timestamp(&self) -> Result<NaiveDateTime> {
        Ok(parse_date(&self.date)?.and_time(parse_time(&self.time)?))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsActivityLocation {
    #[serde(default)]
    address: Option<UpsAddress>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsStatus {
    /// Activity type: I, D, X, P or M
    #[serde(default, rename = "Type")]
    status_type: Option<String>,
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl UpsStatus {
    fn kind(&self) -> &str {
        self.status_type.as_deref().unwrap_or(&self.code)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpsAddress {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state_province_code: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

impl UpsAddress {
    fn location(&self) -> Option<String> {
        join_location([
            self.city.as_deref(),
            self.state_province_code.as_deref(),
            self.country_code.as_deref(),
        ])
    }
}
