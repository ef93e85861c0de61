//! FedEx
//!
//! FedEx Express, Ground and SSC-18 numbers and the FedEx Web Services
//! Track (v5) SOAP API.
//!
//! ## Number Formats
//!
//! ```text
//! Express (12):           797806677146
//! Ground-96 (15):         019343586678996
//!                         ------- shipper id
//!                                -------  package id
//!                                       - check digit
//! Ground-96 (22):  9611020019343586678996
//!                  ---- application id / SCNC
//!                    -- class of service
//!                       ------- shipper id
//!                              ------- package id
//!                                     - check digit
//! SSC-18 (20):     00123456789012345675
//! ```
//!
//! ## API Reference
//!
//! - Track: POST `https://ws.fedex.com:443/web-services`
//! - Test server: POST `https://wsbeta.fedex.com:443/web-services`

use quick_xml::escape::escape;
use serde::Deserialize;

use crate::carriers::{join_location, parse_timestamp, strip_namespaces};
use crate::checksum::{self, split_check};
use crate::config::FedexConfig;
use crate::error::{Error, Result};
use crate::format::{ALL_DIGITS, FormatRule, classify};
use crate::model::TrackingInfo;
use crate::number::{TrackingNumber, normalize};
use crate::traits::{Carrier, CarrierIdentity, RequestBody, TrackRequest, TransportResponse};

const API_URL_TEST: &str = "https://wsbeta.fedex.com:443/web-services";
const API_URL_PRODUCTION: &str = "https://ws.fedex.com:443/web-services";

const CLICK_URL: &str = "http://www.fedex.com/Tracking?tracknumbers=";

/// Published FedEx sandbox numbers
const TEST_NUMBERS: &[&str] = &[
    "122816215025810",
    "449044304137821",
    "149331877648230",
    "020207021381215",
    "403934084723025",
    "920241085725456",
    "568838414941",
    "039813852990618",
    "231300687629630",
    "797806677146",
    "377101283611590",
    "852426136339213",
    "797615467620",
    "957794015041323",
    "076288115212522",
    "581190049992",
    "843119172384577",
    "070358180009382",
];

/// Severities of a reply that still carries tracking details
const ACCEPTED_SEVERITIES: &[&str] = &["SUCCESS", "NOTE", "WARNING"];

/// Notification code for a number FedEx cannot find
const CODE_NOT_FOUND: &str = "9040";

/// Status code of a delivered shipment
const STATUS_DELIVERED: &str = "DL";

/// FedEx number shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FedexFormat {
    Express,
    Ground96,
    Ground96Long,
    Ssc18,
}

const FORMATS: &[(FedexFormat, FormatRule)] = &[
    (FedexFormat::Express, FormatRule::exact(12, "", ALL_DIGITS)),
    (FedexFormat::Ground96, FormatRule::exact(15, "", ALL_DIGITS)),
    (FedexFormat::Ground96Long, FormatRule::exact(22, "96", ALL_DIGITS)),
    (FedexFormat::Ssc18, FormatRule::exact(20, "00", ALL_DIGITS)),
];

/// Check digit of a normalized number already known to have `format`
fn verify(format: FedexFormat, number: &str) -> bool {
    let Some((_, check)) = split_check(number) else {
        return false;
    };
    match format {
        FedexFormat::Express => checksum::FEDEX_EXPRESS.verify(&number[..10], check),
        // 14 digits before the check digit, in both Ground-96 forms
        FedexFormat::Ground96 => checksum::FEDEX_GROUND.verify(&number[..14], check),
        FedexFormat::Ground96Long => checksum::FEDEX_GROUND.verify(&number[7..21], check),
        FedexFormat::Ssc18 => checksum::FEDEX_GROUND.verify(&number[1..19], check),
    }
}

/// FedEx carrier interface
#[derive(Debug, Clone)]
pub struct FedexInterface {
    config: Option<FedexConfig>,
    testing: bool,
}

impl FedexInterface {
    pub fn new(config: Option<FedexConfig>, testing: bool) -> Self {
        Self { config, testing }
    }

    /// Shape of the number, if it is a FedEx number
    pub fn format(&self, raw: &str) -> Option<FedexFormat> {
        classify(FORMATS, &normalize(raw))
    }

    fn api_url(&self, config: &FedexConfig) -> &'static str {
        if self.testing || config.use_test_server {
            API_URL_TEST
        } else {
            API_URL_PRODUCTION
        }
    }

    fn credentials(&self) -> Result<&FedexConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| Error::config("no [fedex] credentials configured"))
    }

    fn envelope(config: &FedexConfig, number: &TrackingNumber) -> String {
        let mut client_extras = String::new();
        if let Some(integrator_id) = &config.integrator_id {
            client_extras.push_str(&format!(
                "<v5:IntegratorId>{}</v5:IntegratorId>",
                escape(integrator_id.as_str())
            ));
        }
        if let Some(region) = &config.express_region_code {
            client_extras.push_str(&format!("<v5:Region>{}</v5:Region>", escape(region.as_str())));
        }

        format!(
            concat!(
                r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:v5="http://fedex.com/ws/track/v5">"#,
                "<soapenv:Header/>",
                "<soapenv:Body>",
                "<v5:TrackRequest>",
                "<v5:WebAuthenticationDetail><v5:UserCredential>",
                "<v5:Key>{key}</v5:Key><v5:Password>{password}</v5:Password>",
                "</v5:UserCredential></v5:WebAuthenticationDetail>",
                "<v5:ClientDetail>",
                "<v5:AccountNumber>{account}</v5:AccountNumber><v5:MeterNumber>{meter}</v5:MeterNumber>{extras}",
                "</v5:ClientDetail>",
                "<v5:TransactionDetail><v5:CustomerTransactionId>track request</v5:CustomerTransactionId></v5:TransactionDetail>",
                "<v5:Version><v5:ServiceId>trck</v5:ServiceId><v5:Major>5</v5:Major><v5:Intermediate>0</v5:Intermediate><v5:Minor>0</v5:Minor></v5:Version>",
                "<v5:PackageIdentifier><v5:Value>{number}</v5:Value><v5:Type>TRACKING_NUMBER_OR_DOORTAG</v5:Type></v5:PackageIdentifier>",
                "<v5:IncludeDetailedScans>true</v5:IncludeDetailedScans>",
                "</v5:TrackRequest>",
                "</soapenv:Body>",
                "</soapenv:Envelope>",
            ),
            key = escape(config.key.as_str()),
            password = escape(config.password.as_str()),
            account = escape(config.account_number.as_str()),
            meter = escape(config.meter_number.as_str()),
            extras = client_extras,
            number = escape(number.as_str()),
        )
    }
}

impl Carrier for FedexInterface {
    fn identity(&self) -> CarrierIdentity {
        CarrierIdentity::Fedex
    }

    fn identify(&self, raw: &str) -> bool {
        self.format(raw).is_some()
    }

    fn validate(&self, raw: &str) -> bool {
        let number = normalize(raw);
        let Some(format) = classify(FORMATS, &number) else {
            tracing::debug!("Number {} is not a FedEx number", number);
            return false;
        };

        if self.testing && TEST_NUMBERS.contains(&number.as_str()) {
            tracing::info!("Tracking number {} is a FedEx test number, skipping check", number);
            return true;
        }

        let valid = verify(format, &number);
        tracing::debug!("FedEx {:?} {}: valid={}", format, number, valid);
        valid
    }

    fn url(&self, number: &TrackingNumber) -> String {
        format!("{}{}", CLICK_URL, number)
    }

    fn build_request(&self, number: &TrackingNumber) -> Result<TrackRequest> {
        let config = self.credentials()?;
        let body = RequestBody::Text {
            content_type: "text/xml; charset=utf-8",
            content: Self::envelope(config, number),
        };
        Ok(TrackRequest::post(self.api_url(config), body))
    }

    fn parse_response(
        &self,
        number: &TrackingNumber,
        response: &TransportResponse,
    ) -> Result<TrackingInfo> {
        let document: FedexEnvelope = quick_xml::de::from_str(&strip_namespaces(&response.body)?)?;

        if let Some(fault) = document.body.fault {
            tracing::error!("FedEx SOAP fault: {}", fault.fault_string);
            return Err(Error::track_failed("FedEx", fault.fault_string));
        }

        let reply = document
            .body
            .track_reply
            .ok_or_else(|| Error::provider("FedEx", "response has no TrackReply"))?;

        if !ACCEPTED_SEVERITIES.contains(&reply.highest_severity.as_str()) {
            let message = reply
                .notifications
                .first()
                .map(FedexNotification::describe)
                .unwrap_or_else(|| reply.highest_severity.clone());
            tracing::error!("FedEx track failed: {}", message);
            return Err(Error::track_failed("FedEx", message));
        }

        let detail = reply
            .track_details
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider("FedEx", "reply has no TrackDetails"))?;

        if let Some(notification) = &detail.notification {
            if notification.is_error() {
                tracing::error!("FedEx track failed: {}", notification.describe());
                return Err(if notification.code == CODE_NOT_FOUND {
                    Error::invalid_number(notification.describe())
                } else {
                    Error::track_failed("FedEx", notification.describe())
                });
            }
        }

        let first_event = detail.events.first();

        let (last_update, delivery_date, location, delivery_detail) =
            if detail.status_code.as_deref() == Some(STATUS_DELIVERED) {
                let delivered = match (&detail.actual_delivery_timestamp, first_event) {
                    (Some(timestamp), _) => parse_timestamp(CarrierIdentity::Fedex, timestamp)?,
                    (None, Some(event)) => parse_timestamp(CarrierIdentity::Fedex, &event.timestamp)?,
                    (None, None) => {
                        return Err(Error::provider("FedEx", "delivered shipment has no timestamp"));
                    }
                };
                let location = detail
                    .actual_delivery_address
                    .as_ref()
                    .and_then(FedexAddress::location);
                let delivery_detail =
                    first_event.and_then(|event| event.status_exception_description.clone());
                (delivered, Some(delivered), location, delivery_detail)
            } else {
                let event = first_event
                    .ok_or_else(|| Error::provider("FedEx", "shipment has no tracking events"))?;
                let estimated = detail
                    .estimated_delivery_timestamp
                    .as_deref()
                    .map(|timestamp| parse_timestamp(CarrierIdentity::Fedex, timestamp))
                    .transpose()?;
                let location = event.address.as_ref().and_then(FedexAddress::location);
                (
                    parse_timestamp(CarrierIdentity::Fedex, &event.timestamp)?,
                    estimated,
                    location,
                    None,
                )
            };

        let status = detail.status_description.clone().unwrap_or_default();
        let mut info = TrackingInfo::new(number.as_str(), CarrierIdentity::Fedex, status, last_update);
        info.delivery_date = delivery_date;
        info.location = location;
        info.delivery_detail = delivery_detail;
        info.service = detail.service_type.clone();
        info.link = Some(self.url(number));

        for event in &detail.events {
            info.add_event(
                parse_timestamp(CarrierIdentity::Fedex, &event.timestamp)?,
                event.address.as_ref().and_then(FedexAddress::location),
                event.event_description.clone(),
            );
        }

        Ok(info)
    }
}

// ----------------------------------------------------------------------------
// Response schema (namespace prefixes stripped)
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FedexEnvelope {
    #[serde(rename = "Body")]
    body: FedexBody,
}

#[derive(Debug, Deserialize)]
struct FedexBody {
    #[serde(rename = "TrackReply", default)]
    track_reply: Option<FedexTrackReply>,
    #[serde(rename = "Fault", default)]
    fault: Option<SoapFault>,
}

#[derive(Debug, Deserialize)]
struct SoapFault {
    #[serde(rename = "faultstring", default)]
    fault_string: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FedexTrackReply {
    highest_severity: String,
    #[serde(default)]
    notifications: Vec<FedexNotification>,
    #[serde(default)]
    track_details: Vec<FedexTrackDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FedexNotification {
    #[serde(default)]
    severity: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    localized_message: Option<String>,
}

impl FedexNotification {
    fn is_error(&self) -> bool {
        matches!(self.severity.as_str(), "ERROR" | "FAILURE")
    }

    fn describe(&self) -> String {
        let message = self.localized_message.as_deref().unwrap_or(&self.message);
        format!("{}: {}", self.code, message)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FedexTrackDetail {
    #[serde(default)]
    notification: Option<FedexNotification>,
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    status_description: Option<String>,
    #[serde(default)]
    service_type: Option<String>,
    #[serde(default)]
    estimated_delivery_timestamp: Option<String>,
    #[serde(default)]
    actual_delivery_timestamp: Option<String>,
    #[serde(default)]
    actual_delivery_address: Option<FedexAddress>,
    #[serde(default)]
    events: Vec<FedexEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FedexEvent {
    timestamp: String,
    #[serde(default)]
    event_description: String,
    #[serde(default)]
    status_exception_description: Option<String>,
    #[serde(default)]
    address: Option<FedexAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FedexAddress {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state_or_province_code: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

impl FedexAddress {
    fn location(&self) -> Option<String> {
        join_location([
            self.city.as_deref(),
            self.state_or_province_code.as_deref(),
            self.country_code.as_deref(),
        ])
    }
}
