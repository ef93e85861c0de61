//! Test doubles and fixtures for the shiptrack contract tests

#![allow(dead_code)]

use shiptrack_core::config::{DhlConfig, FedexConfig, UpsConfig, UspsConfig};
use shiptrack_core::error::Result;
use shiptrack_core::{TrackRequest, TrackerConfig, Transport, TransportResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A transport that replays canned responses and records every request
#[derive(Clone, Default)]
pub struct RecordingTransport {
    /// Responses handed out in order
    responses: Arc<Mutex<VecDeque<Result<TransportResponse>>>>,
    /// Requests seen so far
    requests: Arc<Mutex<Vec<TrackRequest>>>,
    /// Call counter for send()
    send_call_count: Arc<AtomicUsize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that answers once with `status` and `body`
    pub fn replying(status: u16, body: impl Into<String>) -> Self {
        let transport = Self::new();
        transport.push_response(Ok(TransportResponse::new(status, body)));
        transport
    }

    /// Queue a response
    pub fn push_response(&self, response: Result<TransportResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Get the number of times send() was called
    pub fn send_call_count(&self) -> usize {
        self.send_call_count.load(Ordering::SeqCst)
    }

    /// Get the requests that were sent
    pub fn requests(&self) -> Vec<TrackRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &TrackRequest) -> Result<TransportResponse> {
        self.send_call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(500, "no response queued")))
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}

/// Configuration with credentials for every carrier
pub fn full_config(testing: bool) -> TrackerConfig {
    let mut config = TrackerConfig::new().with_testing(testing);
    config.ups = Some(UpsConfig {
        license_number: "UPSLICENSE".to_string(),
        user_id: "shipper".to_string(),
        password: "ups-secret".to_string(),
    });
    config.fedex = Some(FedexConfig {
        key: "fedex-key".to_string(),
        password: "fedex-secret".to_string(),
        account_number: "510087020".to_string(),
        meter_number: "118785166".to_string(),
        use_test_server: false,
        express_region_code: None,
        integrator_id: None,
    });
    config.usps = Some(UspsConfig {
        userid: "USPSUSER".to_string(),
        password: None,
        server: None,
    });
    config.dhl = Some(DhlConfig {
        api_key: "dhl-secret".to_string(),
    });
    config
}

/// UPS: delivered, single activity object
pub const UPS_DELIVERED: &str = r#"{
    "TrackResponse": {
        "Response": {"ResponseStatus": {"Code": "1", "Description": "Success"}},
        "Shipment": {
            "Service": {"Code": "002", "Description": "2ND DAY AIR"},
            "Package": {
                "Activity": {
                    "ActivityLocation": {
                        "Address": {"City": "ANYTOWN", "StateProvinceCode": "GA", "CountryCode": "US"},
                        "Description": "BACK DOOR"
                    },
                    "Status": {"Type": "D", "Code": "FS", "Description": "DELIVERED"},
                    "Date": "20100619",
                    "Time": "091500"
                }
            }
        }
    }
}"#;

/// UPS: fault for an unknown number
pub const UPS_NO_INFORMATION: &str = r#"{
    "Fault": {
        "faultcode": "Client",
        "faultstring": "An exception has been raised as a result of client data.",
        "detail": {"Errors": {"ErrorDetail": {
            "Severity": "Hard",
            "PrimaryErrorCode": {"Code": "151044", "Description": "No tracking information available"}
        }}}
    }
}"#;

/// FedEx: in transit with two scans
pub const FEDEX_IN_TRANSIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Header/>
  <SOAP-ENV:Body>
    <v5:TrackReply xmlns:v5="http://fedex.com/ws/track/v5">
      <v5:HighestSeverity>SUCCESS</v5:HighestSeverity>
      <v5:TrackDetails>
        <v5:StatusCode>IT</v5:StatusCode>
        <v5:StatusDescription>In transit</v5:StatusDescription>
        <v5:ServiceType>FEDEX_GROUND</v5:ServiceType>
        <v5:Events>
          <v5:Timestamp>2014-01-08T08:21:00-05:00</v5:Timestamp>
          <v5:EventDescription>Departed FedEx location</v5:EventDescription>
          <v5:Address><v5:City>MEMPHIS</v5:City><v5:StateOrProvinceCode>TN</v5:StateOrProvinceCode><v5:CountryCode>US</v5:CountryCode></v5:Address>
        </v5:Events>
        <v5:Events>
          <v5:Timestamp>2014-01-07T18:02:00-05:00</v5:Timestamp>
          <v5:EventDescription>Picked up</v5:EventDescription>
        </v5:Events>
      </v5:TrackDetails>
    </v5:TrackReply>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

/// USPS: in transit
pub const USPS_IN_TRANSIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrackResponse>
  <TrackInfo ID="9205596900128506211821">
    <TrackSummary>
      <EventTime>8:12 am</EventTime>
      <EventDate>June 20, 2010</EventDate>
      <Event>Arrival at Unit</Event>
      <EventCity>NEWTON</EventCity>
      <EventState>IA</EventState>
      <EventCountry/>
    </TrackSummary>
    <TrackDetail>
      <EventTime>9:24 pm</EventTime>
      <EventDate>June 19, 2010</EventDate>
      <Event>Processed through Sort Facility</Event>
      <EventCity>DES MOINES</EventCity>
      <EventState>IA</EventState>
      <EventCountry/>
    </TrackDetail>
  </TrackInfo>
</TrackResponse>"#;

/// USPS: system error document
pub const USPS_AUTH_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Number>80040B1A</Number><Description>Authorization failure.</Description><Source>USPSCOM::DoAuth</Source></Error>"#;

/// DHL: delivered
pub const DHL_DELIVERED: &str = r#"{
    "shipments": [{
        "id": "JJD0123456",
        "service": "express",
        "status": {
            "timestamp": "2023-05-04T11:02:00Z",
            "location": {"address": {"addressLocality": "Berlin", "countryCode": "DE"}},
            "statusCode": "delivered",
            "status": "DELIVERED",
            "remark": "Signed for by: MUELLER"
        },
        "events": [
            {"timestamp": "2023-05-04T11:02:00Z", "statusCode": "delivered", "description": "Delivered"},
            {"timestamp": "2023-05-03T07:30:00Z", "statusCode": "transit", "description": "Processed"}
        ]
    }]
}"#;
