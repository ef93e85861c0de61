//! Tracking response model
//!
//! [`TrackingInfo`] is what every carrier's response parser produces. Field
//! set is fixed; carriers leave fields they cannot fill as `None`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::traits::CarrierIdentity;

/// Timestamp format used by the `Display` impls
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Status string carriers use for delivered shipments (compared case-insensitively)
const DELIVERED: &str = "DELIVERED";

/// An individual tracking event (a status change)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// When the event happened, in the carrier's local time
    pub date: NaiveDateTime,
    /// `City,State,Country` style location, if reported
    pub location: Option<String>,
    /// Human readable event description
    pub detail: String,
}

impl TrackingEvent {
    pub fn new(date: NaiveDateTime, location: Option<String>, detail: impl Into<String>) -> Self {
        Self {
            date,
            location,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for TrackingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<TrackingEvent(date={:?}, location={:?}, detail={:?})>",
            self.date.format(DATE_FORMAT).to_string(),
            self.location,
            self.detail
        )
    }
}

/// Tracking information returned by a tracking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    /// The carrier tracking number
    pub tracking_number: String,
    /// Carrier that produced this record
    pub carrier: CarrierIdentity,
    /// Last available status
    pub status: String,
    /// Timestamp of the last update
    pub last_update: NaiveDateTime,
    /// Delivery date if delivered, otherwise the carrier's estimate (if any)
    pub delivery_date: Option<NaiveDateTime>,
    /// Location of the last update
    pub location: Option<String>,
    /// Details about the delivery
    pub delivery_detail: Option<String>,
    /// Carrier service description (e.g. "UPS 2ND DAY AIR")
    pub service: Option<String>,
    /// Public tracking page
    pub link: Option<String>,
    /// Event history, in the order the carrier reported it
    pub events: Vec<TrackingEvent>,
}

impl TrackingInfo {
    /// Create a record with no optional fields set and no events
    pub fn new(
        tracking_number: impl Into<String>,
        carrier: CarrierIdentity,
        status: impl Into<String>,
        last_update: NaiveDateTime,
    ) -> Self {
        Self {
            tracking_number: tracking_number.into(),
            carrier,
            status: status.into(),
            last_update,
            delivery_date: None,
            location: None,
            delivery_detail: None,
            service: None,
            link: None,
            events: Vec::new(),
        }
    }

    /// Append an event and return a reference to it
    pub fn add_event(
        &mut self,
        date: NaiveDateTime,
        location: Option<String>,
        detail: impl Into<String>,
    ) -> &TrackingEvent {
        self.events.push(TrackingEvent::new(date, location, detail));
        &self.events[self.events.len() - 1]
    }

    /// The most recent event by date
    pub fn last_event(&self) -> Option<&TrackingEvent> {
        self.events.iter().max_by_key(|event| event.date)
    }

    /// The delivery date, falling back to the most recent event
    pub fn effective_delivery_date(&self) -> Option<NaiveDateTime> {
        self.delivery_date
            .or_else(|| self.last_event().map(|event| event.date))
    }

    /// Whether the carrier reports the shipment as delivered
    pub fn is_delivered(&self) -> bool {
        self.status.eq_ignore_ascii_case(DELIVERED)
    }
}

impl fmt::Display for TrackingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delivery_date = self
            .delivery_date
            .map(|d| d.format(DATE_FORMAT).to_string());

        if self.is_delivered() {
            write!(
                f,
                "<TrackingInfo(service={:?}, num={:?}, delivery_date={:?}, status={:?}, location={:?}, detail={:?})>",
                self.service,
                self.tracking_number,
                delivery_date,
                self.status,
                self.location,
                self.delivery_detail,
            )
        } else {
            write!(
                f,
                "<TrackingInfo(service={:?}, num={:?}, delivery_date={:?}, status={:?}, last_update={:?}, location={:?})>",
                self.service,
                self.tracking_number,
                delivery_date,
                self.status,
                self.last_update.format(DATE_FORMAT).to_string(),
                self.location,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_display_in_transit() {
        let mut info = TrackingInfo::new("1Z9999999999999999", CarrierIdentity::Ups, "IN TRANSIT", at(19, 0));
        info.delivery_date = Some(at(25, 0));
        let s = info.to_string();
        assert!(s.contains("2010-06-19 00:00"));
        assert!(s.contains("2010-06-25 00:00"));
        assert!(s.contains("IN TRANSIT"));
        assert!(s.contains("last_update"));
    }

    #[test]
    fn test_display_delivered_shows_detail() {
        let mut info = TrackingInfo::new("1Z9999999999999999", CarrierIdentity::Ups, "DELIVERED", at(19, 9));
        info.delivery_detail = Some("BACK DOOR".to_string());
        let s = info.to_string();
        assert!(s.contains("BACK DOOR"));
        assert!(!s.contains("last_update"));
        assert!(info.is_delivered());
    }

    #[test]
    fn test_last_event_is_latest_by_date() {
        let mut info = TrackingInfo::new("123", CarrierIdentity::Usps, "Arrival at Unit", at(20, 8));
        info.add_event(at(18, 8), None, "Accepted");
        info.add_event(at(20, 8), Some("NEWTON,IA,US".into()), "Arrival at Unit");
        info.add_event(at(19, 8), None, "Departed");

        let last = info.last_event().unwrap();
        assert_eq!(last.detail, "Arrival at Unit");
        assert_eq!(last.location.as_deref(), Some("NEWTON,IA,US"));
    }

    #[test]
    fn test_effective_delivery_date_falls_back_to_last_event() {
        let mut info = TrackingInfo::new("123", CarrierIdentity::Fedex, "In transit", at(20, 8));
        assert_eq!(info.effective_delivery_date(), None);

        info.add_event(at(21, 10), None, "On FedEx vehicle for delivery");
        assert_eq!(info.effective_delivery_date(), Some(at(21, 10)));

        info.delivery_date = Some(at(22, 0));
        assert_eq!(info.effective_delivery_date(), Some(at(22, 0)));
    }

    #[test]
    fn test_event_display() {
        let event = TrackingEvent::new(at(18, 14), Some("ANYTOWN,GA,US".into()), "ORIGIN SCAN");
        let s = event.to_string();
        assert!(s.contains("2010-06-18 14:00"));
        assert!(s.contains("ORIGIN SCAN"));
    }
}
