use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, ProfileId, ProviderId, ShipmentId};
use serde::{Deserialize, Serialize};

use crate::error::StatusParseError;

/// The status of a shipment.
///
/// Transitions: `preparing → in_transit → {delivered, failed}`. Shipments
/// are created already `in_transit`; `failed` is reserved data for a future
/// logistics webhook and no core operation drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Preparing,
    InTransit,
    Delivered,
    Failed,
}

impl ShipmentStatus {
    /// Returns true if the buyer may confirm delivery of this shipment.
    pub fn can_mark_delivered(&self) -> bool {
        matches!(self, ShipmentStatus::InTransit)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Failed)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Preparing => "preparing",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preparing" => Ok(ShipmentStatus::Preparing),
            "in_transit" => Ok(ShipmentStatus::InTransit),
            "delivered" => Ok(ShipmentStatus::Delivered),
            "failed" => Ok(ShipmentStatus::Failed),
            other => Err(StatusParseError::new("shipment", other)),
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A logistics provider a seller can hand shipments to. Reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsProvider {
    pub id: ProviderId,
    pub name: String,
    /// Prefix a tracking number is appended to, e.g. `https://tracker.example/?tn=`.
    pub tracking_url_template: String,
    pub is_active: bool,
}

impl LogisticsProvider {
    /// Renders the tracking URL for a tracking number, when both the
    /// template and the number are non-empty.
    pub fn tracking_url(&self, tracking_number: &str) -> Option<String> {
        if self.tracking_url_template.is_empty() || tracking_number.is_empty() {
            None
        } else {
            Some(format!("{}{}", self.tracking_url_template, tracking_number))
        }
    }
}

/// Fields required to register a logistics provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProvider {
    pub name: String,
    pub tracking_url_template: String,
    pub is_active: bool,
}

/// A seller-owned grouping of order items handed to a logistics provider.
///
/// Items reference their shipment rather than the other way round; an item
/// joins at most one shipment, ever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub seller_profile: ProfileId,
    pub logistics_provider: Option<ProviderId>,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
}

/// A seller's request to ship a subset of an order's items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShipment {
    pub order_id: OrderId,
    pub order_item_ids: Vec<OrderItemId>,
    pub logistics_provider_id: ProviderId,
    pub tracking_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_in_transit_can_be_delivered() {
        assert!(ShipmentStatus::InTransit.can_mark_delivered());
        assert!(!ShipmentStatus::Preparing.can_mark_delivered());
        assert!(!ShipmentStatus::Delivered.can_mark_delivered());
        assert!(!ShipmentStatus::Failed.can_mark_delivered());
    }

    #[test]
    fn test_delivered_and_failed_are_terminal() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Failed.is_terminal());
        assert!(!ShipmentStatus::InTransit.is_terminal());
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            ShipmentStatus::Preparing,
            ShipmentStatus::InTransit,
            ShipmentStatus::Delivered,
            ShipmentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ShipmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_tracking_url_requires_template_and_number() {
        let provider = LogisticsProvider {
            id: ProviderId::new(),
            name: "Acme Freight".to_string(),
            tracking_url_template: "https://tracker.example/?tn=".to_string(),
            is_active: true,
        };
        assert_eq!(
            provider.tracking_url("TRK1").as_deref(),
            Some("https://tracker.example/?tn=TRK1")
        );
        assert_eq!(provider.tracking_url(""), None);

        let bare = LogisticsProvider {
            tracking_url_template: String::new(),
            ..provider
        };
        assert_eq!(bare.tracking_url("TRK1"), None);
    }
}
