use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec::null_as_default;
use super::errors::ValidationError;
use super::value_objects::{Delivery, Item, Payment};

// ============================================================================
// Order Aggregate
// ============================================================================
//
// Root of the aggregate: the order itself plus its delivery, payment and
// items. `order_uid` is the only key used for persistence and caching.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Order {
    #[serde(deserialize_with = "null_as_default")]
    pub order_uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub track_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub entry: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery: Delivery,
    #[serde(deserialize_with = "null_as_default")]
    pub payment: Payment,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<Item>,
    #[serde(deserialize_with = "null_as_default")]
    pub locale: String,
    #[serde(deserialize_with = "null_as_default")]
    pub internal_signature: String,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_service: String,
    #[serde(deserialize_with = "null_as_default")]
    pub shardkey: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sm_id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub date_created: DateTime<Utc>,
    #[serde(deserialize_with = "null_as_default")]
    pub oof_shard: String,
}

impl Order {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self)
    }
}

/// Decide whether an order is acceptable for ingestion.
///
/// Checks run in a fixed order and stop at the first violation:
/// order_uid, track_number, delivery.name, items.
pub fn validate(order: &Order) -> Result<(), ValidationError> {
    if order.order_uid.is_empty() {
        return Err(ValidationError::MissingOrderUid);
    }
    if order.track_number.is_empty() {
        return Err(ValidationError::MissingTrackNumber);
    }
    if order.delivery.name.is_empty() {
        return Err(ValidationError::MissingDeliveryName);
    }
    if order.items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed() -> Order {
        Order {
            order_uid: "test123".to_string(),
            track_number: "TRACK123".to_string(),
            delivery: Delivery {
                name: "Test User".to_string(),
                ..Default::default()
            },
            items: vec![Item {
                name: "Test Item".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_well_formed_order_passes() {
        assert_eq!(validate(&well_formed()), Ok(()));
        assert!(well_formed().validate().is_ok());
    }

    #[test]
    fn test_empty_order_fails_on_order_uid_first() {
        assert_eq!(validate(&Order::default()), Err(ValidationError::MissingOrderUid));
    }

    #[test]
    fn test_missing_order_uid() {
        let order = Order { order_uid: String::new(), ..well_formed() };
        assert_eq!(validate(&order), Err(ValidationError::MissingOrderUid));
    }

    #[test]
    fn test_missing_track_number() {
        let order = Order { track_number: String::new(), ..well_formed() };
        assert_eq!(validate(&order), Err(ValidationError::MissingTrackNumber));
    }

    #[test]
    fn test_missing_delivery_name() {
        let order = Order { delivery: Delivery::default(), ..well_formed() };
        assert_eq!(validate(&order), Err(ValidationError::MissingDeliveryName));
    }

    #[test]
    fn test_empty_items() {
        let order = Order { items: vec![], ..well_formed() };
        let err = validate(&order).unwrap_err();
        assert_eq!(err, ValidationError::EmptyItems);
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_whitespace_only_fields_are_not_empty() {
        let order = Order {
            order_uid: " ".to_string(),
            track_number: " ".to_string(),
            delivery: Delivery { name: "\t".to_string(), ..Default::default() },
            ..well_formed()
        };
        assert_eq!(validate(&order), Ok(()));
    }

    #[test]
    fn test_checks_are_ordered() {
        // Both track_number and items are missing; track_number is reported.
        let order = Order {
            track_number: String::new(),
            items: vec![],
            ..well_formed()
        };
        assert_eq!(validate(&order), Err(ValidationError::MissingTrackNumber));
    }
}
