use serde::{Deserialize, Deserializer};

use super::aggregate::Order;
use super::errors::DecodeError;

// ============================================================================
// Wire Codec
// ============================================================================
//
// Inbound messages are JSON documents using the field names declared on the
// model types (order_uid, track_number, delivery{...}, payment{...},
// items[...], ...). Unknown fields are ignored; missing or null ones default.
//
// ============================================================================

/// Decode a raw message payload into an Order
pub fn decode(raw: &[u8]) -> Result<Order, DecodeError> {
    Ok(serde_json::from_slice(raw)?)
}

/// Encode an Order into its wire representation
pub fn encode(order: &Order) -> Result<Vec<u8>, DecodeError> {
    Ok(serde_json::to_vec(order)?)
}

/// Field deserializer that reads an explicit `null` as the type's zero value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
