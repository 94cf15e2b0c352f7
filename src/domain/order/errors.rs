// ============================================================================
// Order Errors
// ============================================================================
//
// DecodeError: the payload is not a well-formed order document.
// ValidationError: the document decoded, but breaks an acceptance rule.
//
// Neither is fatal to the ingestion pipeline.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("order_uid is required")]
    MissingOrderUid,

    #[error("track_number is required")]
    MissingTrackNumber,

    #[error("delivery.name is required")]
    MissingDeliveryName,

    #[error("items cannot be empty")]
    EmptyItems,
}

impl ValidationError {
    /// Wire name of the field that failed validation
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingOrderUid => "order_uid",
            ValidationError::MissingTrackNumber => "track_number",
            ValidationError::MissingDeliveryName => "delivery.name",
            ValidationError::EmptyItems => "items",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed order payload at line {line}, column {column}: {source}")]
pub struct DecodeError {
    pub line: usize,
    pub column: usize,
    #[source]
    pub source: serde_json::Error,
}

impl From<serde_json::Error> for DecodeError {
    fn from(source: serde_json::Error) -> Self {
        Self {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}
