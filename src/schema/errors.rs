// ============================================================================
// Schema Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("schema not found for event type: {event_type}")]
    SchemaNotFound {
        event_type: String,
        #[source]
        source: CatalogError,
    },

    #[error("invalid payload for event type {event_type}: expected {expected}, got {actual}")]
    InvalidPayload {
        event_type: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("failed to encode {event_type}: {source}")]
    Encoding {
        event_type: String,
        #[source]
        source: prost::EncodeError,
    },

    #[error("failed to decode {event_type}: {source}")]
    Decoding {
        event_type: String,
        #[source]
        source: prost::DecodeError,
    },

    #[error("message too short: {len} bytes, need at least 5")]
    TooShort { len: usize },

    #[error("invalid magic byte: 0x{0:02x}")]
    BadMagicByte(u8),

    #[error("schema ID mismatch for {event_type}: expected {expected}, got {actual}")]
    SchemaMismatch {
        event_type: String,
        expected: u32,
        actual: u32,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("schema not found for event type: {0}")]
    SchemaNotFound(String),

    #[error("no template registered for event type: {0}")]
    NoTemplateRegistered(String),

    #[error("no registry subject configured for event type: {0}")]
    NoSubject(String),

    #[error("schema registry unavailable for subject {subject}: {source}")]
    RegistryUnavailable {
        subject: String,
        #[source]
        source: RegistryError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid registry url: {0}")]
    InvalidUrl(String),

    #[error("subject not found: {0}")]
    SubjectNotFound(String),

    #[error("registry returned status {status} for subject {subject}")]
    Status { subject: String, status: u16 },
}
