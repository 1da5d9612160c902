// ============================================================================
// Schema Layer - Registry-compatible wire format
// ============================================================================
//
// Everything needed to turn a payload into registry-framed bytes and back:
// - EventPayload: object-safe view over prost messages
// - SchemaCatalog: event type -> (schema id, payload factory)
// - SchemaRegistryClient: subject -> latest schema id (startup only)
// - Codec: [0x00][schema id u32 BE][payload]
//
// ============================================================================

pub mod payload;
pub mod catalog;
pub mod registry;
pub mod codec;
pub mod errors;

pub use payload::EventPayload;
pub use catalog::{LiveSchemaCatalog, SchemaBinding, SchemaCatalog, SchemaInfo, StaticSchemaCatalog};
pub use registry::{HttpSchemaRegistry, SchemaRegistryClient};
pub use codec::{frame, parse_header, Codec, HEADER_LEN, MAGIC_BYTE};
pub use errors::{CatalogError, CodecError, RegistryError};
