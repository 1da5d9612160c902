use std::sync::Arc;

use super::catalog::{SchemaCatalog, SchemaInfo};
use super::errors::CodecError;
use super::payload::EventPayload;
use crate::events::DomainEvent;

// ============================================================================
// Wire Codec - schema-registry framing
// ============================================================================
//
//   byte 0      : 0x00 (magic)
//   bytes 1..4  : schema id, u32 big-endian
//   bytes 5..   : prost-encoded payload (may be empty)
//
// Deserialization only accepts the id currently bound in the catalog. A
// message written under an older schema id is rejected with SchemaMismatch;
// there is no compatibility resolution.
//
// ============================================================================

pub const MAGIC_BYTE: u8 = 0x00;
pub const HEADER_LEN: usize = 5;

/// Prefix `payload` with the magic byte and the big-endian schema id.
pub fn frame(schema_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(MAGIC_BYTE);
    buf.extend_from_slice(&schema_id.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Split a wire message into its schema id and payload bytes.
pub fn parse_header(bytes: &[u8]) -> Result<(u32, &[u8]), CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::TooShort { len: bytes.len() });
    }

    if bytes[0] != MAGIC_BYTE {
        return Err(CodecError::BadMagicByte(bytes[0]));
    }

    let schema_id = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    Ok((schema_id, &bytes[HEADER_LEN..]))
}

#[derive(Clone)]
pub struct Codec {
    catalog: Arc<dyn SchemaCatalog>,
}

impl Codec {
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self { catalog }
    }

    fn lookup(&self, event_type: &str) -> Result<SchemaInfo, CodecError> {
        self.catalog
            .get_info(event_type)
            .map_err(|source| CodecError::SchemaNotFound {
                event_type: event_type.to_string(),
                source,
            })
    }

    pub fn serialize(
        &self,
        event_type: &str,
        payload: &dyn EventPayload,
    ) -> Result<Vec<u8>, CodecError> {
        let info = self.lookup(event_type)?;

        if payload.as_any().type_id() != info.template.as_any().type_id() {
            return Err(CodecError::InvalidPayload {
                event_type: event_type.to_string(),
                expected: info.template.payload_type(),
                actual: payload.payload_type(),
            });
        }

        let encoded = payload
            .encode_payload()
            .map_err(|source| CodecError::Encoding {
                event_type: event_type.to_string(),
                source,
            })?;

        Ok(frame(info.schema_id, &encoded))
    }

    pub fn deserialize(
        &self,
        bytes: &[u8],
        event_type: &str,
    ) -> Result<Box<dyn EventPayload>, CodecError> {
        let (schema_id, body) = parse_header(bytes)?;
        let info = self.lookup(event_type)?;

        if schema_id != info.schema_id {
            return Err(CodecError::SchemaMismatch {
                event_type: event_type.to_string(),
                expected: info.schema_id,
                actual: schema_id,
            });
        }

        let mut payload = info.template;
        payload
            .merge_payload(body)
            .map_err(|source| CodecError::Decoding {
                event_type: event_type.to_string(),
                source,
            })?;

        Ok(payload)
    }

    /// Decode straight into a concrete event type.
    pub fn deserialize_as<E: DomainEvent>(&self, bytes: &[u8]) -> Result<E, CodecError> {
        let payload = self.deserialize(bytes, E::event_type())?;
        let actual = payload.payload_type();

        payload
            .into_any()
            .downcast::<E>()
            .map(|event| *event)
            .map_err(|_| CodecError::InvalidPayload {
                event_type: E::event_type().to_string(),
                expected: std::any::type_name::<E>(),
                actual,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::app::{AppInstallEvent, AppUninstallEvent};
    use crate::schema::catalog::StaticSchemaCatalog;

    fn codec() -> Codec {
        let catalog = StaticSchemaCatalog::new()
            .with::<AppInstallEvent>("AppInstallEvent", 7)
            .with::<AppUninstallEvent>("AppUninstallEvent", 8);
        Codec::new(Arc::new(catalog))
    }

    fn install(app_id: &str) -> AppInstallEvent {
        AppInstallEvent {
            app_id: app_id.to_string(),
            channel_id: "channel-456".to_string(),
            manager_id: "manager-789".to_string(),
        }
    }

    #[test]
    fn test_serialize_deserialize_round_trip() {
        let codec = codec();
        let event = install("test-app-123");

        let bytes = codec.serialize("AppInstallEvent", &event).unwrap();
        let decoded = codec.deserialize(&bytes, "AppInstallEvent").unwrap();

        let decoded = decoded.into_any().downcast::<AppInstallEvent>().unwrap();
        assert_eq!(*decoded, event);
    }

    fn round_trip<E: DomainEvent + PartialEq>(codec: &Codec, event: &E) {
        let bytes = codec.serialize(E::event_type(), event).unwrap();
        let decoded = codec.deserialize(&bytes, E::event_type()).unwrap();
        let decoded = decoded.into_any().downcast::<E>().unwrap();
        assert_eq!(&*decoded, event, "{}", E::event_type());
    }

    #[test]
    fn test_round_trip_for_every_registered_type() {
        let codec = codec();

        for event in [
            install("app-1"),
            AppInstallEvent {
                app_id: "app-2".to_string(),
                channel_id: String::new(),
                manager_id: "m-\u{00e9}".to_string(),
            },
            AppInstallEvent::default(),
        ] {
            round_trip(&codec, &event);
        }

        for event in [
            AppUninstallEvent {
                app_id: "app-1".to_string(),
                channel_id: "channel-456".to_string(),
                manager_id: "manager-789".to_string(),
                device_id: "device-001".to_string(),
                uninstalled_at: Some(prost_types::Timestamp {
                    seconds: 1_700_000_000,
                    nanos: 123_456_789,
                }),
                reason: "user request".to_string(),
            },
            AppUninstallEvent {
                app_id: "app-2".to_string(),
                uninstalled_at: Some(prost_types::Timestamp::default()),
                reason: String::new(),
                ..Default::default()
            },
            AppUninstallEvent::default(),
        ] {
            round_trip(&codec, &event);
        }
    }

    #[test]
    fn test_app_install_scenario_with_schema_id_7() {
        let codec = codec();
        let event = AppInstallEvent {
            app_id: "a1".to_string(),
            ..Default::default()
        };

        let mut bytes = codec.serialize("AppInstallEvent", &event).unwrap();
        assert_eq!(&bytes[..5], &[0x00, 0x00, 0x00, 0x00, 0x07]);
        assert_eq!(&bytes[5..], event.encode_payload().unwrap().as_slice());

        let decoded: AppInstallEvent = codec.deserialize_as(&bytes).unwrap();
        assert_eq!(decoded.app_id, "a1");

        bytes[4] = 0x08;
        let err = codec.deserialize(&bytes, "AppInstallEvent").unwrap_err();
        assert!(matches!(
            err,
            CodecError::SchemaMismatch { expected: 7, actual: 8, .. }
        ));
    }

    #[test]
    fn test_empty_payload_is_a_valid_message() {
        let codec = codec();

        let bytes = codec
            .serialize("AppInstallEvent", &AppInstallEvent::default())
            .unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0x00, 0x07]);

        let decoded: AppInstallEvent = codec.deserialize_as(&bytes).unwrap();
        assert_eq!(decoded, AppInstallEvent::default());
    }

    #[test]
    fn test_serialize_unknown_event_type() {
        let err = codec()
            .serialize("UnknownEvent", &install("x"))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::SchemaNotFound { ref event_type, .. } if event_type == "UnknownEvent"
        ));
        assert!(err.to_string().contains("schema not found for event type"));
    }

    #[test]
    fn test_serialize_rejects_payload_of_another_type() {
        let err = codec()
            .serialize("AppUninstallEvent", &install("x"))
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidPayload { .. }));
    }

    #[test]
    fn test_deserialize_too_short() {
        let codec = codec();
        for len in 0..HEADER_LEN {
            let bytes = vec![0u8; len];
            let err = codec.deserialize(&bytes, "AppInstallEvent").unwrap_err();
            assert!(matches!(err, CodecError::TooShort { len: l } if l == len));
        }
    }

    #[test]
    fn test_deserialize_bad_magic_byte() {
        let err = codec()
            .deserialize(&[0x01, 0x00, 0x00, 0x00, 0x07], "AppInstallEvent")
            .unwrap_err();
        assert!(matches!(err, CodecError::BadMagicByte(0x01)));
        assert!(err.to_string().contains("invalid magic byte"));
    }

    #[test]
    fn test_magic_byte_checked_before_catalog_lookup() {
        let err = codec()
            .deserialize(&[0xff, 0x00, 0x00, 0x00, 0x07], "UnknownEvent")
            .unwrap_err();
        assert!(matches!(err, CodecError::BadMagicByte(0xff)));
    }

    #[test]
    fn test_schema_mismatch_independent_of_payload() {
        let codec = codec();
        let body = install("anything").encode_payload().unwrap();

        for wrong_id in [0u32, 1, 6, 8, u32::MAX] {
            let bytes = frame(wrong_id, &body);
            let err = codec.deserialize(&bytes, "AppInstallEvent").unwrap_err();
            assert!(matches!(err, CodecError::SchemaMismatch { expected: 7, .. }));
        }

        let garbage = frame(2, &[0xff, 0xff, 0xff]);
        let err = codec.deserialize(&garbage, "AppInstallEvent").unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { actual: 2, .. }));
    }

    #[test]
    fn test_deserialize_corrupt_payload() {
        // field 1, length-delimited, claims 16 bytes but carries 1
        let bytes = frame(7, &[0x0a, 0x10, 0x61]);
        let err = codec().deserialize(&bytes, "AppInstallEvent").unwrap_err();
        assert!(matches!(err, CodecError::Decoding { .. }));
    }

    #[test]
    fn test_parse_header_reads_big_endian_id() {
        let bytes = frame(0x0102_0304, b"xyz");
        assert_eq!(&bytes[..5], &[0x00, 0x01, 0x02, 0x03, 0x04]);

        let (id, body) = parse_header(&bytes).unwrap();
        assert_eq!(id, 0x0102_0304);
        assert_eq!(body, b"xyz");
    }
}
