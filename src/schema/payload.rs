use std::any::Any;
use std::fmt::Debug;

use prost::Message;

/// Object-safe view of a wire payload.
///
/// Implemented for every prost message, so catalogs, envelopes and the
/// router can carry heterogeneous payloads as `Box<dyn EventPayload>`.
pub trait EventPayload: Any + Debug + Send + Sync {
    fn encode_payload(&self) -> Result<Vec<u8>, prost::EncodeError>;

    /// Merge encoded bytes into this instance (decode into a fresh template).
    fn merge_payload(&mut self, bytes: &[u8]) -> Result<(), prost::DecodeError>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    /// Rust type name, for error messages and logs.
    fn payload_type(&self) -> &'static str;
}

impl<M> EventPayload for M
where
    M: Message + Default + Debug + 'static,
{
    fn encode_payload(&self) -> Result<Vec<u8>, prost::EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    fn merge_payload(&mut self, bytes: &[u8]) -> Result<(), prost::DecodeError> {
        self.merge(bytes)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }

    fn payload_type(&self) -> &'static str {
        std::any::type_name::<M>()
    }
}
