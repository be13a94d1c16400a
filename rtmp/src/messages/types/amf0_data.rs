use crate::messages::MessageSerializationError;
use bytes::Bytes;
use relay_amf0::Amf0Value;

pub fn serialize(values: &[Amf0Value]) -> Result<Bytes, MessageSerializationError> {
    let bytes = relay_amf0::serialize(values)?;

    Ok(Bytes::from(bytes))
}
