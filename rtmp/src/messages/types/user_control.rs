use crate::messages::{MessageSerializationError, UserControlEventType};
use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use std::io::Cursor;

pub fn serialize(
    event_type: UserControlEventType,
    stream_id: u32,
) -> Result<Bytes, MessageSerializationError> {
    let event_id: u16 = match event_type {
        UserControlEventType::StreamBegin => 0,
        UserControlEventType::StreamEof => 1,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(6));
    cursor.write_u16::<BigEndian>(event_id)?;
    cursor.write_u32::<BigEndian>(stream_id)?;

    Ok(Bytes::from(cursor.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::serialize;
    use crate::messages::UserControlEventType;

    #[test]
    fn serializes_stream_begin_event() {
        let result = serialize(UserControlEventType::StreamBegin, 1).unwrap();

        assert_eq!(result.as_ref(), &[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn serializes_stream_eof_event() {
        let result = serialize(UserControlEventType::StreamEof, 1).unwrap();

        assert_eq!(result.as_ref(), &[0x00, 0x01, 0x00, 0x00, 0x00, 0x01]);
    }
}
