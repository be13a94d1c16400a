use crate::messages::MessageSerializationError;
use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use std::io::Cursor;

pub fn serialize(size: u32) -> Result<Bytes, MessageSerializationError> {
    let mut cursor = Cursor::new(Vec::with_capacity(4));
    cursor.write_u32::<BigEndian>(size)?;

    Ok(Bytes::from(cursor.into_inner()))
}
