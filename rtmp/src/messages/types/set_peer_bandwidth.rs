use crate::messages::{MessageSerializationError, PeerBandwidthLimitType};
use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use std::io::Cursor;

pub fn serialize(
    size: u32,
    limit_type: PeerBandwidthLimitType,
) -> Result<Bytes, MessageSerializationError> {
    let limit_type_id = match limit_type {
        PeerBandwidthLimitType::Hard => 0,
        PeerBandwidthLimitType::Soft => 1,
        PeerBandwidthLimitType::Dynamic => 2,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(5));
    cursor.write_u32::<BigEndian>(size)?;
    cursor.write_u8(limit_type_id)?;

    Ok(Bytes::from(cursor.into_inner()))
}
