mod deserialization_errors;
mod serialization_errors;
mod types;

pub use self::deserialization_errors::MessageDeserializationError;
pub use self::serialization_errors::MessageSerializationError;

use bytes::Bytes;
use relay_amf0::Amf0Value;
use std::io::Cursor;

/// The logical RTMP message types the broker consumes or emits, with their
/// standard numeric codes
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RtmpMessageType {
    SetChunkSize,
    Abort,
    Acknowledgement,
    UserControl,
    WindowAcknowledgementSize,
    SetPeerBandwidth,
    AudioData,
    VideoData,
    Amf0Data,
    Amf0Command,
}

impl RtmpMessageType {
    pub fn type_id(&self) -> u8 {
        match *self {
            RtmpMessageType::SetChunkSize => 1,
            RtmpMessageType::Abort => 2,
            RtmpMessageType::Acknowledgement => 3,
            RtmpMessageType::UserControl => 4,
            RtmpMessageType::WindowAcknowledgementSize => 5,
            RtmpMessageType::SetPeerBandwidth => 6,
            RtmpMessageType::AudioData => 8,
            RtmpMessageType::VideoData => 9,
            RtmpMessageType::Amf0Data => 18,
            RtmpMessageType::Amf0Command => 20,
        }
    }

    pub fn from_type_id(type_id: u8) -> Option<RtmpMessageType> {
        match type_id {
            1 => Some(RtmpMessageType::SetChunkSize),
            2 => Some(RtmpMessageType::Abort),
            3 => Some(RtmpMessageType::Acknowledgement),
            4 => Some(RtmpMessageType::UserControl),
            5 => Some(RtmpMessageType::WindowAcknowledgementSize),
            6 => Some(RtmpMessageType::SetPeerBandwidth),
            8 => Some(RtmpMessageType::AudioData),
            9 => Some(RtmpMessageType::VideoData),
            18 => Some(RtmpMessageType::Amf0Data),
            20 => Some(RtmpMessageType::Amf0Command),
            _ => None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PeerBandwidthLimitType {
    Hard,
    Soft,
    Dynamic,
}

/// User control events the broker emits around pause handling
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum UserControlEventType {
    StreamBegin,
    StreamEof,
}

/// A whole RTMP message as assembled by the chunk layer.
///
/// The payload is a refcounted byte buffer: [`retain`](RtmpMessage::retain)
/// hands out another handle onto the same storage for fan-out, while
/// [`copy`](RtmpMessage::copy) deep-copies it for caching independent of
/// the connection the bytes arrived on.
#[derive(PartialEq, Debug, Clone)]
pub struct RtmpMessage {
    pub message_type: RtmpMessageType,
    pub timestamp: u32,
    pub stream_id: u32,
    pub payload: Bytes,
}

impl RtmpMessage {
    pub fn new(
        message_type: RtmpMessageType,
        timestamp: u32,
        stream_id: u32,
        payload: Bytes,
    ) -> RtmpMessage {
        RtmpMessage {
            message_type,
            timestamp,
            stream_id,
            payload,
        }
    }

    /// Another handle onto the same payload storage (refcount increment).
    pub fn retain(&self) -> RtmpMessage {
        RtmpMessage {
            message_type: self.message_type,
            timestamp: self.timestamp,
            stream_id: self.stream_id,
            payload: self.payload.clone(),
        }
    }

    /// A new message with an independent copy of the payload bytes.
    pub fn copy(&self) -> RtmpMessage {
        RtmpMessage {
            message_type: self.message_type,
            timestamp: self.timestamp,
            stream_id: self.stream_id,
            payload: Bytes::copy_from_slice(&self.payload),
        }
    }

    /// True for video payloads whose frame-type nibble marks an intra-coded
    /// frame
    pub fn is_key_frame(&self) -> bool {
        self.message_type == RtmpMessageType::VideoData
            && self.payload.first().map(|byte| byte >> 4) == Some(1)
    }

    /// Decodes the payload as a sequence of AMF0 values
    pub fn payload_to_amf0(&self) -> Result<Vec<Amf0Value>, MessageDeserializationError> {
        let mut cursor = Cursor::new(self.payload.as_ref());
        let values = relay_amf0::deserialize(&mut cursor)?;
        Ok(values)
    }

    pub fn window_acknowledgement_size(
        size: u32,
    ) -> Result<RtmpMessage, MessageSerializationError> {
        let payload = types::window_acknowledgement_size::serialize(size)?;
        Ok(RtmpMessage::new(
            RtmpMessageType::WindowAcknowledgementSize,
            0,
            0,
            payload,
        ))
    }

    pub fn set_peer_bandwidth(
        size: u32,
        limit_type: PeerBandwidthLimitType,
    ) -> Result<RtmpMessage, MessageSerializationError> {
        let payload = types::set_peer_bandwidth::serialize(size, limit_type)?;
        Ok(RtmpMessage::new(
            RtmpMessageType::SetPeerBandwidth,
            0,
            0,
            payload,
        ))
    }

    pub fn set_chunk_size(size: u32) -> Result<RtmpMessage, MessageSerializationError> {
        let payload = types::set_chunk_size::serialize(size)?;
        Ok(RtmpMessage::new(RtmpMessageType::SetChunkSize, 0, 0, payload))
    }

    pub fn user_control(
        event_type: UserControlEventType,
        stream_id: u32,
    ) -> Result<RtmpMessage, MessageSerializationError> {
        let payload = types::user_control::serialize(event_type, stream_id)?;
        Ok(RtmpMessage::new(RtmpMessageType::UserControl, 0, 0, payload))
    }

    pub fn amf0_command(
        command_name: &str,
        transaction_id: f64,
        command_object: Amf0Value,
        additional_arguments: Vec<Amf0Value>,
    ) -> Result<RtmpMessage, MessageSerializationError> {
        let payload = types::amf0_command::serialize(
            command_name,
            transaction_id,
            command_object,
            additional_arguments,
        )?;
        Ok(RtmpMessage::new(RtmpMessageType::Amf0Command, 0, 0, payload))
    }

    pub fn amf0_data(
        values: &[Amf0Value],
        stream_id: u32,
    ) -> Result<RtmpMessage, MessageSerializationError> {
        let payload = types::amf0_data::serialize(values)?;
        Ok(RtmpMessage::new(
            RtmpMessageType::Amf0Data,
            0,
            stream_id,
            payload,
        ))
    }
}
