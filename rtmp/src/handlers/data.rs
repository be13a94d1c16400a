//! Publisher-side ingress: metadata capture and audio/video fan-out.

use crate::connection::ConnectionRef;
use crate::errors::BrokerError;
use crate::messages::RtmpMessage;
use crate::registry::StreamRegistry;
use log::warn;
use relay_amf0::Amf0Value;
use std::sync::Arc;

/// Captures the stream metadata a publisher announces before its media.
pub(super) fn handle_amf0_data(
    connection: &ConnectionRef,
    message: &RtmpMessage,
) -> Result<(), BrokerError> {
    let values = message.payload_to_amf0()?;
    if values.is_empty() {
        return Err(BrokerError::MalformedCommand(
            "empty data payload".to_string(),
        ));
    }

    // OBS prefixes the sequence with "@setDataFrame" while nginx-rtmp sends
    // "onMetaData" first; the value following the first "onMetaData" string
    // is the metadata either way.
    let marker_position = values
        .iter()
        .position(|value| matches!(value, Amf0Value::Utf8String(text) if text == "onMetaData"));

    if let Some(index) = marker_position {
        let metadata = values.into_iter().nth(index + 1).ok_or_else(|| {
            BrokerError::MalformedCommand("onMetaData carries no metadata value".to_string())
        })?;
        connection.session().set_metadata(metadata);
    }

    Ok(())
}

/// Audio frames are forwarded as-is; decoders join from the video key frame
/// and pick audio up mid-stream.
pub(super) fn handle_audio_data(
    connection: &ConnectionRef,
    registry: &Arc<StreamRegistry>,
    message: RtmpMessage,
) -> Result<(), BrokerError> {
    let stream_key = ingress_stream_key(connection)?;
    fan_out(registry, &stream_key, message);

    Ok(())
}

/// The first key frame completes the publisher and claims its stream key;
/// everything afterwards fans out to the subscriber group.
pub(super) fn handle_video_data(
    connection: &ConnectionRef,
    registry: &Arc<StreamRegistry>,
    message: RtmpMessage,
) -> Result<(), BrokerError> {
    let session = connection.session();
    let stream_key = ingress_stream_key(connection)?;

    if session.key_frame().is_none() && message.is_key_frame() {
        session.set_key_frame(message.copy());
        registry.register_publisher(&stream_key, Arc::clone(connection))?;
        return Ok(());
    }

    fan_out(registry, &stream_key, message);

    Ok(())
}

fn ingress_stream_key(connection: &ConnectionRef) -> Result<String, BrokerError> {
    connection.session().stream_key().ok_or_else(|| {
        BrokerError::MalformedCommand("media data before publish".to_string())
    })
}

fn fan_out(registry: &StreamRegistry, stream_key: &str, message: RtmpMessage) {
    for subscriber in registry.subscribers_snapshot(stream_key) {
        if subscriber.session().is_paused() {
            continue;
        }

        if let Err(error) = subscriber.write_and_flush(message.retain()) {
            // Backpressure is the transport's concern; it closes the
            // subscriber if the condition persists.
            warn!(
                "dropping frame for subscriber {}: {}",
                subscriber.id(),
                error
            );
        }
    }
}
