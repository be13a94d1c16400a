//! Executes the AMF0 command semantics: `connect`, `createStream`,
//! `publish`, `FCPublish`, `play` and `pause`.

use crate::config::BrokerConfig;
use crate::connection::ConnectionRef;
use crate::errors::BrokerError;
use crate::messages::{PeerBandwidthLimitType, RtmpMessage, UserControlEventType};
use crate::registry::StreamRegistry;
use crate::session::{ReadyOutcome, SessionRole};
use log::{debug, error, info, warn};
use relay_amf0::{Amf0Object, Amf0Value};
use std::sync::Arc;

pub(super) fn handle_command(
    connection: &ConnectionRef,
    registry: &Arc<StreamRegistry>,
    config: &BrokerConfig,
    message: &RtmpMessage,
) -> Result<(), BrokerError> {
    let values = message.payload_to_amf0()?;
    if values.is_empty() {
        return Err(malformed("empty command payload"));
    }

    let command_name = values[0]
        .clone()
        .get_string()
        .ok_or_else(|| malformed("command name is not a string"))?;

    match command_name.as_str() {
        // NetConnection commands
        "connect" => on_connect(connection, config, values),
        "createStream" => on_create_stream(connection, values),
        // NetStream commands
        "publish" => on_publish(connection, values),
        "play" => on_play(connection, registry, values),
        "pause" => on_pause(connection, registry, values),
        // Seen from OBS and similar encoders
        "FCPublish" => on_fc_publish(connection),
        "call" | "close" | "play2" | "deleteStream" | "closeStream" | "receiveAudio"
        | "receiveVideo" | "seek" => Err(BrokerError::Unsupported(command_name)),
        _ => {
            info!("ignoring unrecognized command '{}'", command_name);
            Ok(())
        }
    }
}

/// Attaches the app name and answers with the control triad plus the
/// connect `_result`.  Only the `_result` forces a flush.
fn on_connect(
    connection: &ConnectionRef,
    config: &BrokerConfig,
    values: Vec<Amf0Value>,
) -> Result<(), BrokerError> {
    if values.len() < 3 {
        return Err(malformed("connect expects a transaction id and command object"));
    }

    let transaction_id = values[1]
        .clone()
        .get_number()
        .ok_or_else(|| malformed("connect transaction id is not a number"))?;

    let command_object = values[2]
        .clone()
        .get_object()
        .ok_or_else(|| malformed("connect command object is not an object"))?;

    let app = command_object
        .get("app")
        .cloned()
        .and_then(Amf0Value::get_string)
        .ok_or_else(|| malformed("connect command object carries no app name"))?;

    connection.session().set_app(app);

    connection.write(RtmpMessage::window_acknowledgement_size(
        config.window_ack_size,
    )?);
    connection.write(RtmpMessage::set_peer_bandwidth(
        config.peer_bandwidth,
        PeerBandwidthLimitType::Dynamic,
    )?);
    connection.write(RtmpMessage::set_chunk_size(config.chunk_size)?);

    let mut properties = Amf0Object::new();
    properties.insert(
        "fmsVer",
        Amf0Value::Utf8String(config.fms_version.clone()),
    );
    properties.insert("capabilities", Amf0Value::Number(config.capabilities));

    let mut info = Amf0Object::new();
    info.insert("level", Amf0Value::Utf8String("status".to_string()));
    info.insert(
        "code",
        Amf0Value::Utf8String("NetConnection.Connect.Success".to_string()),
    );
    info.insert(
        "description",
        Amf0Value::Utf8String("Connection succeeded.".to_string()),
    );
    info.insert("objectEncoding", Amf0Value::Number(0.0));

    let result = RtmpMessage::amf0_command(
        "_result",
        transaction_id,
        Amf0Value::Object(properties),
        vec![Amf0Value::Object(info)],
    )?;
    connection.write_and_flush(result)?;

    Ok(())
}

fn on_create_stream(connection: &ConnectionRef, values: Vec<Amf0Value>) -> Result<(), BrokerError> {
    if values.len() < 2 {
        return Err(malformed("createStream expects a transaction id"));
    }

    let transaction_id = values[1]
        .clone()
        .get_number()
        .ok_or_else(|| malformed("createStream transaction id is not a number"))?;

    // Every connection carries exactly one media stream, so the stream id
    // handed back is always 1.
    let result = RtmpMessage::amf0_command(
        "_result",
        transaction_id,
        Amf0Value::Null,
        vec![Amf0Value::Number(1.0)],
    )?;
    connection.write_and_flush(result)?;

    Ok(())
}

fn on_publish(connection: &ConnectionRef, values: Vec<Amf0Value>) -> Result<(), BrokerError> {
    let stream_name = stream_name_argument(&values, "publish")?;

    let session = connection.session();
    session.assign_role(SessionRole::Publisher);
    session.set_stream_name(stream_name);

    let on_status = RtmpMessage::amf0_command(
        "onStatus",
        0.0,
        Amf0Value::Null,
        vec![status_info("NetStream.Play.Start", "Start publishing")],
    )?;
    connection.write_and_flush(on_status)?;

    Ok(())
}

fn on_fc_publish(connection: &ConnectionRef) -> Result<(), BrokerError> {
    let response = RtmpMessage::amf0_command(
        "onFCPublish",
        0.0,
        Amf0Value::Null,
        vec![status_info("NetStream.Play.Start", "Start publishing")],
    )?;
    connection.write_and_flush(response)?;

    Ok(())
}

fn on_play(
    connection: &ConnectionRef,
    registry: &Arc<StreamRegistry>,
    values: Vec<Amf0Value>,
) -> Result<(), BrokerError> {
    let stream_name = stream_name_argument(&values, "play")?;

    let session = connection.session();
    session.assign_role(SessionRole::Subscriber);
    session.set_stream_name(stream_name);
    let stream_key = session
        .stream_key()
        .ok_or_else(|| malformed("play issued before connect"))?;

    let on_status = RtmpMessage::amf0_command(
        "onStatus",
        0.0,
        Amf0Value::Null,
        vec![status_info("NetStream.Play.Start", "Start publishing")],
    )?;
    connection.write(on_status);

    let sample_access = RtmpMessage::amf0_data(
        &[
            Amf0Value::Utf8String("|RtmpSampleAccess".to_string()),
            Amf0Value::Boolean(true),
            Amf0Value::Boolean(true),
        ],
        1,
    )?;
    connection.write(sample_access);

    let publisher = registry
        .lookup_publisher(&stream_key)
        .ok_or_else(|| BrokerError::PublisherMissing(stream_key.clone()))?;

    let subscriber = Arc::clone(connection);
    let publisher_for_replay = Arc::clone(&publisher);
    let registry_for_replay = Arc::clone(registry);
    publisher.session().when_ready(move |outcome| {
        if subscriber.is_closed() {
            debug!(
                "subscriber {} disconnected while waiting on '{}'",
                subscriber.id(),
                stream_key
            );
            return;
        }

        if outcome != ReadyOutcome::Complete {
            warn!("{}", BrokerError::PublisherFailed(stream_key.clone()));
            return;
        }

        let publisher_session = publisher_for_replay.session();

        // Subscribers always get the onMetaData frame, even when the
        // publisher never announced any metadata.
        let metadata = publisher_session.metadata().unwrap_or(Amf0Value::Null);
        let on_metadata = RtmpMessage::amf0_data(
            &[Amf0Value::Utf8String("onMetaData".to_string()), metadata],
            0,
        );
        match on_metadata {
            Ok(message) => subscriber.write(message),
            Err(error) => {
                error!("failed to encode stream metadata: {}", error);
                subscriber.close();
                return;
            }
        }

        let Some(cached) = publisher_session.key_frame() else {
            warn!("publisher for '{}' completed without a cached key frame", stream_key);
            return;
        };

        let mut replay = cached.copy();
        replay.timestamp = 0;
        match subscriber.write_and_flush(replay) {
            Ok(()) => registry_for_replay.add_subscriber(&stream_key, Arc::clone(&subscriber)),
            Err(error) => {
                error!("key frame write failed: {}", error);
                subscriber.close();
            }
        }
    });

    Ok(())
}

fn on_pause(
    connection: &ConnectionRef,
    registry: &Arc<StreamRegistry>,
    values: Vec<Amf0Value>,
) -> Result<(), BrokerError> {
    if values.len() < 4 {
        return Err(malformed("pause expects a pause flag"));
    }

    let pausing = values[3]
        .clone()
        .get_boolean()
        .ok_or_else(|| malformed("pause flag is not a boolean"))?;

    let session = connection.session();
    let stream_key = session
        .stream_key()
        .ok_or_else(|| malformed("pause issued before play"))?;

    if pausing {
        session.set_paused(true);

        let on_status = RtmpMessage::amf0_command(
            "onStatus",
            0.0,
            Amf0Value::Null,
            vec![status_info("NetStream.Pause.Notify", "Paused live")],
        )?;
        connection.write(on_status);
        connection.write_and_flush(RtmpMessage::user_control(UserControlEventType::StreamEof, 1)?)?;

        return Ok(());
    }

    let on_status = RtmpMessage::amf0_command(
        "onStatus",
        0.0,
        Amf0Value::Null,
        vec![status_info("NetStream.Unpause.Notify", "Unpaused live")],
    )?;
    connection.write(on_status);
    connection.write_and_flush(RtmpMessage::user_control(
        UserControlEventType::StreamBegin,
        1,
    )?)?;

    // A resuming subscriber needs a fresh key frame before its decoder can
    // pick the stream back up; it stays paused until that write lands.
    let publisher = registry
        .lookup_publisher(&stream_key)
        .ok_or_else(|| BrokerError::PublisherMissing(stream_key.clone()))?;

    let subscriber = Arc::clone(connection);
    let publisher_for_replay = Arc::clone(&publisher);
    publisher.session().when_ready(move |outcome| {
        if subscriber.is_closed() {
            return;
        }

        if outcome != ReadyOutcome::Complete {
            warn!("{}", BrokerError::PublisherFailed(stream_key.clone()));
            return;
        }

        let publisher_session = publisher_for_replay.session();

        let metadata = publisher_session.metadata().unwrap_or(Amf0Value::Null);
        let on_metadata = RtmpMessage::amf0_data(
            &[Amf0Value::Utf8String("onMetaData".to_string()), metadata],
            0,
        );
        match on_metadata {
            Ok(message) => subscriber.write(message),
            Err(error) => {
                error!("failed to encode stream metadata: {}", error);
                subscriber.close();
                return;
            }
        }

        let Some(cached) = publisher_session.key_frame() else {
            warn!("publisher for '{}' completed without a cached key frame", stream_key);
            return;
        };

        let mut replay = cached.copy();
        replay.timestamp = 0;
        match subscriber.write_and_flush(replay) {
            Ok(()) => subscriber.session().set_paused(false),
            Err(error) => {
                error!("key frame write failed: {}", error);
                subscriber.close();
            }
        }
    });

    Ok(())
}

/// The stream name sits at index 3, after the command name, transaction id
/// and (null) command object.
fn stream_name_argument(values: &[Amf0Value], command: &str) -> Result<String, BrokerError> {
    if values.len() < 4 {
        return Err(malformed(&format!("{} expects a stream name", command)));
    }

    values[3]
        .clone()
        .get_string()
        .ok_or_else(|| malformed(&format!("{} stream name is not a string", command)))
}

fn status_info(code: &str, description: &str) -> Amf0Value {
    let mut info = Amf0Object::new();
    info.insert("level", Amf0Value::Utf8String("status".to_string()));
    info.insert("code", Amf0Value::Utf8String(code.to_string()));
    info.insert(
        "description",
        Amf0Value::Utf8String(description.to_string()),
    );
    Amf0Value::Object(info)
}

fn malformed(reason: &str) -> BrokerError {
    BrokerError::MalformedCommand(reason.to_string())
}
