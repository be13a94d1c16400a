mod command;
mod data;

use crate::config::BrokerConfig;
use crate::connection::ConnectionRef;
use crate::messages::{RtmpMessage, RtmpMessageType};
use crate::registry::StreamRegistry;
use crate::session::SessionRole;
use log::{debug, error, info};
use std::sync::Arc;

/// Routes inbound messages to the command and data handlers and owns the
/// uniform failure policy: any handler error closes the connection.
pub struct MessageDispatcher {
    registry: Arc<StreamRegistry>,
    config: BrokerConfig,
}

impl MessageDispatcher {
    pub fn new(registry: Arc<StreamRegistry>, config: BrokerConfig) -> MessageDispatcher {
        MessageDispatcher { registry, config }
    }

    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Entry point for every logical message the transport assembles on a
    /// connection.  Messages from one connection must arrive in order and
    /// never concurrently with themselves.
    pub fn on_message(&self, connection: &ConnectionRef, message: RtmpMessage) {
        let result = match message.message_type {
            RtmpMessageType::Amf0Command => {
                command::handle_command(connection, &self.registry, &self.config, &message)
            }
            RtmpMessageType::Amf0Data => data::handle_amf0_data(connection, &message),
            RtmpMessageType::AudioData => {
                data::handle_audio_data(connection, &self.registry, message)
            }
            RtmpMessageType::VideoData => {
                data::handle_video_data(connection, &self.registry, message)
            }
            // Nothing to act on, but receipt keeps the peer happy.
            RtmpMessageType::UserControl => Ok(()),
            other => {
                debug!("ignoring inbound {:?} message", other);
                Ok(())
            }
        };

        if let Err(error) = result {
            error!("closing connection {}: {}", connection.id(), error);
            connection.close();
        }
    }

    /// Transport hook invoked once per connection when it goes away.
    pub fn on_connection_closed(&self, connection: &ConnectionRef) {
        let session = connection.session();
        let stream_key = match session.stream_key() {
            Some(stream_key) => stream_key,
            None => return,
        };

        match session.role() {
            SessionRole::Publisher => {
                info!("publisher for '{}' disconnected", stream_key);
                self.registry.remove_publisher(&stream_key, connection);

                // Subscribers still waiting on the first key frame would
                // otherwise wait forever.
                session.fail_readiness();
            }
            SessionRole::Subscriber => {
                self.registry.remove_subscriber(&stream_key, connection);
            }
            SessionRole::Unassigned => {}
        }
    }
}
