//! Message-level RTMP broker.
//!
//! This crate implements the server side of the RTMP command and data
//! protocol after the chunk layer has reassembled whole logical messages: a
//! publisher connection delivers one audio/video stream, and every
//! subscriber connection that plays the same `"{app}/{stream_name}"` key
//! receives a copy of each frame.
//!
//! The transport layer (sockets, handshake, chunk assembly, write queues)
//! stays outside this crate.  It hands inbound messages to a
//! [`handlers::MessageDispatcher`] and exposes each peer through the
//! [`connection::ConnectionHandle`] capability; everything else — AMF0
//! command execution, session state, the publisher/subscriber registry and
//! the key-frame replay handshake — lives here.

pub mod config;
pub mod connection;
pub mod errors;
pub mod handlers;
pub mod messages;
pub mod registry;
pub mod session;

#[cfg(test)]
mod test_utils;
