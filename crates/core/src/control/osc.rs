//! OSC wire handling for the looper's control channel.

use std::collections::HashMap;

use rosc::{OscMessage, OscPacket, OscType};
use thiserror::Error;

use crate::messages::{ControllerEvent, Notification};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("failed to decode OSC packet: {0}")]
    Decode(String),

    #[error("failed to encode OSC packet: {0}")]
    Encode(String),

    #[error("address {0} is outside the control prefix")]
    ForeignAddress(String),

    #[error("no handler for control message '{0}'")]
    UnknownMessage(String),

    #[error("bad arguments for '{name}': {reason}")]
    BadArguments { name: String, reason: String },
}

type Handler = fn(&str, &[OscType]) -> Result<ControllerEvent, ControlError>;

fn bad_arguments(name: &str, reason: impl Into<String>) -> ControlError {
    ControlError::BadArguments {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn on_spice(name: &str, args: &[OscType]) -> Result<ControllerEvent, ControlError> {
    let level = match args.first() {
        Some(OscType::Float(value)) => *value,
        Some(OscType::Double(value)) => *value as f32,
        Some(OscType::Int(value)) => *value as f32,
        Some(OscType::Long(value)) => *value as f32,
        Some(other) => return Err(bad_arguments(name, format!("expected a number, got {:?}", other))),
        None => return Err(bad_arguments(name, "missing level")),
    };
    Ok(ControllerEvent::SpiceChanged(level))
}

fn on_regenerate(_name: &str, _args: &[OscType]) -> Result<ControllerEvent, ControlError> {
    Ok(ControllerEvent::RegenerateRequested { track: None })
}

fn on_track_cleared(_name: &str, _args: &[OscType]) -> Result<ControllerEvent, ControlError> {
    Ok(ControllerEvent::TrackCleared)
}

/// Inbound control messages keyed by name below the address prefix.
pub struct ControlDispatchTable {
    prefix: String,
    handlers: HashMap<&'static str, Handler>,
}

impl ControlDispatchTable {
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();
        handlers.insert("spice", on_spice);
        handlers.insert("regenerate", on_regenerate);
        handlers.insert("track_cleared", on_track_cleared);

        Self { prefix, handlers }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dispatch(&self, message: &OscMessage) -> Result<ControllerEvent, ControlError> {
        let name = message
            .addr
            .strip_prefix(&self.prefix)
            .ok_or_else(|| ControlError::ForeignAddress(message.addr.clone()))?;

        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ControlError::UnknownMessage(name.to_string()))?;

        handler(name, &message.args)
    }

    /// Decode a datagram into controller events.
    ///
    /// Bundles are flattened. Messages that fail to dispatch are logged and
    /// skipped, so one bad message never hides the rest of a bundle.
    pub fn decode_packet(&self, datagram: &[u8]) -> Result<Vec<ControllerEvent>, ControlError> {
        let (_, packet) =
            rosc::decoder::decode_udp(datagram).map_err(|e| ControlError::Decode(format!("{:?}", e)))?;

        let mut messages = Vec::new();
        flatten(packet, &mut messages);

        let mut events = Vec::with_capacity(messages.len());
        for message in &messages {
            match self.dispatch(message) {
                Ok(event) => events.push(event),
                Err(e) => log::warn!("Ignoring OSC message {}: {}", message.addr, e),
            }
        }
        Ok(events)
    }
}

fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(message) => out.push(message),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                flatten(inner, out);
            }
        }
    }
}

/// Outbound notification as an OSC message under `prefix`.
pub fn notification_message(prefix: &str, notification: &Notification) -> OscMessage {
    let separator = if prefix.ends_with('/') { "" } else { "/" };
    let args = match notification {
        Notification::Progress(text) | Notification::Error(text) => vec![OscType::String(text.clone())],
        Notification::VariationsReady(count) => {
            vec![OscType::Int(i32::try_from(*count).unwrap_or(i32::MAX))]
        }
    };

    OscMessage {
        addr: format!("{}{}{}", prefix, separator, notification.name()),
        args,
    }
}

pub fn encode_notification(prefix: &str, notification: &Notification) -> Result<Vec<u8>, ControlError> {
    let packet = OscPacket::Message(notification_message(prefix, notification));
    rosc::encoder::encode(&packet).map_err(|e| ControlError::Encode(format!("{:?}", e)))
}
