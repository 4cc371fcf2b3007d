//! Topic names and the inbound topic alias table.

use bytes::Bytes;

use crate::error::{DecodeError, DecodeResult};
use crate::protocol::codec;
use crate::reason::DisconnectReasonCode;
use crate::types::MqttString;

fn topic_invalid(name: &str) -> DecodeError {
    DecodeError::new(DisconnectReasonCode::TopicNameInvalid, format!("malformed {name}"))
}

/// Read a topic name (2-byte length prefix + data).
///
/// Returns `None` for a zero-length name, which PUBLISH allows when a topic
/// alias stands in for it. Truncation is malformed; bad UTF-8, U+0000 and the
/// wildcards `#` and `+` make the topic name invalid.
pub fn read_topic_name(buf: &mut Bytes, name: &str) -> DecodeResult<Option<MqttString>> {
    let raw = codec::read_binary(buf, name)?;
    if raw.is_empty() {
        return Ok(None);
    }
    let topic = std::str::from_utf8(&raw).map_err(|_| topic_invalid(name))?;
    if topic.contains(['\0', '#', '+']) {
        return Err(topic_invalid(name));
    }
    Ok(Some(MqttString::from_validated(topic.to_owned())))
}

/// Inbound topic alias → topic name mapping of one connection.
///
/// Valid aliases are `1..=maximum`, where maximum is the topic alias maximum
/// the client announced in CONNECT.
#[derive(Debug, Clone, Default)]
pub struct TopicAliasTable {
    topics: Vec<Option<MqttString>>,
}

impl TopicAliasTable {
    pub fn new(maximum: u16) -> Self {
        Self {
            topics: vec![None; maximum as usize],
        }
    }

    pub fn maximum(&self) -> u16 {
        self.topics.len() as u16
    }

    /// Whether `alias` is within `1..=maximum`.
    pub fn is_valid(&self, alias: u16) -> bool {
        alias != 0 && alias as usize <= self.topics.len()
    }

    /// Topic currently mapped to `alias`.
    pub fn get(&self, alias: u16) -> Option<&MqttString> {
        if !self.is_valid(alias) {
            return None;
        }
        self.topics[alias as usize - 1].as_ref()
    }

    /// Map `alias` to `topic`, replacing any earlier mapping. Out of range
    /// aliases are ignored and reported as `false`.
    pub fn set(&mut self, alias: u16, topic: MqttString) -> bool {
        if !self.is_valid(alias) {
            return false;
        }
        self.topics[alias as usize - 1] = Some(topic);
        true
    }

    /// Forget every mapping; aliases do not survive a reconnect.
    pub fn clear(&mut self) {
        self.topics.iter_mut().for_each(|t| *t = None);
    }
}
