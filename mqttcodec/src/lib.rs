//! Client-side MQTT 3.1.1 / 5.0 packet decoder.
//!
//! Turns the inbound byte stream of one client connection into validated
//! control packets:
//!
//! - **Framing**: remaining-length parsing and incremental assembly. Partial
//!   input is never consumed.
//! - **Validation**: every field, property and cross-field rule is checked
//!   before a packet is produced.
//! - **Faults**: a rejected packet yields the DISCONNECT (reason code and
//!   optional reason string) to send, and ends decoding on the connection.
//!
//! ## Components
//!
//! - [`Decoder`]: per-connection driver, synchronous and runtime independent
//! - [`read_packet`]: tokio adapter reading one packet from an `AsyncRead`
//! - [`DecoderConfig`]: what the client negotiated in its CONNECT
//!
//! ## Example
//!
//! ```no_run
//! use giztoy_mqttcodec::{read_packet, Decoder, DecoderConfig, Error, Packet, ProtocolVersion};
//! use bytes::BytesMut;
//! use tokio::net::TcpStream;
//!
//! #[tokio::main]
//! async fn main() -> giztoy_mqttcodec::Result<()> {
//!     let mut stream = TcpStream::connect("127.0.0.1:1883").await?;
//!     // ... send CONNECT ...
//!
//!     let config = DecoderConfig::new(ProtocolVersion::V5).with_topic_alias_maximum(16);
//!     let mut decoder = Decoder::new(config);
//!     let mut buf = BytesMut::new();
//!
//!     loop {
//!         match read_packet(&mut stream, &mut decoder, &mut buf).await {
//!             Ok(Packet::Publish(publish)) => println!("Received on {}", publish.message.topic),
//!             Ok(other) => println!("Received {}", other.packet_type()),
//!             Err(Error::Decode(fault)) => {
//!                 // ... send fault.disconnect, then close ...
//!                 return Err(Error::Decode(fault));
//!             }
//!             Err(e) => return Err(e),
//!         }
//!     }
//! }
//! ```

mod config;
mod decoder;
mod dispatch;
mod error;
mod frame;
mod io;
mod packet;
pub mod protocol;
mod reason;
mod restrictions;
mod topic;
mod types;

pub use config::DecoderConfig;
pub use decoder::{Decoder, DecoderState, Fault, Feed};
pub use dispatch::{DecodeContext, DecodeFn, DispatchError, Dispatcher};
pub use error::{DecodeError, DecodeResult, Error, Result};
pub use frame::{read_fixed_header, split_frame, Frame};
pub use io::read_packet;
pub use packet::{
    Auth, ConnAck, Disconnect, EnhancedAuth, Packet, PubAck, PubComp, PubRec, PubRel, Publish, PublishAck,
    PublishMessage, SubAck, TopicAlias, UnsubAck,
};
pub use reason::{
    AuthReasonCode, ConnAckReasonCode, DisconnectReasonCode, PubAckReasonCode, PubRelReasonCode,
    SubAckReasonCode, UnsubAckReasonCode,
};
pub use restrictions::{ConnAckRestrictions, ConnectRestrictions};
pub use topic::{read_topic_name, TopicAliasTable};
pub use types::{FixedHeader, MqttString, PacketType, PayloadFormat, ProtocolVersion, QoS, UserProperty};

#[cfg(test)]
mod testing;
