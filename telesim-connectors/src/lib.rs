//! Resilient MQTT Publishing for Telesim
//!
//! ## Overview
//!
//! This crate owns the delivery side of the pipeline: a connection/publish
//! state machine ([`Publisher`]) that tolerates broker unavailability,
//! partial handshakes, and transient publish failures without silently
//! losing or duplicating data, layered over a thin transport seam
//! ([`DeliveryChannel`]).
//!
//! ## The seam
//!
//! The actual wire protocol is an external collaborator. Everything the
//! publisher needs from it fits in two small traits:
//!
//! - [`DeliveryChannel`]: open a session, submit one payload, close. A
//!   successful `send` means *accepted for delivery*, never *delivered* —
//!   the transport below is at-least-once once a message is accepted, and
//!   may reorder or duplicate across batches under retry. That is inherent
//!   to QoS 1 and is not fought here.
//! - [`TransportObserver`]: the three asynchronous notifications the
//!   transport pushes back (connect result, disconnect, publish ack). These
//!   are named methods rather than free-floating callbacks so that state
//!   transitions stay centralized and testable without a real network.
//!
//! The production implementation is [`mqtt::MqttChannel`] (rumqttc over
//! TLS); tests drive the publisher with an in-memory mock.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod mqtt;
pub mod publisher;

pub use config::TransportConfig;
pub use mqtt::MqttChannel;
pub use publisher::{ConnectionState, PublishError, PublishOutcome, Publisher};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Delivery guarantee requested for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryGuarantee {
    /// Fire and forget (QoS 0 equivalent)
    AtMostOnce,
    /// Broker acknowledges receipt; may deliver more than once (QoS 1)
    AtLeastOnce,
}

/// Synchronous result of handing a payload to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionResult {
    /// Transport accepted the message for delivery
    pub accepted: bool,
    /// Transport-assigned message identifier, when known at submission time
    pub message_id: Option<u16>,
}

/// Outcome of the broker's connect handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectCode {
    /// Handshake accepted
    Accepted,
    /// Broker refused the connection with the given return code
    Refused(u8),
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Broker closed the session
    PeerClosed,
    /// Transport-level failure (socket, TLS, protocol)
    Transport(String),
}

/// Errors from a delivery channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No open session
    #[error("channel not open")]
    NotOpen,

    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Asynchronous notifications delivered by the transport.
///
/// Implemented by the publisher's shared state handle; invoked from the
/// transport's own task, so implementations must be cheap and non-blocking.
pub trait TransportObserver: Send + Sync {
    /// Connect handshake finished.
    fn on_connect_result(&self, code: ConnectCode);

    /// Session dropped, whoever initiated it.
    fn on_disconnect(&self, reason: DisconnectReason);

    /// Broker acknowledged a QoS 1 message.
    fn on_publish_ack(&self, message_id: u16);
}

/// Thin contract over the real transport.
///
/// `open` starts the session and wires the observer; `send` submits one
/// payload; `close` releases the session and is safe to call repeatedly.
#[async_trait]
pub trait DeliveryChannel: Send {
    /// Channel-specific error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens a session and registers the observer for async notifications.
    async fn open(
        &mut self,
        config: &TransportConfig,
        observer: Arc<dyn TransportObserver>,
    ) -> Result<(), Self::Error>;

    /// Submits one payload to `topic` with the requested guarantee.
    async fn send(
        &mut self,
        topic: &str,
        payload: &[u8],
        guarantee: DeliveryGuarantee,
    ) -> Result<SubmissionResult, Self::Error>;

    /// Releases the session; no-op when already closed.
    async fn close(&mut self) -> Result<(), Self::Error>;
}

/// Counters maintained by the publisher across its lifetime.
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Messages accepted by the transport
    pub messages_sent: u64,
    /// Messages the transport declined or that failed fast
    pub messages_failed: u64,
    /// Broker acknowledgments received
    pub acks_received: u64,
    /// Successful connects after the first
    pub reconnections: u32,
    /// Most recent error message, if any
    pub last_error: Option<String>,
}
