//! Publisher State Machine
//!
//! ## Overview
//!
//! The publisher owns the connection lifecycle and the publish contract the
//! simulation loop consumes. Its state is written from two execution
//! contexts: the foreground loop calling `connect`/`publish`/`disconnect`,
//! and the transport's task delivering connect results and disconnect
//! notifications. A `tokio::sync::watch` channel guards every transition, so
//! both sides observe a consistent state and `connect` can wait on the
//! handshake outcome as a future instead of spinning on a flag.
//!
//! ## Contract
//!
//! - `connect` blocks the caller up to a bounded timeout for the transport's
//!   connect acknowledgment; failed attempts settle back at `Disconnected`
//!   and may be retried.
//! - `publish` fails fast when not `Connected` and never waits for broker
//!   acknowledgment; `accepted` means "accepted for delivery". Asynchronous
//!   broker-side failures arrive through [`TransportObserver::on_disconnect`]
//!   and never retroactively change a returned outcome.
//! - A broker-initiated drop while `Connected` forces `Disconnected`
//!   immediately; recovery is the caller's job via a future `connect`.
//! - Retry policy lives in the caller's loop, which must sleep between
//!   attempts; nothing here spins.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::watch;

use telesim_core::{Envelope, Reading};

use crate::{
    ConnectCode, ConnectionStats, DeliveryChannel, DeliveryGuarantee, DisconnectReason,
    TransportConfig, TransportObserver,
};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session; the only state `connect` starts from
    Disconnected,
    /// Handshake in flight
    Connecting,
    /// Session established; publishing allowed
    Connected,
    /// Orderly teardown in progress
    Disconnecting,
}

/// Why a publish call did not get accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    /// Publisher was not in the `Connected` state
    #[error("not connected")]
    NotConnected,

    /// Payload could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Transport declined the submission
    #[error("submission declined: {0}")]
    Declined(String),
}

/// Per-call publish result. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Transport accepted the message for delivery
    pub accepted: bool,
    /// Transport-assigned identifier, when known at submission time
    pub message_id: Option<u16>,
    /// Classification of the failure, when not accepted
    pub error: Option<PublishError>,
}

impl PublishOutcome {
    fn accepted(message_id: Option<u16>) -> Self {
        Self {
            accepted: true,
            message_id,
            error: None,
        }
    }

    fn rejected(error: PublishError) -> Self {
        Self {
            accepted: false,
            message_id: None,
            error: Some(error),
        }
    }
}

/// State and counters shared with the transport task.
///
/// This is the publisher's observer: transport notifications mutate state
/// here, under the watch guard, never anywhere else.
struct Shared {
    state: watch::Sender<ConnectionState>,
    stats: Mutex<ConnectionStats>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: watch::Sender::new(ConnectionState::Disconnected),
            stats: Mutex::new(ConnectionStats::default()),
        }
    }

    fn get(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Replaces the state, returning the previous one.
    fn set(&self, next: ConnectionState) -> ConnectionState {
        self.state.send_replace(next)
    }

    fn note_failure(&self, message: &str) {
        let mut stats = self.stats.lock().unwrap();
        stats.messages_failed += 1;
        stats.last_error = Some(message.to_string());
    }
}

impl TransportObserver for Shared {
    fn on_connect_result(&self, code: ConnectCode) {
        match code {
            ConnectCode::Accepted => {
                // Only a pending handshake can complete; a late ack after
                // timeout must not resurrect the connection.
                let advanced = self.state.send_if_modified(|state| {
                    if *state == ConnectionState::Connecting {
                        *state = ConnectionState::Connected;
                        true
                    } else {
                        false
                    }
                });
                if !advanced {
                    log::debug!("ignoring connect ack outside handshake");
                }
            }
            ConnectCode::Refused(code) => {
                log::warn!("broker refused connection (code {code})");
                self.stats.lock().unwrap().last_error =
                    Some(format!("connection refused: code {code}"));
                self.set(ConnectionState::Disconnected);
            }
        }
    }

    fn on_disconnect(&self, reason: DisconnectReason) {
        let previous = self.set(ConnectionState::Disconnected);
        match previous {
            ConnectionState::Connected => {
                log::warn!("transport dropped while connected: {reason:?}")
            }
            ConnectionState::Connecting => {
                log::warn!("transport failed during handshake: {reason:?}")
            }
            // Teardown we initiated ourselves
            _ => log::debug!("session closed: {reason:?}"),
        }
    }

    fn on_publish_ack(&self, message_id: u16) {
        self.stats.lock().unwrap().acks_received += 1;
        log::debug!("broker acknowledged message {message_id}");
    }
}

/// Connection/publish state machine over a [`DeliveryChannel`].
pub struct Publisher<C: DeliveryChannel> {
    channel: C,
    config: TransportConfig,
    shared: Arc<Shared>,
    connected_once: bool,
}

impl<C: DeliveryChannel> Publisher<C> {
    /// Publisher over the given channel. Starts `Disconnected`.
    pub fn new(channel: C, config: TransportConfig) -> Self {
        Self {
            channel,
            config,
            shared: Arc::new(Shared::new()),
            connected_once: false,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.get()
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> ConnectionStats {
        self.shared.stats.lock().unwrap().clone()
    }

    /// Establishes a session with the broker.
    ///
    /// Transitions `Disconnected -> Connecting`, opens the channel and waits
    /// up to the configured timeout for the handshake result. Returns `true`
    /// only once the state reached `Connected`. On refusal, transport error
    /// or timeout the publisher settles back at `Disconnected` and the call
    /// may simply be repeated.
    pub async fn connect(&mut self) -> bool {
        match self.state() {
            ConnectionState::Connected => return true,
            ConnectionState::Disconnected => {}
            other => {
                log::warn!("connect called while {other:?}");
                return false;
            }
        }

        self.shared.set(ConnectionState::Connecting);
        log::info!("connecting to {}:{}", self.config.host, self.config.port);

        let observer: Arc<dyn TransportObserver> = self.shared.clone();
        if let Err(err) = self.channel.open(&self.config, observer).await {
            log::warn!("transport open failed: {err}");
            self.shared.stats.lock().unwrap().last_error = Some(err.to_string());
            self.shared.set(ConnectionState::Disconnected);
            return false;
        }

        let mut rx = self.shared.state.subscribe();
        let settled = tokio::time::timeout(
            self.config.connect_timeout,
            rx.wait_for(|state| *state != ConnectionState::Connecting),
        )
        .await;

        let connected = match settled {
            Ok(Ok(state)) => *state == ConnectionState::Connected,
            // Watch closed; unreachable while `shared` is alive
            Ok(Err(_)) => false,
            Err(_) => {
                log::warn!(
                    "no connect acknowledgment within {:?}",
                    self.config.connect_timeout
                );
                false
            }
        };

        if connected {
            if self.connected_once {
                self.shared.stats.lock().unwrap().reconnections += 1;
            }
            self.connected_once = true;
            log::info!("connected to {}:{}", self.config.host, self.config.port);
            true
        } else {
            let _ = self.channel.close().await;
            self.shared.set(ConnectionState::Disconnected);
            false
        }
    }

    /// Submits one batch of readings for `device_id`.
    ///
    /// Fails fast without touching the connection state when not
    /// `Connected`; the retry-next-cycle policy belongs to the caller.
    pub async fn publish(&mut self, device_id: &str, readings: &[Reading]) -> PublishOutcome {
        let state = self.state();
        if state != ConnectionState::Connected {
            log::warn!("publish rejected: state is {state:?}");
            self.shared.note_failure("publish while not connected");
            return PublishOutcome::rejected(PublishError::NotConnected);
        }

        let envelope = Envelope::new(device_id, readings.to_vec());
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(err) => {
                self.shared.note_failure(&err.to_string());
                return PublishOutcome::rejected(PublishError::Serialization(err.to_string()));
            }
        };

        let topic = self.config.data_topic(device_id);
        match self
            .channel
            .send(&topic, &payload, DeliveryGuarantee::AtLeastOnce)
            .await
        {
            Ok(result) if result.accepted => {
                self.shared.stats.lock().unwrap().messages_sent += 1;
                log::debug!("submitted {} readings to {topic}", readings.len());
                PublishOutcome::accepted(result.message_id)
            }
            Ok(_) => {
                self.shared.note_failure("transport declined submission");
                PublishOutcome::rejected(PublishError::Declined(
                    "transport declined submission".into(),
                ))
            }
            Err(err) => {
                log::warn!("publish failed: {err}");
                self.shared.note_failure(&err.to_string());
                PublishOutcome::rejected(PublishError::Declined(err.to_string()))
            }
        }
    }

    /// Releases the session. No-op when already `Disconnected`.
    pub async fn disconnect(&mut self) {
        if self.state() == ConnectionState::Disconnected {
            return;
        }

        self.shared.set(ConnectionState::Disconnecting);
        let _ = self.channel.close().await;
        self.shared.set(ConnectionState::Disconnected);
        log::info!("disconnected from broker");
    }
}
