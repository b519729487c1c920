//! MQTT Delivery Channel
//!
//! ## Overview
//!
//! [`MqttChannel`] implements [`DeliveryChannel`] over rumqttc. `open`
//! builds the TLS session (system trust roots) and spawns one task that
//! drains the rumqttc event loop, translating transport events into the
//! observer notifications the publisher's state machine runs on:
//!
//! - `ConnAck` / refused handshake -> [`TransportObserver::on_connect_result`]
//! - `PubAck` -> [`TransportObserver::on_publish_ack`]
//! - poll error or incoming disconnect -> [`TransportObserver::on_disconnect`]
//!
//! The event task exits on the first transport failure instead of letting
//! rumqttc reconnect on its own: reconnection policy belongs to the
//! publisher's caller, and two competing reconnect loops would make the
//! observed state meaningless. A fresh `open` starts a fresh session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS, TlsConfiguration, Transport,
};
use tokio::task::JoinHandle;

use crate::{
    ChannelError, ConnectCode, DeliveryChannel, DeliveryGuarantee, DisconnectReason,
    SubmissionResult, TransportConfig, TransportObserver,
};

/// Request queue depth between client handle and event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// How long `close` waits for the event task to drain the DISCONNECT.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// rumqttc-backed delivery channel with TLS.
#[derive(Default)]
pub struct MqttChannel {
    client: Option<AsyncClient>,
    event_task: Option<JoinHandle<()>>,
}

impl MqttChannel {
    /// Channel with no open session.
    pub fn new() -> Self {
        Self::default()
    }

    fn to_qos(guarantee: DeliveryGuarantee) -> QoS {
        match guarantee {
            DeliveryGuarantee::AtMostOnce => QoS::AtMostOnce,
            DeliveryGuarantee::AtLeastOnce => QoS::AtLeastOnce,
        }
    }
}

#[async_trait]
impl DeliveryChannel for MqttChannel {
    type Error = ChannelError;

    async fn open(
        &mut self,
        config: &TransportConfig,
        observer: Arc<dyn TransportObserver>,
    ) -> Result<(), ChannelError> {
        // A retry may reopen over a dead session
        self.close().await?;

        let mut options =
            MqttOptions::new(config.client_id.as_str(), config.host.as_str(), config.port);
        options.set_credentials(config.username.as_str(), config.password.as_str());
        options.set_keep_alive(config.keep_alive);
        options.set_transport(Transport::Tls(TlsConfiguration::Native));

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        self.client = Some(client);
        self.event_task = Some(tokio::spawn(drive_event_loop(eventloop, observer)));
        Ok(())
    }

    async fn send(
        &mut self,
        topic: &str,
        payload: &[u8],
        guarantee: DeliveryGuarantee,
    ) -> Result<SubmissionResult, ChannelError> {
        let client = self.client.as_ref().ok_or(ChannelError::NotOpen)?;

        client
            .publish(topic, Self::to_qos(guarantee), false, payload)
            .await
            .map_err(|err| ChannelError::Transport(err.to_string()))?;

        // rumqttc assigns the packet id inside the event loop; the ack for it
        // arrives through the observer
        Ok(SubmissionResult {
            accepted: true,
            message_id: None,
        })
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if let Some(client) = self.client.take() {
            // Best effort; the session may already be gone
            let _ = client.disconnect().await;
        }

        if let Some(mut task) = self.event_task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }

        Ok(())
    }
}

/// Drains the event loop, forwarding transport events to the observer.
///
/// Runs on its own task; exits on orderly disconnect or the first transport
/// failure.
async fn drive_event_loop(mut eventloop: EventLoop, observer: Arc<dyn TransportObserver>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                let code = match ack.code {
                    ConnectReturnCode::Success => ConnectCode::Accepted,
                    refused => ConnectCode::Refused(refused as u8),
                };
                observer.on_connect_result(code);
            }
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                observer.on_publish_ack(ack.pkid);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                observer.on_disconnect(DisconnectReason::PeerClosed);
                break;
            }
            // Our own DISCONNECT went out; the session is done
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(ConnectionError::ConnectionRefused(code)) => {
                observer.on_connect_result(ConnectCode::Refused(code as u8));
                break;
            }
            Err(err) => {
                observer.on_disconnect(DisconnectReason::Transport(err.to_string()));
                break;
            }
        }
    }
}
