//! Telesim device simulator.
//!
//! Synthesizes four sensor channels, filters them through the rolling
//! outlier window, and publishes one batch per cycle to the broker. The
//! loop tolerates broker unavailability: a failed publish is logged and the
//! next cycle retries, reconnecting with a short backoff when the session
//! is down. Ctrl-C stops the loop between cycles, never mid-publish.

use std::process::ExitCode;
use std::time::Duration;

use log::{error, info, warn};

use telesim_connectors::{ConnectionState, MqttChannel, Publisher};
use telesim_core::{RawSample, SampleProcessor};

mod config;
mod signal;

use config::DeviceConfig;
use signal::SignalSource;

/// Pause before a reconnect attempt after a failed cycle.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let config = match DeviceConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "starting simulator for {} (id {}) against {}:{}",
        config.device_name, config.device_id, config.transport.host, config.transport.port
    );

    let mut processor = SampleProcessor::new(&config.device_id, &config.device_name);
    let mut sources = signal::default_sources();
    let mut publisher = Publisher::new(MqttChannel::new(), config.transport.clone());

    if !publisher.connect().await {
        warn!("initial connection failed; retrying from the main loop");
    }

    run_loop(
        &mut publisher,
        &mut processor,
        &mut sources,
        config.publish_interval,
    )
    .await;

    publisher.disconnect().await;
    info!("simulator stopped");
    ExitCode::SUCCESS
}

/// Foreground simulation loop; returns when a shutdown signal arrives.
async fn run_loop(
    publisher: &mut Publisher<MqttChannel>,
    processor: &mut SampleProcessor,
    sources: &mut [Box<dyn SignalSource>],
    interval: Duration,
) {
    let mut cycle = 0u64;

    loop {
        cycle += 1;
        let now = chrono::Utc::now();

        let samples: Vec<RawSample> = sources.iter_mut().map(|s| s.sample(now)).collect();
        let readings = processor.process_batch(&samples);
        for reading in &readings {
            info!(
                "cycle {cycle}: {} = {} {} ({:?})",
                reading.variable, reading.value, reading.unit, reading.quality
            );
        }

        let outcome = publisher.publish(processor.device_id(), &readings).await;
        if outcome.accepted {
            info!("cycle {cycle}: batch of {} accepted for delivery", readings.len());
        } else {
            // The unsent batch is dropped; the filter state it fed survives
            warn!(
                "cycle {cycle}: publish failed ({}); retrying next cycle",
                outcome
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );

            if publisher.state() == ConnectionState::Disconnected {
                if sleep_or_shutdown(RECONNECT_BACKOFF).await {
                    break;
                }
                if publisher.connect().await {
                    info!("reconnected to broker");
                } else {
                    warn!("reconnect attempt failed");
                }
            }
        }

        if sleep_or_shutdown(interval).await {
            break;
        }
    }

    info!("shutdown requested; leaving simulation loop");
}

/// Sleeps for `duration`, returning true if a shutdown signal cut it short.
async fn sleep_or_shutdown(duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!("failed to listen for shutdown signal: {err}");
            }
            true
        }
    }
}
