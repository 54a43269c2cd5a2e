//! # heatkeeperd: heatkeeper daemon
//!
//! Composition root that wires all adapters together and starts the service.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Seed the simulated vendor
//! - Start the poller, the control loop and notification forwarding
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer. No domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use heatkeeper_adapter_http_axum::router;
use heatkeeper_adapter_http_axum::state::AppState;
use heatkeeper_adapter_virtual::VirtualController;
use heatkeeper_app::control_loop::ControlLoop;
use heatkeeper_app::event_bus::NotificationBus;
use heatkeeper_app::notifier::{LogNotifier, forward_notifications};
use heatkeeper_app::poller::Poller;
use heatkeeper_domain::presence::User;
use heatkeeper_domain::zone::Zone;

use crate::config::{Config, SimulationConfig};

const NOTIFICATION_CAPACITY: usize = 256;
const UPDATE_CAPACITY: usize = 8;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let vendor = Arc::new(seed_vendor(&config.simulation)?);
    let bus = Arc::new(NotificationBus::new(NOTIFICATION_CAPACITY));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let notifier = tokio::spawn(forward_notifications(bus.subscribe(), LogNotifier));

    let poller = Arc::new(Poller::new(Arc::clone(&vendor), UPDATE_CAPACITY));
    let subscription = poller.subscribe();
    let (control, handle) = ControlLoop::new(
        config.zones.clone(),
        Arc::clone(&vendor),
        Arc::clone(&bus),
        poller.refresh_handle(),
    );
    let control = tokio::spawn(control.run(subscription.receiver, shutdown_rx.clone()));
    let polling = {
        let poller = Arc::clone(&poller);
        let interval = config.poll_interval();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { poller.run(interval, shutdown).await })
    };

    let app = router::build(AppState::new(handle));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, zones = config.zones.len(), "heatkeeperd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    // Only fails when every receiver is gone already.
    let _ = shutdown_tx.send(true);
    polling.await?;
    control.await?;
    // The control loop held the last other publisher handle.
    drop(bus);
    notifier.await?;

    Ok(())
}

fn seed_vendor(simulation: &SimulationConfig) -> Result<VirtualController, Box<dyn std::error::Error>> {
    let vendor = VirtualController::new();
    for zone in &simulation.zones {
        vendor.add_zone(Zone::new(zone.id, zone.name.clone()));
        if let Some(temperature) = zone.manual {
            vendor.set_manual(zone.id, temperature)?;
        }
    }
    for user in &simulation.users {
        vendor.add_user(User::new(user.id, user.name.clone(), user.presence));
    }
    tracing::info!(
        zones = simulation.zones.len(),
        users = simulation.users.len(),
        "simulated vendor seeded"
    );
    Ok(vendor)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
