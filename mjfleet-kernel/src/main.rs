/**
 * MJFLEET KERNEL - Point d'entrée du serveur de supervision
 *
 * RÔLE : Orchestration des modules : config, registre machines, simulateur
 * de télémétrie, publication MQTT optionnelle, API HTTP.
 *
 * ARCHITECTURE : un écrivain (simulateur) → snapshots immuables → N lecteurs (vues HTTP, MQTT).
 * Arrêt propre sur Ctrl-C : plus aucun tick après l'arrêt.
 */

mod config;
mod health;
mod http;
mod models;
mod mqtt;
mod seed;
mod simulator;
mod state;
mod views;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::load_config;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::simulator::Simulator;
use crate::state::FleetRegistry;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = load_config().await;
    let health_tracker = HealthTracker::new();

    // registre : seul le simulateur reçoit le writer
    let (writer, fleet) = FleetRegistry::new(seed::initial_machines());
    info!(machines = fleet.snapshot().machines.len(), "fleet registry seeded");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let simulator = Simulator::new(writer, &cfg.simulation, health_tracker.clone())
        .spawn(shutdown_rx.clone());

    let publisher = cfg.mqtt.clone().map(|mqtt_cfg| {
        mqtt::spawn_publisher(mqtt_cfg, fleet.clone(), health_tracker.clone(), shutdown_rx.clone())
    });
    if publisher.is_none() {
        info!("mqtt not configured, publisher disabled");
    }

    let api_key = std::env::var("MJFLEET_API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        warn!("MJFLEET_API_KEY not set - API is open");
    }

    let app_state = AppState {
        fleet,
        alarms: Arc::new(seed::initial_alarms()),
        users: Arc::new(seed::initial_users()),
        health_tracker,
        api_key,
    };
    let app = http::build_router(app_state);

    let addr: SocketAddr = cfg
        .http
        .bind
        .parse()
        .with_context(|| format!("invalid http.bind address: {}", cfg.http.bind))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("http server failed")?;

    // arrêt commun des tâches périodiques
    let _ = shutdown_tx.send(true);
    simulator.await.context("simulator task panicked")?;
    if let Some(handle) = publisher {
        handle.await.context("mqtt publisher task panicked")?;
    }
    info!("kernel stopped");
    Ok(())
}
