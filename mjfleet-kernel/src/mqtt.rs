/**
 * PUBLICATION MQTT - Diffusion de la télémétrie et de la santé du kernel
 *
 * Optionnel : actif seulement si la section `mqtt` est présente dans la config.
 * - à chaque snapshot commité : message compact sur `telemetry_topic`
 * - toutes les `health_interval_secs` : KernelHealth sur `health_topic`
 * Les erreurs de publication sont loggées, jamais remontées au registre.
 */

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use serde::Serialize;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::MqttConf;
use crate::health::HealthTracker;
use crate::models::MachineStatus;
use crate::state::{FleetReader, FleetSnapshot};

#[derive(Debug, Serialize)]
pub struct MachineTelemetry {
    pub id: String,
    pub status: MachineStatus,
    pub speed: f64,
    pub temperature: f64,
    pub total_area: u64,
}

#[derive(Debug, Serialize)]
pub struct TelemetryMessage {
    pub version: u64,
    pub ts: String,
    pub machines: Vec<MachineTelemetry>,
}

pub fn telemetry_message(snap: &FleetSnapshot) -> TelemetryMessage {
    TelemetryMessage {
        version: snap.version,
        ts: snap.updated_at.format(&Rfc3339).unwrap_or_default(),
        machines: snap
            .machines
            .iter()
            .map(|m| MachineTelemetry {
                id: m.id.clone(),
                status: m.status,
                speed: m.speed,
                temperature: m.temperature,
                total_area: m.total_area,
            })
            .collect(),
    }
}

pub fn create_mqtt_client(conf: &MqttConf) -> (AsyncClient, EventLoop) {
    let client_id = format!("mjfleet-kernel-{}", uuid::Uuid::new_v4().simple());
    let mut opts = MqttOptions::new(client_id, &conf.host, conf.port);
    opts.set_keep_alive(Duration::from_secs(15));
    AsyncClient::new(opts, REQUEST_CAPACITY)
}

const REQUEST_CAPACITY: usize = 10;
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Ne bloque jamais : file pleine (broker injoignable) = message abandonné,
/// le tick suivant republie un état complet.
fn publish_json<T: Serialize>(client: &AsyncClient, topic: &str, payload: &T) -> bool {
    match serde_json::to_string(payload) {
        Ok(txt) => match client.try_publish(topic, QoS::AtLeastOnce, false, txt) {
            Ok(()) => true,
            Err(e) => {
                warn!(%topic, error = ?e, "mqtt publish dropped");
                false
            }
        },
        Err(e) => {
            error!(%topic, error = %e, "failed to serialize mqtt payload");
            false
        }
    }
}

/// Démarre la boucle de publication jusqu'au signal d'arrêt
pub fn spawn_publisher(
    conf: MqttConf,
    fleet: FleetReader,
    health_tracker: HealthTracker,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (client, mut eventloop) = create_mqtt_client(&conf);
        health_tracker.mark_mqtt_connecting();
        info!(host = %conf.host, port = conf.port, "mqtt publisher started");

        let mut snapshots = fleet.subscribe();
        let mut interval = tokio::time::interval(Duration::from_secs(conf.health_interval_secs));
        // attente avant reconnexion, sans bloquer la boucle
        let backoff = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(backoff);
        let mut backing_off = false;

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        // plus d'écrivain : le simulateur est arrêté
                        break;
                    }
                    let msg = telemetry_message(&snapshots.borrow_and_update());
                    if publish_json(&client, &conf.telemetry_topic, &msg) {
                        debug!(version = msg.version, "telemetry queued");
                    }
                },
                _ = interval.tick() => {
                    let health = health_tracker.get_health(&fleet);
                    publish_json(&client, &conf.health_topic, &health);
                },
                _ = &mut backoff, if backing_off => {
                    backing_off = false;
                },
                event = eventloop.poll(), if !backing_off => {
                    match event {
                        Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                            health_tracker.mark_mqtt_connected();
                            info!("mqtt connected");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = ?e, "mqtt connection error");
                            health_tracker.increment_reconnects();
                            backoff.as_mut().reset(Instant::now() + RECONNECT_DELAY);
                            backing_off = true;
                        }
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let _ = client.try_disconnect();
        info!("mqtt publisher stopped");
    })
}
