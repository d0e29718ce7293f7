use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;

use crate::simulator::Cadence;
use crate::state::{new_state, FleetReader, Shared};

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub machines_tracked: u32,
    pub machines_running: u32,
    pub snapshot_version: u64,
    pub last_update: String,
    pub fast_ticks: u64,
    pub slow_ticks: u64,
    pub memory_usage_mb: f32,
    pub mqtt_status: String,
    pub mqtt_reconnects: u32,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    fast_ticks: Arc<AtomicU64>,
    slow_ticks: Arc<AtomicU64>,
    mqtt_reconnects: Arc<AtomicU32>,
    mqtt_status: Shared<String>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            fast_ticks: Arc::new(AtomicU64::new(0)),
            slow_ticks: Arc::new(AtomicU64::new(0)),
            mqtt_reconnects: Arc::new(AtomicU32::new(0)),
            mqtt_status: new_state("disabled".to_string()),
        }
    }

    pub fn record_tick(&self, cadence: Cadence) {
        let counter = match cadence {
            Cadence::Fast => &self.fast_ticks,
            Cadence::Slow => &self.slow_ticks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// (ticks rapides, ticks lents) depuis le démarrage
    pub fn tick_counts(&self) -> (u64, u64) {
        (
            self.fast_ticks.load(Ordering::Relaxed),
            self.slow_ticks.load(Ordering::Relaxed),
        )
    }

    pub fn mark_mqtt_connecting(&self) {
        *self.mqtt_status.lock() = "connecting".to_string();
    }

    pub fn mark_mqtt_connected(&self) {
        *self.mqtt_status.lock() = "connected".to_string();
    }

    pub fn increment_reconnects(&self) {
        self.mqtt_reconnects.fetch_add(1, Ordering::Relaxed);
        *self.mqtt_status.lock() = "reconnecting".to_string();
    }

    pub fn get_health(&self, fleet: &FleetReader) -> KernelHealth {
        let snap = fleet.snapshot();
        let (fast_ticks, slow_ticks) = self.tick_counts();

        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            machines_tracked: snap.machines.len() as u32,
            machines_running: snap.machines.iter().filter(|m| m.is_running()).count() as u32,
            snapshot_version: snap.version,
            last_update: snap.updated_at.format(&Rfc3339).unwrap_or_default(),
            fast_ticks,
            slow_ticks,
            memory_usage_mb: get_memory_usage_mb(),
            mqtt_status: self.mqtt_status.lock().clone(),
            mqtt_reconnects: self.mqtt_reconnects.load(Ordering::Relaxed),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            if let Some(mb) = parse_vm_rss_mb(&status) {
                return mb;
            }
        }
    }

    // Fallback approximatif
    12.0
}

fn parse_vm_rss_mb(status: &str) -> Option<f32> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb as f32 / 1024.0) // KB -> MB
}
