use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KernelConfig {
    pub http: HttpConf,
    pub simulation: SimulationConf,
    pub mqtt: Option<MqttConf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub bind: String, // ex: "0.0.0.0:8080"
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".into() }
    }
}

/// Profil du simulateur de télémétrie (cadences + amplitudes du bruit)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConf {
    pub fast_period_ms: u64,
    pub slow_period_ms: u64,
    pub seed: Option<u64>,
    pub distinguished_machine: String,
    pub base_speed: f64,
    pub slow_temperature_min: i64,
    pub slow_temperature_max: i64,
    pub param_jitter: f64,
    pub speed_jitter: f64,
    pub temperature_jitter: f64,
}

impl Default for SimulationConf {
    fn default() -> Self {
        Self {
            fast_period_ms: 3_000,
            slow_period_ms: 10_000,
            seed: None,
            distinguished_machine: "m4".into(),
            base_speed: 25.6,
            slow_temperature_min: 35,
            slow_temperature_max: 45,
            param_jitter: 0.25,
            speed_jitter: 1.0,
            temperature_jitter: 0.5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_telemetry_topic")]
    pub telemetry_topic: String,
    #[serde(default = "default_health_topic")]
    pub health_topic: String,
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,
}

fn default_telemetry_topic() -> String {
    "mjfleet/fleet/telemetry@v1".into()
}

fn default_health_topic() -> String {
    "mjfleet/kernel/health@v1".into()
}

fn default_health_interval() -> u64 {
    30
}

impl KernelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.fast_period_ms == 0 || sim.slow_period_ms == 0 {
            return Err(ConfigError::Invalid("simulation periods must be > 0".into()));
        }
        if sim.slow_temperature_min > sim.slow_temperature_max {
            return Err(ConfigError::Invalid(format!(
                "slow_temperature_min ({}) > slow_temperature_max ({})",
                sim.slow_temperature_min, sim.slow_temperature_max
            )));
        }
        let jitters = [sim.param_jitter, sim.speed_jitter, sim.temperature_jitter];
        if !jitters.iter().all(|j| j.is_finite() && *j >= 0.0) {
            return Err(ConfigError::Invalid("jitter amplitudes must be finite and >= 0".into()));
        }
        if !sim.base_speed.is_finite() {
            return Err(ConfigError::Invalid("simulation.base_speed must be finite".into()));
        }
        if let Some(mqtt) = &self.mqtt {
            if mqtt.health_interval_secs == 0 {
                return Err(ConfigError::Invalid("mqtt.health_interval_secs must be > 0".into()));
            }
        }
        Ok(())
    }
}

/// Parse un YAML de config ; un texte vide donne la config par défaut
pub fn parse_config(txt: &str) -> Result<KernelConfig, ConfigError> {
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    let cfg: KernelConfig = serde_yaml::from_str(txt)?;
    cfg.validate()?;
    Ok(cfg)
}

pub async fn read_config<P: AsRef<Path>>(path: P) -> Result<KernelConfig, ConfigError> {
    let txt = fs::read_to_string(path).await?;
    parse_config(&txt)
}

/// Charge la config depuis MJFLEET_CONFIG (défaut: kernel.yaml).
/// Fichier absent ou invalide : config par défaut + warning.
pub async fn load_config() -> KernelConfig {
    let path = std::env::var("MJFLEET_CONFIG").unwrap_or_else(|_| "kernel.yaml".into());
    if !Path::new(&path).exists() {
        warn!(%path, "no config file, using defaults");
        return KernelConfig::default();
    }
    read_config(&path).await.unwrap_or_else(|e| {
        warn!(%path, error = %e, "invalid config, using defaults");
        KernelConfig::default()
    })
}
