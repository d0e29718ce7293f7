/**
 * SIMULATEUR DE TÉLÉMÉTRIE - Remplace un flux capteurs réel
 *
 * RÔLE :
 * Deux cadences appliquées au registre machines :
 * - rapide (3s) : toutes les machines en marche sauf la machine distinguée,
 *   petite marche aléatoire sur vitesse / température, surface cumulée +0..1
 * - lente (10s) : uniquement la machine distinguée (UV, m4) en marche,
 *   vitesse dans une bande étroite 25.60..25.69, température 35..45,
 *   surface +1..3, bruit ±0.25 sur chaque paramètre numérique
 *
 * Les transformations sont pures et prennent le RNG en argument (seedable).
 * La tâche `Simulator` est l'unique écrivain du registre : une seule boucle
 * select! pilote les deux cadences, chaque tick repart du dernier commit.
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::SimulationConf;
use crate::health::HealthTracker;
use crate::models::{Machine, MachineParameter, ParamValue};
use crate::state::{FleetSnapshot, FleetWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Fast,
    Slow,
}

/// Amplitudes du bruit, dérivées de la config
#[derive(Debug, Clone)]
pub struct SimulationProfile {
    pub distinguished_id: String,
    pub base_speed: f64,
    pub slow_temperature: (i64, i64),
    pub param_jitter: f64,
    pub speed_jitter: f64,
    pub temperature_jitter: f64,
}

impl From<&SimulationConf> for SimulationProfile {
    fn from(conf: &SimulationConf) -> Self {
        Self {
            distinguished_id: conf.distinguished_machine.clone(),
            base_speed: conf.base_speed,
            slow_temperature: (conf.slow_temperature_min, conf.slow_temperature_max),
            param_jitter: conf.param_jitter,
            speed_jitter: conf.speed_jitter,
            temperature_jitter: conf.temperature_jitter,
        }
    }
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self::from(&SimulationConf::default())
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, amplitude: f64) -> f64 {
    rng.gen_range(-amplitude..=amplitude)
}

/// Cadence rapide : machines en marche autres que la machine distinguée.
///
/// La vitesse est arrondie au dixième après le bruit : |Δvitesse| <= speed_jitter
/// vaut dès que la vitesse de départ est au dixième, donc à partir du deuxième
/// tick pour une machine seedée au centième (ex. 25.65 -> écart max 1.05).
pub fn fast_tick<R: Rng + ?Sized>(
    machines: &[Machine],
    profile: &SimulationProfile,
    rng: &mut R,
) -> Vec<Machine> {
    machines
        .iter()
        .map(|m| {
            if !m.is_running() || m.id == profile.distinguished_id {
                return m.clone();
            }
            let mut next = m.clone();
            next.speed = round_to(m.speed + symmetric(rng, profile.speed_jitter), 1);
            next.total_area = m.total_area + rng.gen_range(0..2u64);
            next.temperature = m.temperature + symmetric(rng, profile.temperature_jitter);
            next
        })
        .collect()
}

/// Cadence lente : profil bande étroite de la machine distinguée
pub fn slow_tick<R: Rng + ?Sized>(
    machines: &[Machine],
    profile: &SimulationProfile,
    rng: &mut R,
) -> Vec<Machine> {
    machines
        .iter()
        .map(|m| {
            if !m.is_running() || m.id != profile.distinguished_id {
                return m.clone();
            }
            let (t_min, t_max) = profile.slow_temperature;
            let mut next = m.clone();
            // seule la deuxième décimale varie
            next.speed = round_to(profile.base_speed + rng.gen_range(0..10u32) as f64 / 100.0, 2);
            next.temperature = rng.gen_range(t_min..=t_max) as f64;
            next.total_area = m.total_area + rng.gen_range(1..=3u64);
            next.params = m
                .params
                .iter()
                .map(|p| jitter_param(p, profile.param_jitter, rng))
                .collect();
            next
        })
        .collect()
}

fn jitter_param<R: Rng + ?Sized>(p: &MachineParameter, amplitude: f64, rng: &mut R) -> MachineParameter {
    match p.value {
        ParamValue::Number(v) => MachineParameter {
            value: ParamValue::Number(round_to(v + symmetric(rng, amplitude), 1)),
            ..p.clone()
        },
        ParamValue::Text(_) => p.clone(),
    }
}

pub struct Simulator {
    writer: FleetWriter,
    profile: SimulationProfile,
    fast_period: Duration,
    slow_period: Duration,
    rng: StdRng,
    health: HealthTracker,
}

impl Simulator {
    pub fn new(writer: FleetWriter, conf: &SimulationConf, health: HealthTracker) -> Self {
        let rng = match conf.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            writer,
            profile: SimulationProfile::from(conf),
            fast_period: Duration::from_millis(conf.fast_period_ms),
            slow_period: Duration::from_millis(conf.slow_period_ms),
            rng,
            health,
        }
    }

    /// Applique une cadence au dernier snapshot et commite le résultat
    pub fn step(&mut self, cadence: Cadence) -> Arc<FleetSnapshot> {
        let current = self.writer.current();
        let next = match cadence {
            Cadence::Fast => fast_tick(&current.machines, &self.profile, &mut self.rng),
            Cadence::Slow => slow_tick(&current.machines, &self.profile, &mut self.rng),
        };
        let snap = self.writer.commit(next);
        self.health.record_tick(cadence);
        debug!(?cadence, version = snap.version, "telemetry tick committed");
        snap
    }

    /// Lance la boucle des deux cadences jusqu'au signal d'arrêt
    pub fn spawn(mut self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                fast_ms = self.fast_period.as_millis() as u64,
                slow_ms = self.slow_period.as_millis() as u64,
                distinguished = %self.profile.distinguished_id,
                "telemetry simulator started"
            );

            let mut fast = tokio::time::interval(self.fast_period);
            let mut slow = tokio::time::interval(self.slow_period);
            fast.set_missed_tick_behavior(MissedTickBehavior::Delay);
            slow.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // le premier tick d'un interval est immédiat : on attend une période pleine
            fast.tick().await;
            slow.tick().await;

            loop {
                tokio::select! {
                    _ = fast.tick() => { self.step(Cadence::Fast); }
                    _ = slow.tick() => { self.step(Cadence::Slow); }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("telemetry simulator stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MachineStatus;
    use crate::seed::initial_machines;
    use crate::state::FleetRegistry;
    use mjfleet_devkit::seeded_rng;

    fn fleet_all_running() -> Vec<Machine> {
        initial_machines()
            .into_iter()
            .map(|mut m| {
                m.status = MachineStatus::Running;
                m.speed = 12.3;
                m
            })
            .collect()
    }

    fn telemetry(m: &Machine) -> (f64, f64, u64, Vec<MachineParameter>) {
        (m.speed, m.temperature, m.total_area, m.params.clone())
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(25.6 + 0.07, 2), 25.67);
        assert_eq!(round_to(-3.04, 1), -3.0);
        assert_eq!(round_to(1.25, 1), 1.3);
    }

    #[test]
    fn test_non_running_machines_unchanged() {
        let profile = SimulationProfile::default();
        let mut machines = initial_machines();
        for (i, m) in machines.iter_mut().enumerate() {
            m.status = [
                MachineStatus::Idle,
                MachineStatus::Stopped,
                MachineStatus::Warning,
                MachineStatus::Error,
            ][i];
        }
        let mut rng = seeded_rng(7);
        for _ in 0..50 {
            assert_eq!(fast_tick(&machines, &profile, &mut rng), machines);
            assert_eq!(slow_tick(&machines, &profile, &mut rng), machines);
        }
    }

    #[test]
    fn test_slow_tick_speed_band() {
        let profile = SimulationProfile::default();
        let mut rng = seeded_rng(1);
        let mut machines = initial_machines();
        for _ in 0..200 {
            machines = slow_tick(&machines, &profile, &mut rng);
            let m4 = &machines[0];
            assert!(m4.speed >= 25.60 && m4.speed <= 25.69, "speed {}", m4.speed);
            assert_eq!(round_to(m4.speed, 2), m4.speed);
            assert!(m4.temperature >= 35.0 && m4.temperature <= 45.0);
            assert_eq!(m4.temperature.fract(), 0.0);
        }
    }

    #[test]
    fn test_slow_tick_only_touches_distinguished() {
        let profile = SimulationProfile::default();
        let machines = fleet_all_running();
        let mut rng = seeded_rng(3);
        let next = slow_tick(&machines, &profile, &mut rng);
        assert_eq!(&next[1..], &machines[1..]);
        let area_gain = next[0].total_area - machines[0].total_area;
        assert!((1..=3).contains(&area_gain));
    }

    #[test]
    fn test_slow_tick_params_jitter() {
        let profile = SimulationProfile::default();
        let machines = initial_machines();
        let mut rng = seeded_rng(11);
        let next = slow_tick(&machines, &profile, &mut rng);
        for (before, after) in machines[0].params.iter().zip(&next[0].params) {
            assert_eq!(before.name, after.name);
            assert_eq!(before.unit, after.unit);
            match (&before.value, &after.value) {
                (ParamValue::Number(a), ParamValue::Number(b)) => {
                    assert!((a - b).abs() <= 0.3 + 1e-9, "{a} -> {b}");
                    assert_eq!(round_to(*b, 1), *b);
                }
                (ParamValue::Text(a), ParamValue::Text(b)) => assert_eq!(a, b),
                _ => panic!("type de paramètre modifié"),
            }
        }
    }

    #[test]
    fn test_fast_tick_bounded_walk() {
        let profile = SimulationProfile::default();
        let mut rng = seeded_rng(5);
        let mut machines = fleet_all_running();
        for _ in 0..200 {
            let next = fast_tick(&machines, &profile, &mut rng);
            // la machine distinguée ne suit pas la cadence rapide
            assert_eq!(telemetry(&next[0]), telemetry(&machines[0]));
            for (before, after) in machines.iter().zip(&next).skip(1) {
                assert!((after.speed - before.speed).abs() <= 1.0 + 1e-9);
                assert!(after.total_area >= before.total_area);
                assert!(after.total_area - before.total_area <= 1);
                assert!((after.temperature - before.temperature).abs() <= 0.5 + 1e-9);
                assert_eq!(after.params, before.params);
            }
            machines = next;
        }
    }

    #[test]
    fn test_fast_tick_speed_bound_from_two_decimal_seed() {
        // m4 sort de la cadence lente si une autre machine est distinguée
        let profile = SimulationProfile {
            distinguished_id: "none".into(),
            ..SimulationProfile::default()
        };
        let mut machines = initial_machines();
        machines[0].speed = 25.65;
        let mut rng = seeded_rng(13);

        machines = fast_tick(&machines, &profile, &mut rng);
        let first = machines[0].speed;
        assert!((first - 25.65).abs() <= 1.05 + 1e-9);
        assert_eq!(round_to(first, 1), first);

        for _ in 0..200 {
            let next = fast_tick(&machines, &profile, &mut rng);
            assert!((next[0].speed - machines[0].speed).abs() <= 1.0 + 1e-9);
            machines = next;
        }
    }

    #[test]
    fn test_area_monotonic_across_mixed_ticks() {
        let profile = SimulationProfile::default();
        let mut rng = seeded_rng(99);
        let mut machines = fleet_all_running();
        machines[2].status = MachineStatus::Error;
        for i in 0..300 {
            let next = if i % 3 == 0 {
                slow_tick(&machines, &profile, &mut rng)
            } else {
                fast_tick(&machines, &profile, &mut rng)
            };
            for (a, b) in machines.iter().zip(&next) {
                assert!(b.total_area >= a.total_area);
            }
            machines = next;
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let profile = SimulationProfile::default();
        let machines = fleet_all_running();
        let run = |seed| {
            let mut rng = seeded_rng(seed);
            let a = fast_tick(&machines, &profile, &mut rng);
            slow_tick(&a, &profile, &mut rng)
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_step_commits_and_counts() {
        let conf = SimulationConf { seed: Some(8), ..SimulationConf::default() };
        let (writer, reader) = FleetRegistry::new(initial_machines());
        let health = HealthTracker::new();
        let mut sim = Simulator::new(writer, &conf, health.clone());

        sim.step(Cadence::Slow);
        sim.step(Cadence::Fast);
        let snap = reader.snapshot();
        assert_eq!(snap.version, 2);
        assert!(snap.machines[0].total_area > 5610);
        let (fast, slow) = health.tick_counts();
        assert_eq!((fast, slow), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_cadences_and_shutdown() {
        let conf = SimulationConf { seed: Some(21), ..SimulationConf::default() };
        let (writer, reader) = FleetRegistry::new(initial_machines());
        let health = HealthTracker::new();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = Simulator::new(writer, &conf, health.clone()).spawn(stop_rx);

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(health.tick_counts(), (3, 1));
        assert_eq!(reader.snapshot().version, 4);

        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        let version = reader.snapshot().version;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(reader.snapshot().version, version);
    }
}
