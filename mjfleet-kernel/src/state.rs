/**
 * REGISTRE MACHINES - Source unique de vérité de la flotte
 *
 * Un seul écrivain (le simulateur, qui possède le FleetWriter) et N lecteurs.
 * Chaque commit remplace le snapshot complet : un lecteur ne voit jamais
 * une machine à moitié mise à jour.
 */

use parking_lot::Mutex;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::models::Machine;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// État complet et immuable du registre à un instant donné
#[derive(Debug)]
pub struct FleetSnapshot {
    pub version: u64,
    pub updated_at: OffsetDateTime,
    pub machines: Vec<Machine>,
}

impl FleetSnapshot {
    pub fn get(&self, id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == id)
    }
}

pub struct FleetRegistry;

impl FleetRegistry {
    /// Crée le registre à partir des données initiales (version 0)
    pub fn new(seed: Vec<Machine>) -> (FleetWriter, FleetReader) {
        let initial = Arc::new(FleetSnapshot {
            version: 0,
            updated_at: OffsetDateTime::now_utc(),
            machines: seed,
        });
        let (tx, rx) = watch::channel(initial);
        (FleetWriter { tx }, FleetReader { rx })
    }
}

/// Handle d'écriture unique ; volontairement non clonable
pub struct FleetWriter {
    tx: watch::Sender<Arc<FleetSnapshot>>,
}

impl FleetWriter {
    pub fn current(&self) -> Arc<FleetSnapshot> {
        self.tx.borrow().clone()
    }

    /// Remplace la séquence entière de machines et publie le nouveau snapshot
    pub fn commit(&self, machines: Vec<Machine>) -> Arc<FleetSnapshot> {
        let next = Arc::new(FleetSnapshot {
            version: self.tx.borrow().version + 1,
            updated_at: OffsetDateTime::now_utc(),
            machines,
        });
        // send_replace publie même sans lecteur abonné
        self.tx.send_replace(next.clone());
        next
    }
}

#[derive(Clone)]
pub struct FleetReader {
    rx: watch::Receiver<Arc<FleetSnapshot>>,
}

impl FleetReader {
    /// Dernier snapshot commité, sans attente
    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FleetSnapshot>> {
        self.rx.clone()
    }
}
