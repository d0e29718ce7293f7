/**
 * VUES - Rendus en lecture seule du registre machines
 *
 * Chaque vue est une fonction pure d'un snapshot (+ tables statiques et état
 * local : filtre texte, machine sélectionnée). Aucune ne modifie le registre.
 *
 * - dashboard : taux de marche, répartition des statuts, cartes machines
 * - overview  : tableau filtré par sous-chaîne du nom ou du modèle
 * - details   : fiche d'une machine (télémétrie, paramètres, alarmes)
 * - users / devices : tables d'administration en affichage seul
 */

use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::models::{
    Alarm, AlarmStatus, ConsumptionPoint, Machine, MachineStatus, Severity, User, UserStatus,
};
use crate::seed::INK_CONSUMPTION;
use crate::state::FleetSnapshot;

/// Tendance d'efficacité affichée pour les machines en marche (%)
const RUNNING_TREND_PERCENT: f64 = 2.4;

#[derive(Debug, Serialize)]
pub struct StatusSlice {
    pub status: MachineStatus,
    pub label: &'static str,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MachineCard {
    pub id: String,
    pub name: String,
    pub model: String,
    pub image: String,
    pub status: MachineStatus,
    pub status_label: &'static str,
    pub speed: f64,
    pub total_area: u64,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub version: u64,
    pub open_rate: u32,
    pub status_breakdown: Vec<StatusSlice>,
    pub ink_consumption: &'static [ConsumptionPoint],
    pub machines: Vec<MachineCard>,
}

/// Taux de marche : round(100 * en marche / total), 0 pour une flotte vide
pub fn open_rate(machines: &[Machine]) -> u32 {
    if machines.is_empty() {
        return 0;
    }
    let running = machines.iter().filter(|m| m.is_running()).count();
    (100.0 * running as f64 / machines.len() as f64).round() as u32
}

// ordre et couleurs du camembert ; "stopped" n'y figure pas
const BREAKDOWN: [(MachineStatus, &str, &str); 5] = [
    (MachineStatus::Running, "运行", "#10b981"),
    (MachineStatus::Idle, "待机", "#f59e0b"),
    (MachineStatus::Debugging, "调试中", "#3b82f6"),
    (MachineStatus::Warning, "警告", "#f97316"),
    (MachineStatus::Error, "故障", "#ef4444"),
];

pub fn dashboard(snapshot: &FleetSnapshot) -> DashboardView {
    let machines = &snapshot.machines;
    let status_breakdown = BREAKDOWN
        .iter()
        .map(|&(status, label, color)| StatusSlice {
            status,
            label,
            count: machines.iter().filter(|m| m.status == status).count(),
            color,
        })
        .filter(|s| s.count > 0)
        .collect();

    DashboardView {
        version: snapshot.version,
        open_rate: open_rate(machines),
        status_breakdown,
        ink_consumption: &INK_CONSUMPTION,
        machines: machines
            .iter()
            .map(|m| MachineCard {
                id: m.id.clone(),
                name: m.name.clone(),
                model: m.model.clone(),
                image: m.image.clone(),
                status: m.status,
                status_label: m.status.label(),
                speed: m.speed,
                total_area: m.total_area,
                temperature: m.temperature,
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct OverviewRow {
    pub id: String,
    pub name: String,
    pub model: String,
    pub status: MachineStatus,
    pub status_label: &'static str,
    pub speed: f64,
    pub width: String,
    pub total_area: u64,
    pub efficiency_trend: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OverviewView {
    pub query: String,
    pub rows: Vec<OverviewRow>,
}

/// Filtre sensible à la casse sur le nom ou le modèle ; requête vide = tout
pub fn overview(snapshot: &FleetSnapshot, query: &str) -> OverviewView {
    let rows = snapshot
        .machines
        .iter()
        .filter(|m| m.name.contains(query) || m.model.contains(query))
        .map(|m| OverviewRow {
            id: m.id.clone(),
            name: m.name.clone(),
            model: m.model.clone(),
            status: m.status,
            status_label: m.status.label(),
            speed: m.speed,
            width: m.width.clone(),
            total_area: m.total_area,
            efficiency_trend: m.is_running().then_some(RUNNING_TREND_PERCENT),
        })
        .collect();

    OverviewView {
        query: query.to_string(),
        rows,
    }
}

#[derive(Debug, Serialize)]
pub struct MachineTab {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct AlarmRow {
    pub id: String,
    pub time: String,
    pub kind: String,
    pub severity: Severity,
    pub status: AlarmStatus,
    pub status_label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DetailView {
    pub version: u64,
    pub updated_at: String,
    pub selected_id: String,
    /// true quand la sélection demandée est inconnue (repli sur la première machine).
    /// Les alarmes suivent alors la machine affichée, pas l'id demandé.
    pub fell_back: bool,
    pub tabs: Vec<MachineTab>,
    pub status_label: &'static str,
    pub machine: Machine,
    pub alarms: Vec<AlarmRow>,
}

/// Politique de sélection par défaut : la machine demandée si elle existe,
/// sinon la première du registre. None seulement pour une flotte vide.
pub fn select_machine<'a>(machines: &'a [Machine], requested: Option<&str>) -> Option<(&'a Machine, bool)> {
    let first = machines.first()?;
    match requested {
        Some(id) => match machines.iter().find(|m| m.id == id) {
            Some(m) => Some((m, false)),
            None => Some((first, true)),
        },
        None => Some((first, false)),
    }
}

pub fn details(snapshot: &FleetSnapshot, alarms: &[Alarm], requested: Option<&str>) -> Option<DetailView> {
    let (machine, fell_back) = select_machine(&snapshot.machines, requested)?;

    let tabs = snapshot
        .machines
        .iter()
        .map(|m| MachineTab {
            id: m.id.clone(),
            name: m.name.clone(),
            selected: m.id == machine.id,
        })
        .collect();

    let alarms = alarms
        .iter()
        .filter(|a| a.machine_id == machine.id)
        .map(|a| AlarmRow {
            id: a.id.clone(),
            time: a.time.clone(),
            kind: a.kind.clone(),
            severity: a.severity,
            status: a.status,
            status_label: a.status.label(),
        })
        .collect();

    Some(DetailView {
        version: snapshot.version,
        updated_at: snapshot.updated_at.format(&Rfc3339).unwrap_or_default(),
        selected_id: machine.id.clone(),
        fell_back,
        tabs,
        status_label: machine.status.label(),
        machine: machine.clone(),
        alarms,
    })
}

#[derive(Debug, Serialize)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub initials: String,
    pub role: String,
    pub last_login: String,
    pub status: UserStatus,
    pub status_label: &'static str,
}

pub fn users(users: &[User]) -> Vec<UserRow> {
    users
        .iter()
        .map(|u| UserRow {
            id: u.id.clone(),
            username: u.username.clone(),
            initials: u.username.chars().take(2).collect::<String>().to_uppercase(),
            role: u.role.clone(),
            last_login: u.last_login.clone(),
            status: u.status,
            status_label: u.status.label(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct DeviceRow {
    pub id: String,
    pub name: String,
    pub model: String,
    pub status: MachineStatus,
    pub status_label: &'static str,
}

pub fn devices(snapshot: &FleetSnapshot) -> Vec<DeviceRow> {
    snapshot
        .machines
        .iter()
        .map(|m| DeviceRow {
            id: m.id.clone(),
            name: m.name.clone(),
            model: m.model.clone(),
            status: m.status,
            status_label: m.status.label(),
        })
        .collect()
}
