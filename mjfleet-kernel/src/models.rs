/**
 * MODÈLES - Structures de données de la flotte d'imprimantes
 *
 * RÔLE : Machine, ordres de fabrication, maintenance, alarmes, utilisateurs.
 * Tous les statuts sont des enums sérialisés en minuscules ("running", "pending"...)
 * avec un libellé d'affichage tel qu'il apparaît dans le tableau de bord.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Running,
    Idle,
    Stopped,
    Warning,
    Error,
    Debugging,
}

impl MachineStatus {
    pub fn label(self) -> &'static str {
        match self {
            MachineStatus::Running => "运行中",
            MachineStatus::Idle => "待机",
            MachineStatus::Stopped => "停机",
            MachineStatus::Warning => "警告",
            MachineStatus::Error => "故障",
            MachineStatus::Debugging => "调试中",
        }
    }
}

/// Valeur d'un paramètre machine : numérique (bruitée par le simulateur) ou texte libre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineParameter {
    pub name: String,
    pub value: ParamValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderStatus {
    Pending,
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub product: String,
    pub quantity: u32,
    pub status: WorkOrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStatus {
    Completed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: String,
    pub date: String,
    pub category: String,
    pub technician: String,
    pub description: String,
    pub status: MaintenanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub model: String,
    pub image: String,
    pub width: String,              // libellé, ex: "2500x1300mm"
    pub status: MachineStatus,
    pub speed: f64,                 // m/min
    pub temperature: f64,           // °C
    pub humidity: f64,              // %
    pub voltage: f64,               // V
    pub open_rate: f64,             // %
    pub output_hourly: u32,         // pièces/heure
    pub total_area: u64,            // m², cumulatif
    pub params: Vec<MachineParameter>,
    pub work_orders: Vec<WorkOrder>,
    pub maintenance_log: Vec<MaintenanceRecord>,
}

impl Machine {
    pub fn is_running(&self) -> bool {
        self.status == MachineStatus::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    Resolved,
    Pending,
}

impl AlarmStatus {
    pub fn label(self) -> &'static str {
        match self {
            AlarmStatus::Resolved => "已处理",
            AlarmStatus::Pending => "未处理",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Alarme historique. `machine_id` est une clé de recherche, pas une référence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub machine_id: String,
    pub time: String,
    pub kind: String,
    pub status: AlarmStatus,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
}

impl UserStatus {
    pub fn label(self) -> &'static str {
        match self {
            UserStatus::Active => "正常",
            UserStatus::Disabled => "禁用",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: String,
    pub last_login: String,
    pub status: UserStatus,
}

/// Point de la série mensuelle de consommation d'encre (litres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumptionPoint {
    pub month: &'static str,
    pub liters: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&MachineStatus::Debugging).unwrap();
        assert_eq!(json, "\"debugging\"");
        let back: MachineStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(back, MachineStatus::Running);
    }

    #[test]
    fn test_param_value_untagged() {
        let p: MachineParameter =
            serde_json::from_str(r#"{"name":"电流","value":30,"unit":"A"}"#).unwrap();
        assert_eq!(p.value, ParamValue::Number(30.0));

        let p: MachineParameter = serde_json::from_str(r#"{"name":"负压系统","value":"波动"}"#).unwrap();
        assert_eq!(p.value, ParamValue::Text("波动".into()));
        assert!(p.unit.is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(MachineStatus::Stopped.label(), "停机");
        assert_eq!(AlarmStatus::Pending.label(), "未处理");
        assert_eq!(UserStatus::Disabled.label(), "禁用");
    }
}
