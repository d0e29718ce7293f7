/**
 * SEED - Données initiales de la flotte
 *
 * 4 machines (m4 en tête, seule en production), alarmes et utilisateurs statiques.
 * Chargées une fois au démarrage ; alarmes et utilisateurs ne sont jamais
 * synchronisés avec le registre machines.
 */

use crate::models::{
    Alarm, AlarmStatus, ConsumptionPoint, Machine, MachineParameter, MachineStatus,
    MaintenanceRecord, MaintenanceStatus, ParamValue, Severity, User, UserStatus, WorkOrder,
    WorkOrderStatus,
};

fn num(name: &str, value: f64, unit: &str) -> MachineParameter {
    MachineParameter {
        name: name.into(),
        value: ParamValue::Number(value),
        unit: Some(unit.into()),
    }
}

fn text(name: &str, value: &str) -> MachineParameter {
    MachineParameter {
        name: name.into(),
        value: ParamValue::Text(value.into()),
        unit: None,
    }
}

fn order(id: &str, product: &str, quantity: u32, status: WorkOrderStatus) -> WorkOrder {
    WorkOrder {
        id: id.into(),
        product: product.into(),
        quantity,
        status,
    }
}

fn record(
    id: &str,
    date: &str,
    category: &str,
    technician: &str,
    description: &str,
    status: MaintenanceStatus,
) -> MaintenanceRecord {
    MaintenanceRecord {
        id: id.into(),
        date: date.into(),
        category: category.into(),
        technician: technician.into(),
        description: description.into(),
        status,
    }
}

pub fn initial_machines() -> Vec<Machine> {
    use MaintenanceStatus as Ms;
    use WorkOrderStatus as Wo;

    vec![
        Machine {
            id: "m4".into(),
            name: "UV扫描式平板喷墨机".into(),
            model: "MJ-UV-Flat".into(),
            image: "https://s21.ax1x.com/2025/11/20/pZFm6nf.png".into(),
            width: "2500x1300mm".into(),
            status: MachineStatus::Running,
            speed: 25.60,
            temperature: 35.0,
            humidity: 40.0,
            voltage: 220.0,
            open_rate: 60.0,
            output_hourly: 150,
            total_area: 5610,
            params: vec![
                num("电流", 30.0, "A"),
                num("电压", 220.0, "V"),
                num("墨路压力", -3.0, "kPa"),
                text("负压系统", "波动"),
            ],
            work_orders: vec![
                order("WO-2025-033", "亚克力板", 500, Wo::Pending),
                order("WO-2025-032", "手机外壳", 2000, Wo::Completed),
            ],
            maintenance_log: vec![
                record("MR-401", "2025-11-17", "紧急维修", "周工", "检查负压泵异常波动", Ms::Pending),
                record("MR-402", "2025-10-05", "更换配件", "吴工", "更换X轴光栅尺", Ms::Completed),
            ],
        },
        Machine {
            id: "m1".into(),
            name: "数码标签机".into(),
            model: "MJ-L1000".into(),
            image: "https://s21.ax1x.com/2025/11/20/pZFmsjP.png".into(),
            width: "330mm".into(),
            status: MachineStatus::Debugging,
            speed: 0.0,
            temperature: 42.0,
            humidity: 55.0,
            voltage: 220.0,
            open_rate: 92.0,
            output_hourly: 0,
            total_area: 15420,
            params: vec![
                num("电流", 45.0, "A"),
                num("电压", 220.0, "V"),
                num("墨路压力", -3.5, "kPa"),
                num("UV功率", 0.0, "%"),
            ],
            work_orders: vec![
                order("WO-2025-001", "食品标签", 50000, Wo::Processing),
                order("WO-2025-002", "饮料标贴", 30000, Wo::Pending),
            ],
            maintenance_log: vec![
                record("MR-101", "2025-10-15", "常规保养", "张工", "更换UV灯管，清洁喷头", Ms::Completed),
                record("MR-102", "2025-09-10", "故障维修", "李工", "修复输纸带偏差", Ms::Completed),
            ],
        },
        Machine {
            id: "m2".into(),
            name: "陶瓷通过式喷墨机D8".into(),
            model: "MJ-C-D8".into(),
            image: "https://s21.ax1x.com/2025/11/20/pZFmwhd.jpg".into(),
            width: "800mm".into(),
            status: MachineStatus::Debugging,
            speed: 0.0,
            temperature: 45.0,
            humidity: 60.0,
            voltage: 380.0,
            open_rate: 88.0,
            output_hourly: 0,
            total_area: 28900,
            params: vec![
                num("电流", 60.0, "A"),
                num("电压", 380.0, "V"),
                num("墨路压力", -4.2, "kPa"),
                text("清洗状态", "调试"),
            ],
            work_orders: vec![
                order("WO-2025-015", "地砖 800x800", 2000, Wo::Processing),
                order("WO-2025-014", "墙砖 400x800", 5000, Wo::Completed),
            ],
            maintenance_log: vec![
                record("MR-201", "2025-11-01", "系统升级", "王工", "控制软件版本升级至v3.5", Ms::Completed),
                record("MR-202", "2025-08-20", "季度保养", "赵工", "墨路系统全面清洗", Ms::Completed),
            ],
        },
        Machine {
            id: "m3".into(),
            name: "陶瓷通过式喷墨机D10".into(),
            model: "MJ-C-D10".into(),
            image: "https://s21.ax1x.com/2025/11/20/pZFmB9A.jpg".into(),
            width: "1000mm".into(),
            status: MachineStatus::Debugging,
            speed: 0.0,
            temperature: 28.0,
            humidity: 45.0,
            voltage: 380.0,
            open_rate: 75.0,
            output_hourly: 0,
            total_area: 12500,
            params: vec![
                num("电流", 0.0, "A"),
                num("电压", 380.0, "V"),
                num("墨路压力", -4.0, "kPa"),
                num("待机时长", 2.5, "h"),
            ],
            work_orders: vec![order("WO-2025-021", "岩板 1200x2400", 1000, Wo::Pending)],
            maintenance_log: vec![record(
                "MR-301",
                "2025-11-10",
                "例行检查",
                "孙工",
                "检查皮带张力，校准传感器",
                Ms::Completed,
            )],
        },
    ]
}

fn alarm(id: &str, machine_id: &str, time: &str, kind: &str, severity: Severity) -> Alarm {
    Alarm {
        id: id.into(),
        machine_id: machine_id.into(),
        time: time.into(),
        kind: kind.into(),
        status: AlarmStatus::Resolved,
        severity,
    }
}

pub fn initial_alarms() -> Vec<Alarm> {
    vec![
        alarm("a1", "m4", "2025-11-17 10:30", "UV灯温度过高", Severity::Medium),
        alarm("a2", "m2", "2025-11-17 09:15", "墨路压力波动", Severity::Medium),
        alarm("a3", "m1", "2025-11-16 14:20", "网络延迟", Severity::Low),
        alarm("a4", "m4", "2025-11-17 11:05", "负压异常", Severity::High),
    ]
}

fn user(id: &str, username: &str, role: &str, last_login: &str, status: UserStatus) -> User {
    User {
        id: id.into(),
        username: username.into(),
        role: role.into(),
        last_login: last_login.into(),
        status,
    }
}

pub fn initial_users() -> Vec<User> {
    vec![
        user("u1", "admin", "系统管理员", "2025-11-17 09:45", UserStatus::Active),
        user("u2", "operator_wang", "操作员", "2025-11-17 08:00", UserStatus::Active),
        user("u3", "manager_li", "生产主管", "2025-11-16 17:30", UserStatus::Active),
        user("u4", "guest", "访客", "2025-11-10 10:00", UserStatus::Disabled),
    ]
}

/// Consommation d'encre mensuelle affichée par le tableau de bord (11 mois)
pub static INK_CONSUMPTION: [ConsumptionPoint; 11] = [
    ConsumptionPoint { month: "1月", liters: 4000 },
    ConsumptionPoint { month: "2月", liters: 3000 },
    ConsumptionPoint { month: "3月", liters: 5000 },
    ConsumptionPoint { month: "4月", liters: 4500 },
    ConsumptionPoint { month: "5月", liters: 6000 },
    ConsumptionPoint { month: "6月", liters: 5500 },
    ConsumptionPoint { month: "7月", liters: 6200 },
    ConsumptionPoint { month: "8月", liters: 6100 },
    ConsumptionPoint { month: "9月", liters: 7000 },
    ConsumptionPoint { month: "10月", liters: 7500 },
    ConsumptionPoint { month: "11月", liters: 7200 },
];
