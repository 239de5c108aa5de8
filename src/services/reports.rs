//! Report exports: diagnostics and maintenance CSV, inventory JSON.
//!
//! Each export is recomputed from current store contents on every call.
//! Cell text comes straight from the rows; absent optional values render as
//! empty cells, never as "null".

use chrono::Utc;

use crate::db::InventoryDb;
use crate::error::ServiceError;
use crate::reports::{json_export, CsvExport};

const DIAGNOSTICS_HEADERS: &[&str] = &[
    "Serial",
    "Prioridad",
    "Acción Requerida",
    "Costo Estimado",
    "Fecha Límite",
    "Creado",
];

const MAINTENANCE_HEADERS: &[&str] = &[
    "Serial",
    "Acción",
    "Fecha Programada",
    "Fecha Ejecución",
    "Estado",
    "Presupuesto",
    "Costo Real",
    "Descripción",
];

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

/// Unresolved critical records, earliest deadline first (deadline-less rows
/// last).
pub fn export_diagnostics_csv(db: &InventoryDb) -> Result<CsvExport, ServiceError> {
    let records = db.list_unresolved_by_deadline()?;
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.equipment_serial.clone().unwrap_or_default(),
                r.priority_name.clone().unwrap_or_default(),
                r.action_required.clone(),
                money(r.estimated_cost),
                r.action_deadline.clone().unwrap_or_default(),
                r.created_at.clone(),
            ]
        })
        .collect();
    Ok(CsvExport::new("diagnostico_equipos_criticos", DIAGNOSTICS_HEADERS, &rows, Utc::now()))
}

/// All maintenance plans, newest scheduled date first.
pub fn export_maintenance_csv(db: &InventoryDb) -> Result<CsvExport, ServiceError> {
    let plans = db.list_plans()?;
    let rows: Vec<Vec<String>> = plans
        .iter()
        .map(|p| {
            vec![
                p.equipment_serial.clone().unwrap_or_default(),
                p.action_name.clone().unwrap_or_default(),
                p.scheduled_date.clone(),
                p.executed_date.clone().unwrap_or_default(),
                p.state.as_str().to_string(),
                money(p.budget),
                money(p.actual_cost),
                p.work_description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    Ok(CsvExport::new("reporte_mantenimientos", MAINTENANCE_HEADERS, &rows, Utc::now()))
}

/// Full inventory as flat JSON under the `equipos` key.
pub fn export_inventory_json(db: &InventoryDb) -> Result<serde_json::Value, ServiceError> {
    let equipment = db.list_equipment()?;
    let rows = equipment
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServiceError::Validation(format!("inventory serialization: {}", e)))?;
    Ok(json_export("equipos", rows, Utc::now()))
}
