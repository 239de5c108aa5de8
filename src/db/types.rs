//! Row types and the storage error for the inventory database.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

// ============================================================================
// Maintenance plan execution state
// ============================================================================

/// Closed execution-state enumeration for maintenance plans.
///
/// The wire values are the Spanish labels spreadsheet importers and the
/// frontend already depend on. Unrecognized strings are rejected at the
/// write boundary rather than stored as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanState {
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "En Proceso")]
    InProgress,
    #[serde(rename = "Completado")]
    Completed,
}

impl PlanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanState::Pending => "Pendiente",
            PlanState::InProgress => "En Proceso",
            PlanState::Completed => "Completado",
        }
    }

    /// Parse a wire-format state label. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Pendiente" => Some(PlanState::Pending),
            "En Proceso" => Some(PlanState::InProgress),
            "Completado" => Some(PlanState::Completed),
            _ => None,
        }
    }
}

impl FromSql for PlanState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        PlanState::parse(s).ok_or(FromSqlError::InvalidType)
    }
}

impl ToSql for PlanState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

// ============================================================================
// Rows
// ============================================================================

/// A row from the `equipment` table, with lookup labels joined in on reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEquipment {
    pub id: String,
    pub serial: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub responsible: Option<String>,
    pub observations: Option<String>,
    pub category_id: String,
    pub status_id: String,
    pub site_id: String,
    #[serde(rename = "esCritico")]
    pub is_critical: bool,
    /// Lenient numeric: may hold non-numeric source data, treated as 0 in metrics.
    #[serde(rename = "valorEstimado")]
    pub estimated_value: Option<String>,
    #[serde(rename = "antiguedad")]
    pub age_years: Option<String>,
    pub images: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Joined label, populated on reads only.
    pub category_name: Option<String>,
    pub status_name: Option<String>,
    pub site_name: Option<String>,
}

/// A row from the `critical_records` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCriticalRecord {
    pub id: String,
    pub equipment_id: String,
    pub priority_id: Option<String>,
    #[serde(rename = "accionRequerida")]
    pub action_required: String,
    #[serde(rename = "costoEstimado")]
    pub estimated_cost: Option<f64>,
    #[serde(rename = "fechaLimite")]
    pub action_deadline: Option<String>,
    #[serde(rename = "resuelto")]
    pub resolved: bool,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Joined labels, populated on reads only.
    pub equipment_serial: Option<String>,
    pub priority_name: Option<String>,
}

/// A row from the `maintenance_plans` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbMaintenancePlan {
    pub id: String,
    pub equipment_id: String,
    pub action_id: String,
    #[serde(rename = "fechaProgramada")]
    pub scheduled_date: String,
    #[serde(rename = "fechaEjecucion")]
    pub executed_date: Option<String>,
    #[serde(rename = "estado")]
    pub state: PlanState,
    pub budget: Option<f64>,
    pub actual_cost: Option<f64>,
    pub work_description: Option<String>,
    pub observations: Option<String>,
    /// Structured AI-analysis payload (serialized JSON), when generated.
    pub ai_analysis: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Joined labels, populated on reads only.
    pub equipment_serial: Option<String>,
    pub action_name: Option<String>,
}

// ============================================================================
// Lookups
// ============================================================================

/// Which lookup table an operation targets. Table names are resolved through
/// this enum so callers never pass raw SQL identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Category,
    Status,
    Site,
    PriorityLevel,
    MaintenanceAction,
}

impl LookupKind {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            LookupKind::Category => "categories",
            LookupKind::Status => "statuses",
            LookupKind::Site => "sites",
            LookupKind::PriorityLevel => "priority_levels",
            LookupKind::MaintenanceAction => "maintenance_actions",
        }
    }

    /// Human-readable singular label for error messages.
    pub fn label(&self) -> &'static str {
        match self {
            LookupKind::Category => "category",
            LookupKind::Status => "status",
            LookupKind::Site => "site",
            LookupKind::PriorityLevel => "priority level",
            LookupKind::MaintenanceAction => "maintenance action",
        }
    }
}

/// A named, optionally colored/ordered lookup row with soft-delete flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbLookup {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub sort_order: i64,
    pub active: bool,
}
