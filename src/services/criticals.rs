//! Critical-record triage: editing the open record's fields and closing it
//! with resolution notes.
//!
//! Record existence stays with the synchronizer; this module only mutates
//! records that already exist.

use serde::Deserialize;

use crate::db::{DbCriticalRecord, InventoryDb, LookupKind};
use crate::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalUpdateInput {
    #[serde(default)]
    pub priority_id: Option<String>,
    #[serde(rename = "accionRequerida")]
    pub action_required: String,
    #[serde(rename = "costoEstimado", default)]
    pub estimated_cost: Option<f64>,
    #[serde(rename = "fechaLimite", default)]
    pub action_deadline: Option<String>,
}

/// Unresolved records, earliest deadline first. The diagnostics work queue.
pub fn list_open_records(db: &InventoryDb) -> Result<Vec<DbCriticalRecord>, ServiceError> {
    Ok(db.list_unresolved_by_deadline()?)
}

/// Edit the triage fields of an open record.
pub fn update_record(
    db: &InventoryDb,
    record_id: &str,
    input: CriticalUpdateInput,
) -> Result<(), ServiceError> {
    let action = input.action_required.trim();
    if action.is_empty() {
        return Err(ServiceError::Validation(
            "action required text must not be empty".to_string(),
        ));
    }
    if let Some(priority_id) = input.priority_id.as_deref() {
        if db.get_lookup(LookupKind::PriorityLevel, priority_id)?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "priority level {}",
                priority_id
            )));
        }
    }
    let changed = db.update_critical_fields(
        record_id,
        input.priority_id.as_deref(),
        action,
        input.estimated_cost,
        input.action_deadline.as_deref(),
    )?;
    if !changed {
        return Err(ServiceError::NotFound(format!("critical record {}", record_id)));
    }
    Ok(())
}

/// Close an open record with resolution notes and drop the equipment's
/// critical flag so flag and record stay in step. Resolving an
/// already-resolved record reports not-found rather than silently
/// overwriting the original notes.
pub fn resolve_record(
    db: &InventoryDb,
    record_id: &str,
    notes: Option<&str>,
) -> Result<(), ServiceError> {
    let record = db
        .get_critical(record_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("critical record {}", record_id)))?;
    if !db.resolve_critical(record_id, notes)? {
        return Err(ServiceError::NotFound(format!("critical record {}", record_id)));
    }
    db.set_critical_flag(&record.equipment_id, false)?;
    log::info!(
        "Resolved critical record {} for equipment {}",
        record_id,
        record.equipment_id
    );
    Ok(())
}
