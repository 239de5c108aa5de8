//! Equipment CRUD plus the flag/record consistency choreography.
//!
//! Setting or clearing the critical flag and invoking the synchronizer are
//! sequenced here as one logical operation. There is no cross-table
//! transaction: if the second step fails the caller retries the whole
//! operation (synchronize is idempotent, so retries are safe).

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{DbCriticalRecord, DbEquipment, InventoryDb, LookupKind};
use crate::error::ServiceError;
use crate::sync::{synchronize, ReleasePolicy};

/// Incoming payload for create/update (PUT semantics on update).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentInput {
    pub serial: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub responsible: Option<String>,
    pub observations: Option<String>,
    pub category_id: String,
    pub status_id: String,
    pub site_id: String,
    #[serde(rename = "esCritico", default)]
    pub is_critical: bool,
    #[serde(rename = "valorEstimado")]
    pub estimated_value: Option<String>,
    #[serde(rename = "antiguedad")]
    pub age_years: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Equipment plus its linked unresolved critical record, if any.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentDetail {
    pub equipment: DbEquipment,
    pub critical_record: Option<DbCriticalRecord>,
}

fn validate_input(db: &InventoryDb, input: &EquipmentInput, exclude_id: Option<&str>) -> Result<(), ServiceError> {
    if input.serial.trim().is_empty() {
        return Err(ServiceError::Validation("serial is required".to_string()));
    }
    if db.serial_exists(input.serial.trim(), exclude_id)? {
        return Err(ServiceError::Validation(format!(
            "serial {} already exists",
            input.serial.trim()
        )));
    }
    for (kind, id) in [
        (LookupKind::Category, &input.category_id),
        (LookupKind::Status, &input.status_id),
        (LookupKind::Site, &input.site_id),
    ] {
        if db.get_lookup(kind, id)?.is_none() {
            return Err(ServiceError::NotFound(format!("{} {}", kind.label(), id)));
        }
    }
    Ok(())
}

/// Create an equipment record. When it arrives flagged critical, the
/// synchronizer runs immediately after the insert.
pub fn create_equipment(
    db: &InventoryDb,
    input: EquipmentInput,
) -> Result<DbEquipment, ServiceError> {
    validate_input(db, &input, None)?;

    let now = Utc::now().to_rfc3339();
    let equipment = DbEquipment {
        id: Uuid::new_v4().to_string(),
        serial: input.serial.trim().to_string(),
        brand: input.brand,
        model: input.model,
        location: input.location,
        responsible: input.responsible,
        observations: input.observations,
        category_id: input.category_id,
        status_id: input.status_id,
        site_id: input.site_id,
        is_critical: input.is_critical,
        estimated_value: input.estimated_value,
        age_years: input.age_years,
        images: input.images,
        created_at: now.clone(),
        updated_at: now,
        category_name: None,
        status_name: None,
        site_name: None,
    };
    db.insert_equipment(&equipment)?;

    if equipment.is_critical {
        synchronize(db, &equipment.id, true, ReleasePolicy::default())?;
    }

    log::info!("Created equipment {} ({})", equipment.id, equipment.serial);
    // Re-read to pick up joined labels
    Ok(db
        .get_equipment(&equipment.id)?
        .unwrap_or(equipment))
}

/// Full update. A flag change triggers the synchronizer with the caller's
/// release policy.
pub fn update_equipment(
    db: &InventoryDb,
    id: &str,
    input: EquipmentInput,
    policy: ReleasePolicy,
) -> Result<DbEquipment, ServiceError> {
    let existing = db
        .get_equipment(id)?
        .ok_or_else(|| ServiceError::NotFound(format!("equipment {}", id)))?;
    validate_input(db, &input, Some(id))?;

    let updated = DbEquipment {
        id: existing.id.clone(),
        serial: input.serial.trim().to_string(),
        brand: input.brand,
        model: input.model,
        location: input.location,
        responsible: input.responsible,
        observations: input.observations,
        category_id: input.category_id,
        status_id: input.status_id,
        site_id: input.site_id,
        is_critical: input.is_critical,
        estimated_value: input.estimated_value,
        age_years: input.age_years,
        images: input.images,
        created_at: existing.created_at.clone(),
        updated_at: Utc::now().to_rfc3339(),
        category_name: None,
        status_name: None,
        site_name: None,
    };
    db.update_equipment(&updated)?;

    if existing.is_critical != updated.is_critical {
        synchronize(db, id, updated.is_critical, policy)?;
    }

    Ok(db.get_equipment(id)?.unwrap_or(updated))
}

/// Toggle only the critical flag: flag write then synchronize, one logical
/// operation.
pub fn set_critical(
    db: &InventoryDb,
    id: &str,
    desired: bool,
    policy: ReleasePolicy,
) -> Result<EquipmentDetail, ServiceError> {
    if db.get_equipment(id)?.is_none() {
        return Err(ServiceError::NotFound(format!("equipment {}", id)));
    }
    db.set_critical_flag(id, desired)?;
    synchronize(db, id, desired, policy)?;
    get_equipment_detail(db, id)
}

/// Equipment with its linked unresolved critical record.
pub fn get_equipment_detail(db: &InventoryDb, id: &str) -> Result<EquipmentDetail, ServiceError> {
    let equipment = db
        .get_equipment(id)?
        .ok_or_else(|| ServiceError::NotFound(format!("equipment {}", id)))?;
    let critical_record = db.get_unresolved_for_equipment(id)?;
    Ok(EquipmentDetail {
        equipment,
        critical_record,
    })
}

pub fn list_equipment(db: &InventoryDb) -> Result<Vec<DbEquipment>, ServiceError> {
    Ok(db.list_equipment()?)
}

/// Delete an equipment record and everything that references it:
/// maintenance plans and critical records (resolved history included).
/// Dependents go first so the final row delete passes FK enforcement.
pub fn delete_equipment(db: &InventoryDb, id: &str) -> Result<(), ServiceError> {
    if db.get_equipment(id)?.is_none() {
        return Err(ServiceError::NotFound(format!("equipment {}", id)));
    }
    db.delete_plans_for_equipment(id)?;
    db.delete_criticals_for_equipment(id)?;
    db.delete_equipment(id)?;
    log::info!("Deleted equipment {}", id);
    Ok(())
}
