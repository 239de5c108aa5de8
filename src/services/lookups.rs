//! Lookup-table management (categories, statuses, sites, priority levels,
//! maintenance actions). All five tables share one shape, so one set of
//! operations covers them, keyed by `LookupKind`.

use serde::Deserialize;
use uuid::Uuid;

use crate::db::{DbLookup, InventoryDb, LookupKind};
use crate::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupInput {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

/// Create a lookup value. Names are unique per table, case-insensitively.
pub fn create_lookup(
    db: &InventoryDb,
    kind: LookupKind,
    input: LookupInput,
) -> Result<DbLookup, ServiceError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation(format!(
            "{} name is required",
            kind.label()
        )));
    }
    if db.lookup_name_exists(kind, name, None)? {
        return Err(ServiceError::Validation(format!(
            "{} '{}' already exists",
            kind.label(),
            name
        )));
    }

    let row = DbLookup {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        color: input.color,
        sort_order: input.sort_order,
        active: true,
    };
    db.insert_lookup(kind, &row)?;
    log::info!("Created {} '{}'", kind.label(), row.name);
    Ok(row)
}

/// Rename or restyle a lookup value. The unique-name rule still applies,
/// excluding the row being edited.
pub fn update_lookup(
    db: &InventoryDb,
    kind: LookupKind,
    id: &str,
    input: LookupInput,
) -> Result<DbLookup, ServiceError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation(format!(
            "{} name is required",
            kind.label()
        )));
    }
    let existing = db
        .get_lookup(kind, id)?
        .ok_or_else(|| ServiceError::NotFound(format!("{} {}", kind.label(), id)))?;
    if db.lookup_name_exists(kind, name, Some(id))? {
        return Err(ServiceError::Validation(format!(
            "{} '{}' already exists",
            kind.label(),
            name
        )));
    }

    let row = DbLookup {
        id: existing.id,
        name: name.to_string(),
        color: input.color,
        sort_order: input.sort_order,
        active: existing.active,
    };
    db.update_lookup(kind, &row)?;
    Ok(row)
}

pub fn list_lookups(
    db: &InventoryDb,
    kind: LookupKind,
    include_inactive: bool,
) -> Result<Vec<DbLookup>, ServiceError> {
    Ok(db.list_lookups(kind, include_inactive)?)
}

/// Soft-delete: the value stops appearing in active listings but rows that
/// reference it keep resolving their labels.
pub fn deactivate_lookup(
    db: &InventoryDb,
    kind: LookupKind,
    id: &str,
) -> Result<(), ServiceError> {
    if !db.deactivate_lookup(kind, id)? {
        return Err(ServiceError::NotFound(format!("{} {}", kind.label(), id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;

    fn input(name: &str) -> LookupInput {
        LookupInput {
            name: name.to_string(),
            color: Some("#336699".to_string()),
            sort_order: 0,
        }
    }

    #[test]
    fn test_create_and_list() {
        let db = test_db();
        let created = create_lookup(&db, LookupKind::Category, input("Laptop")).expect("create");
        assert!(created.active);

        let listed = list_lookups(&db, LookupKind::Category, false).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Laptop");
    }

    #[test]
    fn test_duplicate_name_case_insensitive() {
        let db = test_db();
        create_lookup(&db, LookupKind::Site, input("Sede Central")).expect("first");
        let err = create_lookup(&db, LookupKind::Site, input("SEDE CENTRAL")).expect_err("dup");
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_update_keeps_own_name_but_rejects_taken_one() {
        let db = test_db();
        let a = create_lookup(&db, LookupKind::Category, input("Laptop")).expect("a");
        create_lookup(&db, LookupKind::Category, input("Monitor")).expect("b");

        // Re-saving under its own name is fine.
        let updated = update_lookup(&db, LookupKind::Category, &a.id, input("laptop"))
            .expect("rename to own name");
        assert_eq!(updated.name, "laptop");

        let err = update_lookup(&db, LookupKind::Category, &a.id, input("Monitor"))
            .expect_err("taken name");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_same_name_allowed_across_kinds() {
        let db = test_db();
        create_lookup(&db, LookupKind::Category, input("General")).expect("category");
        create_lookup(&db, LookupKind::Status, input("General")).expect("status");
    }

    #[test]
    fn test_blank_name_rejected() {
        let db = test_db();
        let err = create_lookup(&db, LookupKind::Status, input("  ")).expect_err("blank");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_deactivate_hides_from_active_listing() {
        let db = test_db();
        let created = create_lookup(&db, LookupKind::MaintenanceAction, input("Limpieza"))
            .expect("create");
        deactivate_lookup(&db, LookupKind::MaintenanceAction, &created.id).expect("deactivate");

        assert!(list_lookups(&db, LookupKind::MaintenanceAction, false)
            .expect("active list")
            .is_empty());
        assert_eq!(
            list_lookups(&db, LookupKind::MaintenanceAction, true)
                .expect("full list")
                .len(),
            1
        );
    }

    #[test]
    fn test_deactivate_unknown_is_not_found() {
        let db = test_db();
        let err = deactivate_lookup(&db, LookupKind::Category, "ghost").expect_err("unknown");
        assert_eq!(err.status_code(), 404);
    }
}
