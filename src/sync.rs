//! Critical-record consistency synchronizer.
//!
//! Enforces the existence side of the invariant: an equipment's
//! `is_critical` flag is true iff exactly one unresolved critical record
//! references it. The synchronizer is the sole writer of record existence
//! (create/delete); routine field updates on an existing record go through
//! `InventoryDb::update_critical_fields` directly.
//!
//! The synchronizer never touches `equipment.is_critical` itself. Callers
//! sequence "set flag" and "synchronize" as one logical operation; there is
//! no cross-table transaction, so a failure between the two steps leaves an
//! inconsistency window the caller closes by retrying (at-least-once).

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{DbCriticalRecord, DbError, InventoryDb};

/// Placeholder action text for synchronizer-created records, pending triage.
const DEFAULT_ACTION_REQUIRED: &str = "Pendiente de evaluación";

/// What to do with an unresolved critical record when the flag goes false.
///
/// The two behaviors both exist in the product today: hard delete for
/// flag-driven cleanup, retain for workflows where a technician must close
/// the record manually with resolution notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleasePolicy {
    #[default]
    Delete,
    Retain,
}

/// What a synchronize call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Flag true, no record existed: one was created.
    Created,
    /// Flag true, an unresolved record already existed: no-op.
    AlreadyPresent,
    /// Flag false, the unresolved record was deleted.
    Removed,
    /// Flag false, record left for manual resolution (Retain policy).
    Retained,
    /// Flag false, nothing to remove: no-op.
    NoRecord,
}

/// Synchronize failure carrying the underlying store cause.
#[derive(Debug, Error)]
#[error("critical-record sync failed for equipment {equipment_id}: {source}")]
pub struct SyncFailure {
    pub equipment_id: String,
    #[source]
    pub source: DbError,
}

/// Bring the critical-record existence in line with `desired_critical`.
/// Idempotent in both directions.
pub fn synchronize(
    db: &InventoryDb,
    equipment_id: &str,
    desired_critical: bool,
    policy: ReleasePolicy,
) -> Result<SyncOutcome, SyncFailure> {
    let fail = |source: DbError| SyncFailure {
        equipment_id: equipment_id.to_string(),
        source,
    };

    let existing = db
        .get_unresolved_for_equipment(equipment_id)
        .map_err(fail)?;

    let outcome = match (desired_critical, existing) {
        (true, Some(_)) => SyncOutcome::AlreadyPresent,
        (true, None) => {
            let priority_id = db.default_priority_id().map_err(fail)?;
            let now = Utc::now().to_rfc3339();
            let record = DbCriticalRecord {
                id: Uuid::new_v4().to_string(),
                equipment_id: equipment_id.to_string(),
                priority_id,
                action_required: DEFAULT_ACTION_REQUIRED.to_string(),
                estimated_cost: None,
                action_deadline: None,
                resolved: false,
                resolution_notes: None,
                resolved_at: None,
                created_at: now.clone(),
                updated_at: now,
                equipment_serial: None,
                priority_name: None,
            };
            db.insert_critical(&record).map_err(fail)?;
            log::info!("Created critical record for equipment {}", equipment_id);
            SyncOutcome::Created
        }
        (false, Some(record)) => match policy {
            ReleasePolicy::Delete => {
                db.delete_unresolved_for_equipment(equipment_id)
                    .map_err(fail)?;
                log::info!(
                    "Removed critical record {} for equipment {}",
                    record.id,
                    equipment_id
                );
                SyncOutcome::Removed
            }
            ReleasePolicy::Retain => {
                log::info!(
                    "Retaining critical record {} for equipment {} pending manual resolution",
                    record.id,
                    equipment_id
                );
                SyncOutcome::Retained
            }
        },
        (false, None) => SyncOutcome::NoRecord,
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{sample_equipment, seed_lookups, test_db};

    fn setup() -> (InventoryDb, String) {
        let db = test_db();
        let (cat, status, site, _, _) = seed_lookups(&db);
        let eq = sample_equipment("eq-1", "SN-001", &cat, &status, &site);
        db.insert_equipment(&eq).expect("insert equipment");
        (db, "eq-1".to_string())
    }

    #[test]
    fn test_mark_critical_creates_record() {
        let (db, id) = setup();
        let outcome = synchronize(&db, &id, true, ReleasePolicy::Delete).expect("sync");
        assert_eq!(outcome, SyncOutcome::Created);

        let rec = db
            .get_unresolved_for_equipment(&id)
            .expect("query")
            .expect("record exists");
        assert!(!rec.resolved);
        assert_eq!(rec.action_required, "Pendiente de evaluación");
        assert_eq!(rec.priority_id.as_deref(), Some("priority_levels-1"));
    }

    #[test]
    fn test_idempotent_true() {
        let (db, id) = setup();
        synchronize(&db, &id, true, ReleasePolicy::Delete).expect("first");
        let outcome = synchronize(&db, &id, true, ReleasePolicy::Delete).expect("second");
        assert_eq!(outcome, SyncOutcome::AlreadyPresent);
        assert_eq!(db.count_unresolved().expect("count"), 1);
    }

    #[test]
    fn test_unmark_deletes_record() {
        let (db, id) = setup();
        synchronize(&db, &id, true, ReleasePolicy::Delete).expect("mark");
        let outcome = synchronize(&db, &id, false, ReleasePolicy::Delete).expect("unmark");
        assert_eq!(outcome, SyncOutcome::Removed);
        assert!(db.get_unresolved_for_equipment(&id).expect("query").is_none());
    }

    #[test]
    fn test_idempotent_false() {
        let (db, id) = setup();
        let outcome = synchronize(&db, &id, false, ReleasePolicy::Delete).expect("sync");
        assert_eq!(outcome, SyncOutcome::NoRecord);
    }

    #[test]
    fn test_retain_policy_keeps_record() {
        let (db, id) = setup();
        synchronize(&db, &id, true, ReleasePolicy::Retain).expect("mark");
        let outcome = synchronize(&db, &id, false, ReleasePolicy::Retain).expect("unmark");
        assert_eq!(outcome, SyncOutcome::Retained);
        assert!(db.get_unresolved_for_equipment(&id).expect("query").is_some());
    }

    #[test]
    fn test_no_default_priority_still_creates() {
        let db = test_db();
        // No lookups seeded at all
        let outcome = synchronize(&db, "eq-x", true, ReleasePolicy::Delete).expect("sync");
        assert_eq!(outcome, SyncOutcome::Created);
        let rec = db.get_unresolved_for_equipment("eq-x").expect("query").unwrap();
        assert!(rec.priority_id.is_none());
    }

    #[test]
    fn test_resolved_record_does_not_block_new_one() {
        let (db, id) = setup();
        synchronize(&db, &id, true, ReleasePolicy::Delete).expect("mark");
        let rec = db.get_unresolved_for_equipment(&id).expect("query").unwrap();
        db.resolve_critical(&rec.id, Some("Reparado")).expect("resolve");

        // Equipment goes critical again later: a fresh record is created.
        let outcome = synchronize(&db, &id, true, ReleasePolicy::Delete).expect("re-mark");
        assert_eq!(outcome, SyncOutcome::Created);
        assert_eq!(db.count_unresolved().expect("count"), 1);
    }
}
