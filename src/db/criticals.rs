use chrono::Utc;
use rusqlite::params;

use super::*;

const CRITICAL_SELECT: &str = "SELECT r.id, r.equipment_id, r.priority_id, r.action_required,
        r.estimated_cost, r.action_deadline, r.resolved,
        r.resolution_notes, r.resolved_at, r.created_at, r.updated_at,
        e.serial AS equipment_serial, p.name AS priority_name
 FROM critical_records r
 LEFT JOIN equipment e ON e.id = r.equipment_id
 LEFT JOIN priority_levels p ON p.id = r.priority_id";

impl InventoryDb {
    pub(crate) fn map_critical_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbCriticalRecord> {
        Ok(DbCriticalRecord {
            id: row.get(0)?,
            equipment_id: row.get(1)?,
            priority_id: row.get(2)?,
            action_required: row.get(3)?,
            estimated_cost: row.get(4)?,
            action_deadline: row.get(5)?,
            resolved: row.get::<_, i32>(6)? != 0,
            resolution_notes: row.get(7)?,
            resolved_at: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            equipment_serial: row.get(11)?,
            priority_name: row.get(12)?,
        })
    }

    /// Insert a critical record. The partial unique index rejects a second
    /// unresolved record for the same equipment.
    pub fn insert_critical(&self, rec: &DbCriticalRecord) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO critical_records (
                id, equipment_id, priority_id, action_required, estimated_cost,
                action_deadline, resolved, resolution_notes, resolved_at,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                rec.id,
                rec.equipment_id,
                rec.priority_id,
                rec.action_required,
                rec.estimated_cost,
                rec.action_deadline,
                rec.resolved as i32,
                rec.resolution_notes,
                rec.resolved_at,
                rec.created_at,
                rec.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_critical(&self, id: &str) -> Result<Option<DbCriticalRecord>, DbError> {
        let sql = format!("{} WHERE r.id = ?1", CRITICAL_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], Self::map_critical_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// The unresolved record linked to an equipment, if any.
    pub fn get_unresolved_for_equipment(
        &self,
        equipment_id: &str,
    ) -> Result<Option<DbCriticalRecord>, DbError> {
        let sql = format!(
            "{} WHERE r.equipment_id = ?1 AND r.resolved = 0",
            CRITICAL_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![equipment_id], Self::map_critical_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Remove the unresolved record for an equipment. Returns whether a row
    /// was deleted.
    pub fn delete_unresolved_for_equipment(&self, equipment_id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM critical_records WHERE equipment_id = ?1 AND resolved = 0",
            params![equipment_id],
        )?;
        Ok(changed > 0)
    }

    /// Remove every record (resolved included) linked to an equipment.
    /// Used when the equipment row itself goes away.
    pub fn delete_criticals_for_equipment(&self, equipment_id: &str) -> Result<usize, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM critical_records WHERE equipment_id = ?1",
            params![equipment_id],
        )?;
        Ok(changed)
    }

    /// Routine content-field update on an existing record. Existence
    /// (create/delete) stays with the synchronizer.
    pub fn update_critical_fields(
        &self,
        id: &str,
        priority_id: Option<&str>,
        action_required: &str,
        estimated_cost: Option<f64>,
        action_deadline: Option<&str>,
    ) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE critical_records SET
                priority_id = ?2, action_required = ?3, estimated_cost = ?4,
                action_deadline = ?5, updated_at = ?6
             WHERE id = ?1",
            params![id, priority_id, action_required, estimated_cost, action_deadline, now],
        )?;
        Ok(changed > 0)
    }

    /// Mark a record resolved with optional notes.
    pub fn resolve_critical(&self, id: &str, notes: Option<&str>) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE critical_records SET
                resolved = 1, resolution_notes = ?2, resolved_at = ?3, updated_at = ?3
             WHERE id = ?1 AND resolved = 0",
            params![id, notes, now],
        )?;
        Ok(changed > 0)
    }

    /// Unresolved records ordered by action deadline ascending (no deadline
    /// sorts last). This is the diagnostics-report ordering.
    pub fn list_unresolved_by_deadline(&self) -> Result<Vec<DbCriticalRecord>, DbError> {
        let sql = format!(
            "{} WHERE r.resolved = 0
             ORDER BY r.action_deadline IS NULL, r.action_deadline ASC",
            CRITICAL_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_critical_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Count of unresolved records across all equipment.
    pub fn count_unresolved(&self) -> Result<usize, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM critical_records WHERE resolved = 0",
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }
}
