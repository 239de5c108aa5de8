use chrono::Utc;
use rusqlite::params;

use super::*;

const EQUIPMENT_SELECT: &str = "SELECT e.id, e.serial, e.brand, e.model, e.location,
        e.responsible, e.observations, e.category_id, e.status_id, e.site_id,
        e.is_critical, e.estimated_value, e.age_years, e.images,
        e.created_at, e.updated_at,
        c.name AS category_name, s.name AS status_name, t.name AS site_name
 FROM equipment e
 LEFT JOIN categories c ON c.id = e.category_id
 LEFT JOIN statuses s ON s.id = e.status_id
 LEFT JOIN sites t ON t.id = e.site_id";

impl InventoryDb {
    /// Helper: map a joined row to `DbEquipment`.
    pub(crate) fn map_equipment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbEquipment> {
        let images_json: String = row.get(13)?;
        Ok(DbEquipment {
            id: row.get(0)?,
            serial: row.get(1)?,
            brand: row.get(2)?,
            model: row.get(3)?,
            location: row.get(4)?,
            responsible: row.get(5)?,
            observations: row.get(6)?,
            category_id: row.get(7)?,
            status_id: row.get(8)?,
            site_id: row.get(9)?,
            is_critical: row.get::<_, i32>(10)? != 0,
            estimated_value: row.get(11)?,
            age_years: row.get(12)?,
            images: serde_json::from_str(&images_json).unwrap_or_default(),
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
            category_name: row.get(16)?,
            status_name: row.get(17)?,
            site_name: row.get(18)?,
        })
    }

    /// Insert a new equipment row.
    pub fn insert_equipment(&self, eq: &DbEquipment) -> Result<(), DbError> {
        let images_json = serde_json::to_string(&eq.images).unwrap_or_else(|_| "[]".to_string());
        self.conn.execute(
            "INSERT INTO equipment (
                id, serial, brand, model, location, responsible, observations,
                category_id, status_id, site_id, is_critical,
                estimated_value, age_years, images, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                eq.id,
                eq.serial,
                eq.brand,
                eq.model,
                eq.location,
                eq.responsible,
                eq.observations,
                eq.category_id,
                eq.status_id,
                eq.site_id,
                eq.is_critical as i32,
                eq.estimated_value,
                eq.age_years,
                images_json,
                eq.created_at,
                eq.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get one equipment row by id, with lookup labels joined.
    pub fn get_equipment(&self, id: &str) -> Result<Option<DbEquipment>, DbError> {
        let sql = format!("{} WHERE e.id = ?1", EQUIPMENT_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], Self::map_equipment_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Check whether a serial is already taken by a different row.
    pub fn serial_exists(&self, serial: &str, exclude_id: Option<&str>) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM equipment WHERE serial = ?1 AND id != COALESCE(?2, '')",
            params![serial, exclude_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    /// All equipment, newest first, with lookup labels joined.
    pub fn list_equipment(&self) -> Result<Vec<DbEquipment>, DbError> {
        let sql = format!("{} ORDER BY e.created_at DESC", EQUIPMENT_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_equipment_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Full-row update (PUT semantics). Timestamps the change.
    pub fn update_equipment(&self, eq: &DbEquipment) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let images_json = serde_json::to_string(&eq.images).unwrap_or_else(|_| "[]".to_string());
        let changed = self.conn.execute(
            "UPDATE equipment SET
                serial = ?2, brand = ?3, model = ?4, location = ?5,
                responsible = ?6, observations = ?7, category_id = ?8,
                status_id = ?9, site_id = ?10, is_critical = ?11,
                estimated_value = ?12, age_years = ?13, images = ?14,
                updated_at = ?15
             WHERE id = ?1",
            params![
                eq.id,
                eq.serial,
                eq.brand,
                eq.model,
                eq.location,
                eq.responsible,
                eq.observations,
                eq.category_id,
                eq.status_id,
                eq.site_id,
                eq.is_critical as i32,
                eq.estimated_value,
                eq.age_years,
                images_json,
                now,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Flip only the critical flag. The caller follows up with
    /// `sync::synchronize` — the two steps form one logical operation.
    pub fn set_critical_flag(&self, id: &str, critical: bool) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE equipment SET is_critical = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, critical as i32, now],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_equipment(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM equipment WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
