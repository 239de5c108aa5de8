use rusqlite::params;

use super::*;

impl InventoryDb {
    pub(crate) fn map_lookup_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbLookup> {
        Ok(DbLookup {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            sort_order: row.get(3)?,
            active: row.get::<_, i32>(4)? != 0,
        })
    }

    pub fn insert_lookup(&self, kind: LookupKind, row: &DbLookup) -> Result<(), DbError> {
        let sql = format!(
            "INSERT INTO {} (id, name, color, sort_order, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            kind.table()
        );
        self.conn.execute(
            &sql,
            params![row.id, row.name, row.color, row.sort_order, row.active as i32],
        )?;
        Ok(())
    }

    pub fn get_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<DbLookup>, DbError> {
        let sql = format!(
            "SELECT id, name, color, sort_order, active FROM {} WHERE id = ?1",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], Self::map_lookup_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Active rows ordered by sort order then name. `include_inactive`
    /// widens the listing for admin views.
    pub fn list_lookups(
        &self,
        kind: LookupKind,
        include_inactive: bool,
    ) -> Result<Vec<DbLookup>, DbError> {
        let filter = if include_inactive { "" } else { "WHERE active = 1" };
        let sql = format!(
            "SELECT id, name, color, sort_order, active FROM {} {} ORDER BY sort_order, name",
            kind.table(),
            filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_lookup_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Case-insensitive name collision check (category names are unique).
    pub fn lookup_name_exists(
        &self,
        kind: LookupKind,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE LOWER(name) = LOWER(?1) AND id != COALESCE(?2, '')",
            kind.table()
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params![name, exclude_id], |r| r.get(0))?;
        Ok(count > 0)
    }

    /// Soft delete: flip `active` off, keep the row for referencing records.
    pub fn update_lookup(&self, kind: LookupKind, row: &DbLookup) -> Result<bool, DbError> {
        let sql = format!(
            "UPDATE {} SET name = ?2, color = ?3, sort_order = ?4, active = ?5 WHERE id = ?1",
            kind.table()
        );
        let changed = self.conn.execute(
            &sql,
            params![row.id, row.name, row.color, row.sort_order, row.active as i32],
        )?;
        Ok(changed > 0)
    }

    pub fn deactivate_lookup(&self, kind: LookupKind, id: &str) -> Result<bool, DbError> {
        let sql = format!("UPDATE {} SET active = 0 WHERE id = ?1", kind.table());
        let changed = self.conn.execute(&sql, params![id])?;
        Ok(changed > 0)
    }

    /// Default priority for synchronizer-created critical records: the first
    /// active priority level by sort order, if any exist.
    pub fn default_priority_id(&self) -> Result<Option<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM priority_levels WHERE active = 1 ORDER BY sort_order, name LIMIT 1",
        )?;
        let mut rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }
}
