use chrono::Utc;
use rusqlite::params;

use super::*;

const PLAN_SELECT: &str = "SELECT m.id, m.equipment_id, m.action_id, m.scheduled_date,
        m.executed_date, m.state, m.budget, m.actual_cost,
        m.work_description, m.observations, m.ai_analysis,
        m.created_at, m.updated_at,
        e.serial AS equipment_serial, a.name AS action_name
 FROM maintenance_plans m
 LEFT JOIN equipment e ON e.id = m.equipment_id
 LEFT JOIN maintenance_actions a ON a.id = m.action_id";

impl InventoryDb {
    pub(crate) fn map_plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbMaintenancePlan> {
        Ok(DbMaintenancePlan {
            id: row.get(0)?,
            equipment_id: row.get(1)?,
            action_id: row.get(2)?,
            scheduled_date: row.get(3)?,
            executed_date: row.get(4)?,
            state: row.get(5)?,
            budget: row.get(6)?,
            actual_cost: row.get(7)?,
            work_description: row.get(8)?,
            observations: row.get(9)?,
            ai_analysis: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
            equipment_serial: row.get(13)?,
            action_name: row.get(14)?,
        })
    }

    pub fn insert_plan(&self, plan: &DbMaintenancePlan) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO maintenance_plans (
                id, equipment_id, action_id, scheduled_date, executed_date,
                state, budget, actual_cost, work_description, observations,
                ai_analysis, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                plan.id,
                plan.equipment_id,
                plan.action_id,
                plan.scheduled_date,
                plan.executed_date,
                plan.state,
                plan.budget,
                plan.actual_cost,
                plan.work_description,
                plan.observations,
                plan.ai_analysis,
                plan.created_at,
                plan.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_plan(&self, id: &str) -> Result<Option<DbMaintenancePlan>, DbError> {
        let sql = format!("{} WHERE m.id = ?1", PLAN_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], Self::map_plan_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// All plans, scheduled date descending (newest work first). This is the
    /// maintenance-report ordering.
    pub fn list_plans(&self) -> Result<Vec<DbMaintenancePlan>, DbError> {
        let sql = format!("{} ORDER BY m.scheduled_date DESC", PLAN_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_plan_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_plans_for_equipment(
        &self,
        equipment_id: &str,
    ) -> Result<Vec<DbMaintenancePlan>, DbError> {
        let sql = format!(
            "{} WHERE m.equipment_id = ?1 ORDER BY m.scheduled_date DESC",
            PLAN_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![equipment_id], Self::map_plan_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Remove every plan linked to an equipment. Used when the equipment row
    /// itself goes away.
    pub fn delete_plans_for_equipment(&self, equipment_id: &str) -> Result<usize, DbError> {
        let changed = self.conn.execute(
            "DELETE FROM maintenance_plans WHERE equipment_id = ?1",
            params![equipment_id],
        )?;
        Ok(changed)
    }

    /// Execution-state transition: state, execution date, actual cost, and
    /// work observations in one update.
    pub fn update_plan_execution(
        &self,
        id: &str,
        state: PlanState,
        executed_date: Option<&str>,
        actual_cost: Option<f64>,
        observations: Option<&str>,
    ) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE maintenance_plans SET
                state = ?2, executed_date = ?3, actual_cost = ?4,
                observations = COALESCE(?5, observations), updated_at = ?6
             WHERE id = ?1",
            params![id, state, executed_date, actual_cost, observations, now],
        )?;
        Ok(changed > 0)
    }

    /// Persist the structured AI-analysis payload for a plan.
    pub fn set_plan_analysis(&self, id: &str, analysis_json: &str) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE maintenance_plans SET ai_analysis = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, analysis_json, now],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_db;
    use super::*;

    fn sample_plan(id: &str, equipment_id: &str, scheduled: &str) -> DbMaintenancePlan {
        let now = Utc::now().to_rfc3339();
        DbMaintenancePlan {
            id: id.to_string(),
            equipment_id: equipment_id.to_string(),
            action_id: "act-1".to_string(),
            scheduled_date: scheduled.to_string(),
            executed_date: None,
            state: PlanState::Pending,
            budget: Some(200.0),
            actual_cost: None,
            work_description: Some("Mantenimiento preventivo".to_string()),
            observations: None,
            ai_analysis: None,
            created_at: now.clone(),
            updated_at: now,
            equipment_serial: None,
            action_name: None,
        }
    }

    #[test]
    fn test_insert_and_get_plan() {
        let db = test_db();
        db.insert_plan(&sample_plan("mp-1", "eq-1", "2026-09-01"))
            .expect("insert");

        let got = db.get_plan("mp-1").expect("get").expect("row exists");
        assert_eq!(got.state, PlanState::Pending);
        assert_eq!(got.scheduled_date, "2026-09-01");
        assert!(got.executed_date.is_none());
    }

    #[test]
    fn test_list_plans_scheduled_desc() {
        let db = test_db();
        db.insert_plan(&sample_plan("mp-1", "eq-1", "2026-01-15")).expect("insert");
        db.insert_plan(&sample_plan("mp-2", "eq-1", "2026-06-15")).expect("insert");
        db.insert_plan(&sample_plan("mp-3", "eq-2", "2026-03-15")).expect("insert");

        let plans = db.list_plans().expect("list");
        let ids: Vec<&str> = plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["mp-2", "mp-3", "mp-1"]);
    }

    #[test]
    fn test_execution_transition() {
        let db = test_db();
        db.insert_plan(&sample_plan("mp-1", "eq-1", "2026-09-01")).expect("insert");

        assert!(db
            .update_plan_execution(
                "mp-1",
                PlanState::Completed,
                Some("2026-09-02"),
                Some(180.5),
                Some("Sin incidencias"),
            )
            .expect("update"));

        let got = db.get_plan("mp-1").expect("get").unwrap();
        assert_eq!(got.state, PlanState::Completed);
        assert_eq!(got.executed_date.as_deref(), Some("2026-09-02"));
        assert_eq!(got.actual_cost, Some(180.5));
        assert_eq!(got.observations.as_deref(), Some("Sin incidencias"));
    }

    #[test]
    fn test_execution_keeps_observations_when_absent() {
        let db = test_db();
        let mut plan = sample_plan("mp-1", "eq-1", "2026-09-01");
        plan.observations = Some("Nota previa".to_string());
        db.insert_plan(&plan).expect("insert");

        db.update_plan_execution("mp-1", PlanState::InProgress, None, None, None)
            .expect("update");
        let got = db.get_plan("mp-1").expect("get").unwrap();
        assert_eq!(got.observations.as_deref(), Some("Nota previa"));
    }

    #[test]
    fn test_set_plan_analysis() {
        let db = test_db();
        db.insert_plan(&sample_plan("mp-1", "eq-1", "2026-09-01")).expect("insert");

        let payload = r#"{"evaluacion_plan":{"adecuacion":"BUENA","observaciones":"ok"}}"#;
        assert!(db.set_plan_analysis("mp-1", payload).expect("set"));
        let got = db.get_plan("mp-1").expect("get").unwrap();
        assert_eq!(got.ai_analysis.as_deref(), Some(payload));
    }

    #[test]
    fn test_invalid_stored_state_fails_read() {
        let db = test_db();
        db.insert_plan(&sample_plan("mp-1", "eq-1", "2026-09-01")).expect("insert");
        // Bypass the write boundary; the typed read must reject free text.
        db.conn_ref()
            .execute("UPDATE maintenance_plans SET state = 'Cancelado' WHERE id = 'mp-1'", [])
            .expect("raw update");
        assert!(db.get_plan("mp-1").is_err());
    }
}
