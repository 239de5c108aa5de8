//! Maintenance-plan lifecycle: scheduling, execution, and AI analysis.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{DbMaintenancePlan, InventoryDb, LookupKind, PlanState};
use crate::error::ServiceError;
use crate::genai::TextGenerator;
use crate::reports::{build_plan_analysis_prompt, parse_analysis, AnalysisOutcome};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub equipment_id: String,
    pub action_id: String,
    #[serde(rename = "fechaProgramada")]
    pub scheduled_date: String,
    #[serde(default)]
    pub budget: Option<f64>,
    pub work_description: Option<String>,
    pub observations: Option<String>,
    /// Wire-format state label; absent means "Pendiente".
    #[serde(rename = "estado", default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionInput {
    /// Wire-format state label, validated against the closed set.
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "fechaEjecucion")]
    pub executed_date: Option<String>,
    pub actual_cost: Option<f64>,
    pub observations: Option<String>,
}

fn parse_state(label: &str) -> Result<PlanState, ServiceError> {
    PlanState::parse(label).ok_or_else(|| {
        ServiceError::Validation(format!(
            "unknown state '{}' (expected Pendiente, En Proceso or Completado)",
            label
        ))
    })
}

/// Schedule a plan. The state defaults to Pendiente; anything outside the
/// closed set is rejected before it can reach storage.
pub fn create_plan(db: &InventoryDb, input: PlanInput) -> Result<DbMaintenancePlan, ServiceError> {
    if input.scheduled_date.trim().is_empty() {
        return Err(ServiceError::Validation(
            "scheduled date is required".to_string(),
        ));
    }
    if db.get_equipment(&input.equipment_id)?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "equipment {}",
            input.equipment_id
        )));
    }
    if db
        .get_lookup(LookupKind::MaintenanceAction, &input.action_id)?
        .is_none()
    {
        return Err(ServiceError::NotFound(format!(
            "maintenance action {}",
            input.action_id
        )));
    }
    let state = match input.state.as_deref() {
        Some(label) => parse_state(label)?,
        None => PlanState::Pending,
    };

    let now = Utc::now().to_rfc3339();
    let plan = DbMaintenancePlan {
        id: Uuid::new_v4().to_string(),
        equipment_id: input.equipment_id,
        action_id: input.action_id,
        scheduled_date: input.scheduled_date.trim().to_string(),
        executed_date: None,
        state,
        budget: input.budget,
        actual_cost: None,
        work_description: input.work_description,
        observations: input.observations,
        ai_analysis: None,
        created_at: now.clone(),
        updated_at: now,
        equipment_serial: None,
        action_name: None,
    };
    db.insert_plan(&plan)?;
    log::info!("Scheduled maintenance plan {} for {}", plan.id, plan.equipment_id);
    Ok(db.get_plan(&plan.id)?.unwrap_or(plan))
}

/// Record an execution-state transition.
pub fn record_execution(
    db: &InventoryDb,
    plan_id: &str,
    input: ExecutionInput,
) -> Result<DbMaintenancePlan, ServiceError> {
    let state = parse_state(&input.state)?;
    let updated = db.update_plan_execution(
        plan_id,
        state,
        input.executed_date.as_deref(),
        input.actual_cost,
        input.observations.as_deref(),
    )?;
    if !updated {
        return Err(ServiceError::NotFound(format!("maintenance plan {}", plan_id)));
    }
    db.get_plan(plan_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("maintenance plan {}", plan_id)))
}

pub fn get_plan(db: &InventoryDb, plan_id: &str) -> Result<DbMaintenancePlan, ServiceError> {
    db.get_plan(plan_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("maintenance plan {}", plan_id)))
}

pub fn list_plans(db: &InventoryDb) -> Result<Vec<DbMaintenancePlan>, ServiceError> {
    Ok(db.list_plans()?)
}

pub fn list_plans_for_equipment(
    db: &InventoryDb,
    equipment_id: &str,
) -> Result<Vec<DbMaintenancePlan>, ServiceError> {
    Ok(db.list_plans_for_equipment(equipment_id)?)
}

/// Run the structured AI analysis for a plan.
///
/// Generation or parse failures come back as a `success: false` outcome with
/// the raw text preserved; only storage faults and unknown ids are errors.
/// On a successful parse the typed payload is persisted on the plan.
pub async fn analyze_plan(
    db: &InventoryDb,
    generator: &dyn TextGenerator,
    plan_id: &str,
) -> Result<AnalysisOutcome, ServiceError> {
    let plan = get_plan(db, plan_id)?;
    let equipment = db
        .get_equipment(&plan.equipment_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("equipment {}", plan.equipment_id)))?;

    let prompt = build_plan_analysis_prompt(&plan, &equipment);
    let raw = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Plan analysis generation failed for {}: {}", plan_id, e);
            return Ok(AnalysisOutcome {
                success: false,
                raw_text: String::new(),
                analysis: None,
                error: Some(e.to_string()),
            });
        }
    };

    let outcome = parse_analysis(&raw);
    if let Some(analysis) = &outcome.analysis {
        let json = serde_json::to_string(analysis)
            .map_err(|e| ServiceError::Validation(format!("analysis serialization: {}", e)))?;
        db.set_plan_analysis(plan_id, &json)?;
        log::info!("Stored analysis for plan {}", plan_id);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{sample_equipment, seed_lookups, test_db};
    use crate::genai::GenerationError;
    use async_trait::async_trait;

    struct CannedGenerator(Result<String, ()>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(GenerationError::EmptyResponse),
            }
        }
    }

    fn setup() -> (InventoryDb, String, String) {
        let db = test_db();
        let (cat, status, site, _, action) = seed_lookups(&db);
        let equipment = sample_equipment("eq-1", "SN-1", &cat, &status, &site);
        db.insert_equipment(&equipment).expect("insert equipment");
        (db, "eq-1".to_string(), action)
    }

    fn plan_input(equipment_id: &str, action_id: &str) -> PlanInput {
        PlanInput {
            equipment_id: equipment_id.to_string(),
            action_id: action_id.to_string(),
            scheduled_date: "2026-09-01".to_string(),
            budget: Some(150.0),
            work_description: Some("Limpieza interna".to_string()),
            observations: None,
            state: None,
        }
    }

    #[test]
    fn test_create_defaults_to_pending() {
        let (db, eq, action) = setup();
        let plan = create_plan(&db, plan_input(&eq, &action)).expect("create");
        assert_eq!(plan.state, PlanState::Pending);
        assert_eq!(plan.equipment_serial.as_deref(), Some("SN-1"));
    }

    #[test]
    fn test_create_rejects_unknown_state() {
        let (db, eq, action) = setup();
        let mut input = plan_input(&eq, &action);
        input.state = Some("Cancelado".to_string());
        let err = create_plan(&db, input).expect_err("invalid state");
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("Cancelado"));
    }

    #[test]
    fn test_create_rejects_missing_equipment() {
        let (db, _, action) = setup();
        let err = create_plan(&db, plan_input("ghost", &action)).expect_err("missing equipment");
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_execution_transition_and_unknown_state() {
        let (db, eq, action) = setup();
        let plan = create_plan(&db, plan_input(&eq, &action)).expect("create");

        let err = record_execution(
            &db,
            &plan.id,
            ExecutionInput {
                state: "Terminado".to_string(),
                executed_date: None,
                actual_cost: None,
                observations: None,
            },
        )
        .expect_err("unknown state");
        assert_eq!(err.status_code(), 400);

        let updated = record_execution(
            &db,
            &plan.id,
            ExecutionInput {
                state: "Completado".to_string(),
                executed_date: Some("2026-09-02".to_string()),
                actual_cost: Some(140.0),
                observations: Some("Sin incidencias".to_string()),
            },
        )
        .expect("transition");
        assert_eq!(updated.state, PlanState::Completed);
        assert_eq!(updated.actual_cost, Some(140.0));
    }

    #[test]
    fn test_execution_unknown_plan_is_not_found() {
        let (db, _, _) = setup();
        let err = record_execution(
            &db,
            "ghost",
            ExecutionInput {
                state: "Pendiente".to_string(),
                executed_date: None,
                actual_cost: None,
                observations: None,
            },
        )
        .expect_err("unknown plan");
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_analyze_persists_on_success() {
        let (db, eq, action) = setup();
        let plan = create_plan(&db, plan_input(&eq, &action)).expect("create");

        let reply = r#"{"evaluacion_plan": {"adecuacion": "BUENA", "observaciones": "ok"}}"#;
        let generator = CannedGenerator(Ok(reply.to_string()));
        let outcome = analyze_plan(&db, &generator, &plan.id).await.expect("analyze");
        assert!(outcome.success);

        let stored = get_plan(&db, &plan.id).expect("reload");
        let json = stored.ai_analysis.expect("persisted analysis");
        assert!(json.contains("BUENA"));
    }

    #[tokio::test]
    async fn test_analyze_parse_failure_is_outcome_not_error() {
        let (db, eq, action) = setup();
        let plan = create_plan(&db, plan_input(&eq, &action)).expect("create");

        let generator = CannedGenerator(Ok("No puedo ayudarte con eso.".to_string()));
        let outcome = analyze_plan(&db, &generator, &plan.id).await.expect("analyze");
        assert!(!outcome.success);
        assert_eq!(outcome.raw_text, "No puedo ayudarte con eso.");
        assert!(get_plan(&db, &plan.id).expect("reload").ai_analysis.is_none());
    }

    #[tokio::test]
    async fn test_analyze_generation_failure_is_outcome_not_error() {
        let (db, eq, action) = setup();
        let plan = create_plan(&db, plan_input(&eq, &action)).expect("create");

        let generator = CannedGenerator(Err(()));
        let outcome = analyze_plan(&db, &generator, &plan.id).await.expect("analyze");
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_analyze_unknown_plan_is_error() {
        let (db, _, _) = setup();
        let generator = CannedGenerator(Ok("{}".to_string()));
        let err = analyze_plan(&db, &generator, "ghost").await.expect_err("unknown plan");
        assert_eq!(err.status_code(), 404);
    }
}
