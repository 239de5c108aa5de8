//! Dashboard aggregation and the AI executive summary.

use chrono::Utc;
use serde::Serialize;

use crate::db::InventoryDb;
use crate::error::ServiceError;
use crate::genai::TextGenerator;
use crate::reports::{build_dashboard_prompt, build_metrics, Metrics};

/// Narrative-report outcome. Generation failure never aborts the caller; the
/// metrics that fed the prompt are always included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalysis {
    pub success: bool,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Current inventory metrics, computed from a fresh read of the store.
pub fn dashboard_metrics(db: &InventoryDb) -> Result<Metrics, ServiceError> {
    let equipment = db.list_equipment()?;
    let plans = db.list_plans()?;
    let critical_count = db.count_unresolved()?;
    Ok(build_metrics(&equipment, &plans, critical_count, Utc::now()))
}

/// Metrics plus an AI-written executive summary in Spanish.
pub async fn generate_dashboard_analysis(
    db: &InventoryDb,
    generator: &dyn TextGenerator,
) -> Result<DashboardAnalysis, ServiceError> {
    let metrics = dashboard_metrics(db)?;
    let prompt = build_dashboard_prompt(&metrics);

    match generator.generate(&prompt).await {
        Ok(narrative) => Ok(DashboardAnalysis {
            success: true,
            metrics,
            narrative: Some(narrative),
            error: None,
        }),
        Err(e) => {
            log::warn!("Dashboard narrative generation failed: {}", e);
            Ok(DashboardAnalysis {
                success: false,
                metrics,
                narrative: None,
                error: Some(e.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{sample_equipment, seed_lookups, test_db};
    use crate::genai::GenerationError;
    use crate::services::equipment::{create_equipment, set_critical, EquipmentInput};
    use crate::sync::ReleasePolicy;
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

    #[test]
    fn test_metrics_reflect_store_contents() {
        let db = test_db();
        let (cat, status, site, _, _) = seed_lookups(&db);

        let mut eq = sample_equipment("eq-1", "SN-1", &cat, &status, &site);
        eq.estimated_value = Some("1000".to_string());
        db.insert_equipment(&eq).expect("insert");
        db.insert_equipment(&sample_equipment("eq-2", "SN-2", &cat, &status, &site))
            .expect("insert");
        set_critical(&db, "eq-1", true, ReleasePolicy::Delete).expect("flag");

        let metrics = dashboard_metrics(&db).expect("metrics");
        assert_eq!(metrics.total_equipment, 2);
        assert_eq!(metrics.critical_count, 1);
        assert_eq!(metrics.by_category.get("Laptop"), Some(&2));
    }

    #[tokio::test]
    async fn test_narrative_success() {
        let db = test_db();
        let generator = CannedGenerator(Ok("El parque está en buen estado.".to_string()));
        let out = generate_dashboard_analysis(&db, &generator).await.expect("generate");
        assert!(out.success);
        assert_eq!(out.narrative.as_deref(), Some("El parque está en buen estado."));
        assert_eq!(out.metrics.total_equipment, 0);
    }

    #[tokio::test]
    async fn test_narrative_failure_keeps_metrics() {
        let db = test_db();
        let (cat, status, site, _, _) = seed_lookups(&db);
        create_equipment(
            &db,
            EquipmentInput {
                serial: "SN-1".to_string(),
                brand: None,
                model: None,
                location: None,
                responsible: None,
                observations: None,
                category_id: cat,
                status_id: status,
                site_id: site,
                is_critical: false,
                estimated_value: None,
                age_years: None,
                images: Vec::new(),
            },
        )
        .expect("create");

        let generator = CannedGenerator(Err(()));
        let out = generate_dashboard_analysis(&db, &generator).await.expect("generate");
        assert!(!out.success);
        assert!(out.narrative.is_none());
        assert!(out.error.is_some());
        assert_eq!(out.metrics.total_equipment, 1);
    }
}
