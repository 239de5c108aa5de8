//! AI prompt construction and response parsing.
//!
//! Two prompt shapes: a dashboard narrative built from `Metrics`, and a
//! maintenance-plan analysis that demands a structured JSON reply. Parsing
//! is JSON-first: locate the first balanced object in the reply (fence
//! aware), attempt a typed parse, and report failure as a discriminated
//! outcome — the raw provider text always survives to the caller.

use serde::{Deserialize, Serialize};

use crate::db::{DbEquipment, DbMaintenancePlan};
use crate::reports::compute::Metrics;

// =============================================================================
// Structured analysis contract
// =============================================================================

/// Plan-adequacy rating in the structured analysis reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Adequacy {
    Excelente,
    Buena,
    Regular,
    Insuficiente,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEvaluation {
    pub adecuacion: Adequacy,
    pub observaciones: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureStep {
    pub paso: u32,
    pub descripcion: String,
    #[serde(default)]
    pub herramientas_requeridas: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentPriority {
    #[serde(rename = "CRÍTICO")]
    Critico,
    #[serde(rename = "OPCIONAL")]
    Opcional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOption {
    pub proveedor: String,
    #[serde(default)]
    pub precio_estimado: Option<f64>,
    #[serde(default)]
    pub enlace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentNeed {
    pub componente: String,
    pub prioridad: ComponentPriority,
    #[serde(default)]
    pub justificacion: Option<String>,
    #[serde(default)]
    pub opciones_compra: Vec<PurchaseOption>,
}

/// The structured maintenance-analysis payload the provider is asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceAnalysis {
    pub evaluacion_plan: PlanEvaluation,
    #[serde(default)]
    pub procedimiento_optimizado: Vec<ProcedureStep>,
    #[serde(default)]
    pub componentes_necesarios: Vec<ComponentNeed>,
}

/// Discriminated parse outcome. `success == false` never aborts the caller;
/// the raw provider text is preserved either way.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    #[serde(rename = "textoOriginal")]
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<MaintenanceAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// Prompt assembly
// =============================================================================

/// Dashboard narrative prompt: computed metrics plus literal instructions.
pub fn build_dashboard_prompt(metrics: &Metrics) -> String {
    let mut status_lines: Vec<String> = metrics
        .by_status
        .iter()
        .map(|(k, v)| format!("  - {}: {}", k, v))
        .collect();
    status_lines.sort();
    let mut category_lines: Vec<String> = metrics
        .by_category
        .iter()
        .map(|(k, v)| format!("  - {}: {}", k, v))
        .collect();
    category_lines.sort();

    format!(
        "Eres un analista de gestión de activos de TI. Analiza el siguiente \
         resumen del inventario y redacta un informe ejecutivo breve en español: \
         estado general del parque, riesgos principales y tres recomendaciones \
         accionables.\n\n\
         Resumen del inventario:\n\
         - Total de equipos: {}\n\
         - Valor total estimado: ${:.2}\n\
         - Antigüedad promedio: {:.1} años\n\
         - Equipos críticos sin resolver: {}\n\
         Distribución por estado:\n{}\n\
         Distribución por categoría:\n{}\n\
         Mantenimientos: {} totales, {} pendientes, {} en proceso, {} completados, {} vencidos.\n\n\
         Responde únicamente con el informe, sin preámbulos.",
        metrics.total_equipment,
        metrics.total_value,
        metrics.average_age,
        metrics.critical_count,
        status_lines.join("\n"),
        category_lines.join("\n"),
        metrics.maintenance.total,
        metrics.maintenance.pending,
        metrics.maintenance.in_progress,
        metrics.maintenance.completed,
        metrics.maintenance.overdue,
    )
}

/// Maintenance-plan analysis prompt demanding the structured JSON contract.
pub fn build_plan_analysis_prompt(plan: &DbMaintenancePlan, equipment: &DbEquipment) -> String {
    let budget = plan
        .budget
        .map(|b| format!("${:.2}", b))
        .unwrap_or_else(|| "no definido".to_string());

    format!(
        "Eres un ingeniero de mantenimiento de equipos de TI. Evalúa el siguiente \
         plan de mantenimiento y responde ÚNICAMENTE con un objeto JSON con esta \
         estructura exacta:\n\
         {{\n\
           \"evaluacion_plan\": {{\"adecuacion\": \"EXCELENTE|BUENA|REGULAR|INSUFICIENTE\", \"observaciones\": \"...\"}},\n\
           \"procedimiento_optimizado\": [{{\"paso\": 1, \"descripcion\": \"...\", \"herramientas_requeridas\": [\"...\"]}}],\n\
           \"componentes_necesarios\": [{{\"componente\": \"...\", \"prioridad\": \"CRÍTICO|OPCIONAL\", \"justificacion\": \"...\", \"opciones_compra\": [{{\"proveedor\": \"...\", \"precio_estimado\": 0, \"enlace\": \"...\"}}]}}]\n\
         }}\n\n\
         Equipo: {} {} (serial {})\n\
         Ubicación: {}\n\
         Acción programada: {}\n\
         Fecha programada: {}\n\
         Presupuesto: {}\n\
         Descripción del trabajo: {}\n\
         Observaciones del equipo: {}",
        equipment.brand.as_deref().unwrap_or("(sin marca)"),
        equipment.model.as_deref().unwrap_or("(sin modelo)"),
        equipment.serial,
        equipment.location.as_deref().unwrap_or("sin registrar"),
        plan.action_name.as_deref().unwrap_or("mantenimiento"),
        plan.scheduled_date,
        budget,
        plan.work_description.as_deref().unwrap_or("sin descripción"),
        equipment.observations.as_deref().unwrap_or("ninguna"),
    )
}

// =============================================================================
// Response parsing
// =============================================================================

/// Extract a JSON object from provider reply text.
/// Handles markdown fences and surrounding prose; falls back to scanning for
/// the first balanced `{...}` span.
pub fn extract_json(response: &str) -> Option<&str> {
    if let Some(start) = response.find("```json") {
        let json_start = start + 7;
        if let Some(end) = response[json_start..].find("```") {
            return Some(response[json_start..json_start + end].trim());
        }
    }

    let trimmed = response.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    // First balanced object embedded in other text, string-literal aware.
    let start = response.find('{')?;
    let candidate = &response[start..];
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    for (i, ch) in candidate.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&candidate[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Attempt the typed parse of a provider reply. Never panics, never drops
/// the raw text.
pub fn parse_analysis(raw: &str) -> AnalysisOutcome {
    let Some(json_str) = extract_json(raw) else {
        return AnalysisOutcome {
            success: false,
            raw_text: raw.to_string(),
            analysis: None,
            error: Some("no JSON object found in response".to_string()),
        };
    };

    match serde_json::from_str::<MaintenanceAnalysis>(json_str) {
        Ok(analysis) => AnalysisOutcome {
            success: true,
            raw_text: raw.to_string(),
            analysis: Some(analysis),
            error: None,
        },
        Err(e) => AnalysisOutcome {
            success: false,
            raw_text: raw.to_string(),
            analysis: None,
            error: Some(format!("analysis JSON did not match contract: {}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::compute::build_metrics;
    use chrono::Utc;

    const VALID_ANALYSIS: &str = r#"{
        "evaluacion_plan": {"adecuacion": "BUENA", "observaciones": "Plan razonable"},
        "procedimiento_optimizado": [
            {"paso": 1, "descripcion": "Apagar el equipo", "herramientas_requeridas": ["destornillador"]},
            {"paso": 2, "descripcion": "Limpiar ventiladores"}
        ],
        "componentes_necesarios": [
            {"componente": "Pasta térmica", "prioridad": "CRÍTICO",
             "opciones_compra": [{"proveedor": "TecnoStore", "precio_estimado": 12.5}]}
        ]
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let outcome = parse_analysis(VALID_ANALYSIS);
        assert!(outcome.success);
        let analysis = outcome.analysis.expect("parsed");
        assert_eq!(analysis.evaluacion_plan.adecuacion, Adequacy::Buena);
        assert_eq!(analysis.procedimiento_optimizado.len(), 2);
        assert_eq!(analysis.procedimiento_optimizado[0].paso, 1);
        assert!(analysis.procedimiento_optimizado[1].herramientas_requeridas.is_empty());
        assert_eq!(
            analysis.componentes_necesarios[0].prioridad,
            ComponentPriority::Critico
        );
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("Aquí está el análisis:\n```json\n{}\n```\nSaludos.", VALID_ANALYSIS);
        let outcome = parse_analysis(&fenced);
        assert!(outcome.success);
        assert_eq!(outcome.raw_text, fenced);
    }

    #[test]
    fn test_parse_embedded_json() {
        let embedded = format!("El plan se ve bien. {} Espero que sirva.", VALID_ANALYSIS);
        let outcome = parse_analysis(&embedded);
        assert!(outcome.success, "embedded object should parse: {:?}", outcome.error);
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_extraction() {
        let tricky = r#"prefix {"evaluacion_plan": {"adecuacion": "REGULAR", "observaciones": "usa {corchetes} y \"comillas\""}} suffix"#;
        let outcome = parse_analysis(tricky);
        assert!(outcome.success, "{:?}", outcome.error);
        assert_eq!(
            outcome.analysis.unwrap().evaluacion_plan.adecuacion,
            Adequacy::Regular
        );
    }

    #[test]
    fn test_unparseable_keeps_raw_text() {
        let garbage = "Lo siento, no puedo generar ese análisis.";
        let outcome = parse_analysis(garbage);
        assert!(!outcome.success);
        assert_eq!(outcome.raw_text, garbage);
        assert!(outcome.analysis.is_none());
        assert!(outcome.error.unwrap().contains("no JSON object"));
    }

    #[test]
    fn test_wrong_shape_reports_contract_error() {
        let wrong = r#"{"evaluacion_plan": {"adecuacion": "PERFECTA", "observaciones": "x"}}"#;
        let outcome = parse_analysis(wrong);
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("contract"));
        assert_eq!(outcome.raw_text, wrong);
    }

    #[test]
    fn test_dashboard_prompt_carries_metrics() {
        let m = build_metrics(&[], &[], 4, Utc::now());
        let prompt = build_dashboard_prompt(&m);
        assert!(prompt.contains("Total de equipos: 0"));
        assert!(prompt.contains("Equipos críticos sin resolver: 4"));
        assert!(prompt.contains("informe ejecutivo"));
    }

    #[test]
    fn test_extract_json_none_for_unbalanced() {
        assert!(extract_json("{ \"a\": 1").is_none());
        assert!(extract_json("plain text").is_none());
    }
}
