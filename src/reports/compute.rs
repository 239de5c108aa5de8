//! Dashboard metrics computation.
//!
//! Pure layer: takes the equipment and maintenance row sets plus the
//! unresolved-critical count and produces a closed, typed `Metrics`
//! structure. Missing or malformed numeric source values count as zero;
//! missing lookup labels group under "Unknown".

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::db::{DbEquipment, DbMaintenancePlan, PlanState};

/// Group label for equipment whose status/category reference didn't resolve.
const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceTotals {
    pub total: usize,
    #[serde(rename = "pendientes")]
    pub pending: usize,
    #[serde(rename = "enProceso")]
    pub in_progress: usize,
    #[serde(rename = "completados")]
    pub completed: usize,
    /// Pending plans whose scheduled date is already past.
    #[serde(rename = "vencidos")]
    pub overdue: usize,
}

/// The computed aggregate consumed by dashboards, prompts, and reports.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    #[serde(rename = "totalEquipos")]
    pub total_equipment: usize,
    #[serde(rename = "valorTotal")]
    pub total_value: f64,
    #[serde(rename = "antiguedadPromedio")]
    pub average_age: f64,
    #[serde(rename = "equiposCriticos")]
    pub critical_count: usize,
    #[serde(rename = "porEstado")]
    pub by_status: HashMap<String, usize>,
    #[serde(rename = "porCategoria")]
    pub by_category: HashMap<String, usize>,
    #[serde(rename = "mantenimientos")]
    pub maintenance: MaintenanceTotals,
}

/// Compute dashboard metrics from current row sets.
pub fn build_metrics(
    equipment: &[DbEquipment],
    plans: &[DbMaintenancePlan],
    critical_count: usize,
    now: DateTime<Utc>,
) -> Metrics {
    let total_equipment = equipment.len();

    let total_value: f64 = equipment
        .iter()
        .map(|e| lenient_number(e.estimated_value.as_deref()))
        .sum();

    // Denominator defaults to 1 so an empty set yields 0, not NaN.
    let age_sum: f64 = equipment
        .iter()
        .map(|e| lenient_number(e.age_years.as_deref()))
        .sum();
    let average_age = age_sum / total_equipment.max(1) as f64;

    let mut by_status: HashMap<String, usize> = HashMap::new();
    let mut by_category: HashMap<String, usize> = HashMap::new();
    for e in equipment {
        let status = e.status_name.as_deref().unwrap_or(UNKNOWN_LABEL);
        let category = e.category_name.as_deref().unwrap_or(UNKNOWN_LABEL);
        *by_status.entry(status.to_string()).or_default() += 1;
        *by_category.entry(category.to_string()).or_default() += 1;
    }

    let mut maintenance = MaintenanceTotals {
        total: plans.len(),
        ..Default::default()
    };
    for plan in plans {
        match plan.state {
            PlanState::Pending => maintenance.pending += 1,
            PlanState::InProgress => maintenance.in_progress += 1,
            PlanState::Completed => maintenance.completed += 1,
        }
        if is_overdue(plan, now) {
            maintenance.overdue += 1;
        }
    }

    Metrics {
        total_equipment,
        total_value,
        average_age,
        critical_count,
        by_status,
        by_category,
        maintenance,
    }
}

/// A plan is overdue when it is still pending and its scheduled date has
/// passed. Unparseable dates never count as overdue.
pub fn is_overdue(plan: &DbMaintenancePlan, now: DateTime<Utc>) -> bool {
    if plan.state != PlanState::Pending {
        return false;
    }
    match parse_flexible_date(&plan.scheduled_date) {
        Some(scheduled) => scheduled < now,
        None => false,
    }
}

/// Parse either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
fn parse_flexible_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Lenient numeric parse: trim, accept plain floats, treat everything else
/// (including `None`) as zero.
fn lenient_number(value: Option<&str>) -> f64 {
    value
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}
