//! Aggregation & report building: derived metrics, AI prompt assembly and
//! response parsing, and tabular exports.
//!
//! Everything here is pure computation over row sets — no store access and
//! no persistent state; every result is recomputed from current contents on
//! each invocation.

pub mod compute;
pub mod export;
pub mod prompts;

pub use compute::{build_metrics, MaintenanceTotals, Metrics};
pub use export::{csv_filename, json_export, to_csv, CsvExport, CSV_MIME};
pub use prompts::{
    build_dashboard_prompt, build_plan_analysis_prompt, extract_json, parse_analysis,
    Adequacy, AnalysisOutcome, ComponentNeed, ComponentPriority, MaintenanceAnalysis,
    PlanEvaluation, ProcedureStep, PurchaseOption,
};
