//! Command-line entry point over the service layer.
//!
//! Opens the store at the default location and runs a single operation:
//!
//!   inventrack metrics                 print dashboard metrics as JSON
//!   inventrack export-criticals        print the critical-diagnostics CSV
//!   inventrack export-maintenance      print the maintenance-report CSV
//!   inventrack export-inventory        print the inventory JSON export
//!   inventrack analyze-dashboard       AI executive summary (needs GEMINI_API_KEY)
//!   inventrack analyze-plan <plan-id>  AI plan analysis (needs GEMINI_API_KEY)

use std::process::ExitCode;

use inventrack::genai::GeminiClient;
use inventrack::services::{dashboard, maintenance, reports};
use inventrack::InventoryDb;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("");

    match run(command, &args[1.min(args.len())..]).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("inventrack: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &str, rest: &[String]) -> Result<String, String> {
    let db = InventoryDb::open().map_err(|e| e.to_string())?;

    match command {
        "metrics" => {
            let metrics = dashboard::dashboard_metrics(&db).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&metrics).map_err(|e| e.to_string())
        }
        "export-criticals" => {
            let export = reports::export_diagnostics_csv(&db).map_err(|e| e.to_string())?;
            Ok(export.content)
        }
        "export-maintenance" => {
            let export = reports::export_maintenance_csv(&db).map_err(|e| e.to_string())?;
            Ok(export.content)
        }
        "export-inventory" => {
            let export = reports::export_inventory_json(&db).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&export).map_err(|e| e.to_string())
        }
        "analyze-dashboard" => {
            let generator = GeminiClient::from_env().map_err(|e| e.to_string())?;
            let analysis = dashboard::generate_dashboard_analysis(&db, &generator)
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&analysis).map_err(|e| e.to_string())
        }
        "analyze-plan" => {
            let plan_id = rest
                .first()
                .ok_or_else(|| "usage: inventrack analyze-plan <plan-id>".to_string())?;
            let generator = GeminiClient::from_env().map_err(|e| e.to_string())?;
            let outcome = maintenance::analyze_plan(&db, &generator, plan_id)
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&outcome).map_err(|e| e.to_string())
        }
        "" => Err("missing command (metrics, export-criticals, export-maintenance, \
                   export-inventory, analyze-dashboard, analyze-plan)"
            .to_string()),
        other => Err(format!("unknown command '{}'", other)),
    }
}
