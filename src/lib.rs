//! Inventrack core: IT-asset inventory with critical-equipment tracking,
//! maintenance planning, derived dashboard metrics, and AI-generated
//! reports.
//!
//! Layering, bottom up:
//! - `db`: SQLite store and typed row structs
//! - `sync`: the flag/record consistency synchronizer
//! - `reports`: pure metrics computation, prompt assembly, exports
//! - `genai`: the `TextGenerator` seam and the Gemini client
//! - `services`: orchestration entry points a transport adapter calls

pub mod db;
pub mod error;
mod migrations;
pub mod genai;
pub mod reports;
pub mod services;
pub mod sync;

pub use db::InventoryDb;
pub use error::ServiceError;
