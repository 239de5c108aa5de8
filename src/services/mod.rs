//! Orchestration layer: what a route handler calls.
//!
//! Each function takes the explicitly-passed `InventoryDb` handle (and a
//! `TextGenerator` where AI is involved), validates input, issues the
//! store calls, and returns plain data or a classified `ServiceError`.

pub mod criticals;
pub mod dashboard;
pub mod equipment;
pub mod lookups;
pub mod maintenance;
pub mod reports;
