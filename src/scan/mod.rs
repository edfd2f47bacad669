//! File scanning workflow.

pub mod workflow;

pub use workflow::{run_scan, ScanOrchestrator};
