//! File-system services for the strategy generator.

pub mod report_store;

pub use report_store::ReportStore;
