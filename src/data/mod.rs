//! Data layer
//!
//! Record model, the filter engine and pagination over the in-memory
//! record set, plus CSV import/export and dashboard aggregation.

pub mod csv_import;
pub mod dashboard;
pub mod data_exporter;
pub mod filter;
pub mod pagination;
pub mod record;
