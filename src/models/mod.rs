pub mod air_quality;
pub mod city;
pub mod load_report;

pub use air_quality::{AqiCategory, HourlySeries, RiskFlag, SinkRecord, StagedRow};
pub use city::City;
pub use load_report::{LoadOutcome, LoadStatus};
