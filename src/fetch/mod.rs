pub mod client;
pub mod fetcher;
pub mod raw_writer;

pub use client::{AirQualityApi, OpenMeteoClient};
pub use fetcher::Fetcher;
pub use raw_writer::RawWriter;
