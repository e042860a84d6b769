pub mod analyze;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod load;
pub mod models;
pub mod pipeline;
pub mod transform;
pub mod utils;

pub use error::{PipelineError, Result};
