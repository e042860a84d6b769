pub mod constants;
pub mod latest;
pub mod progress;

pub use latest::latest_matching;
