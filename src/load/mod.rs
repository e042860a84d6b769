pub mod batch_loader;
pub mod sink;
pub mod staged_reader;

pub use batch_loader::BatchLoader;
pub use sink::{SinkClient, SupabaseSink};
pub use staged_reader::StagedReader;
