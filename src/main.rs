use airq_pipeline::cli::{run, Cli};
use airq_pipeline::error::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
