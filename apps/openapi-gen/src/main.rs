//! Offline OpenAPI 3.1 generator.
//!
//! Boots the API state with in-process backends to prove the router
//! constructs, introspects the domain sources, and writes the document.

mod config;
mod emitter;
mod error;
mod parser;
mod routes;
mod schema;

use clap::Parser;
use config::GeneratorConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "openapi-gen", about = "Generate the API's OpenAPI 3.1 document")]
struct Cli {
    /// Generator configuration file.
    #[arg(long, default_value = "config_files/openapi_generation.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = GeneratorConfig::load(&cli.config)?;

    // If the catalog and the handlers ever disagree, this panics here
    // instead of shipping a document for a router that cannot start.
    let state = api::AppState::neutralized().await?;
    let _ = api::build_router(state);

    let parsed = parser::parse_sources(&config.source_directories)?;
    let document = emitter::build_document(&config, &parsed)?;
    let yaml = serde_yaml_ng::to_string(&document)?;
    std::fs::write(&config.output_file, &yaml)?;

    println!(
        "wrote {} ({} paths, {} schemas)",
        config.output_file.display(),
        document.paths.len(),
        document.components.schemas.len(),
    );
    Ok(())
}
