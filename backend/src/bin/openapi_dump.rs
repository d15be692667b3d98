//! Print the journal API's OpenAPI document as pretty JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use backend::ApiDoc;
use clap::Parser;
use color_eyre::eyre::WrapErr;
use utoipa::OpenApi;

/// `openapi-dump` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "openapi-dump",
    about = "Write the journal API OpenAPI document",
    version
)]
struct CliArgs {
    /// Write to this file instead of standard output.
    #[arg(long, short, value_name = "path")]
    output: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let document = ApiDoc::openapi().to_pretty_json()?;
    match args.output {
        Some(path) => fs::write(&path, document)
            .wrap_err_with(|| format!("writing {}", path.display()))?,
        None => writeln!(io::stdout().lock(), "{document}")?,
    }
    Ok(())
}
