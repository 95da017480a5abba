use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};

mod batch;

#[derive(Debug, clap::Parser)]
#[command(
    name = "pdf-outline",
    version,
    about = "Extract a JSON table of contents from PDF documents"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Extract the outline of a single PDF and print it as JSON
    Extract {
        /// Path to the PDF file
        path: PathBuf,
    },
    /// Process every PDF in a directory, writing one JSON file per input
    Batch {
        /// Directory containing the input PDFs
        #[arg(long, env = "PDF_OUTLINE_INPUT_DIR")]
        input_dir: PathBuf,
        /// Directory the JSON results are written to (created if absent)
        #[arg(long, env = "PDF_OUTLINE_OUTPUT_DIR")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        Commands::Extract { path } => {
            let result = outline::extract_outline_from_path(&path).map_err(|e| eyre!(e))?;
            anstream::println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Batch {
            input_dir,
            output_dir,
        } => batch::run(&input_dir, &output_dir),
    }
}
