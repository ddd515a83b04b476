use super::input::ArtifactArgs;
use crate::Cli;
use anyhow::Result;
use clap::Args;
use insight_infrastructure::{FileTableParser, load_config};

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: ArtifactArgs,

    /// Maximum number of characters printed
    #[arg(long, default_value_t = 2000)]
    pub max_chars: usize,
}

/// Parses and prints the table. Needs neither a token nor network access.
pub fn run(cli: &Cli, args: &PreviewArgs) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let artifact = args.input.artifact()?;

    match artifact.load(&FileTableParser::new(), &config.sample_dir) {
        Ok(table) => {
            println!("{}", table.to_text_preview(args.max_chars));
            println!(
                "\n{} rows x {} columns",
                table.row_count(),
                table.column_count()
            );
        }
        Err(err) if err.is_not_found() => {
            tracing::warn!(error = %err, "Sample data unavailable");
            eprintln!("Warning: {err}");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
