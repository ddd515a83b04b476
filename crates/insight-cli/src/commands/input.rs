use anyhow::{Context, Result, bail};
use clap::Args;
use insight_core::artifact::{FileFormat, InputArtifact};
use std::path::{Path, PathBuf};

/// Selects the data file to work on.
#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Data file to read
    #[arg(long, value_name = "PATH", conflicts_with = "sample", required_unless_present = "sample")]
    pub path: Option<PathBuf>,

    /// File format (csv, parquet, json); guessed from the extension when omitted
    #[arg(long)]
    pub format: Option<FileFormat>,

    /// The CSV file has no header row
    #[arg(long)]
    pub no_header: bool,

    /// Use the bundled sample file of this format instead of --path
    #[arg(long, value_name = "FORMAT")]
    pub sample: Option<FileFormat>,
}

impl ArtifactArgs {
    pub fn artifact(&self) -> Result<InputArtifact> {
        if let Some(format) = self.sample {
            return Ok(InputArtifact::sample(format));
        }
        let Some(path) = self.path.as_deref() else {
            bail!("Either --path or --sample is required");
        };

        let format = match self.format.or_else(|| FileFormat::from_path(path)) {
            Some(format) => format,
            None => bail!(
                "Cannot tell the format of {}; pass --format",
                path.display()
            ),
        };
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Ok(InputArtifact::uploaded(
            file_name(path),
            format,
            bytes,
            !self.no_header,
        ))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Text given inline or read from a file; empty when neither is given.
pub fn read_text(inline: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => Ok(String::new()),
    }
}

/// Writes `bytes` into `dir`, creating it if needed.
pub fn write_download(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let target = dir.join(file_name);
    std::fs::write(&target, bytes)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(target)
}
