//! Convert command - rewrite a movie in another profile

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

use inputreel_core::MovieFormat;
use inputreel_core::movie::{load_document, save_document};

/// Writable movie profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetFormat {
    Text,
    Binary,
}

impl From<TargetFormat> for MovieFormat {
    fn from(format: TargetFormat) -> Self {
        match format {
            TargetFormat::Text => MovieFormat::Text,
            TargetFormat::Binary => MovieFormat::Binary,
        }
    }
}

/// Arguments for the convert command
#[derive(Args)]
pub struct ConvertArgs {
    /// Source movie
    pub input: PathBuf,

    /// Destination movie
    pub output: PathBuf,

    /// Output profile (defaults to the output extension)
    #[arg(short, long, value_enum)]
    pub format: Option<TargetFormat>,

    /// Write the binary profile without LZ4 compression
    #[arg(long)]
    pub no_compress: bool,
}

/// Convert `input` to `output`, returning the profile written
pub fn convert(
    input: &Path,
    output: &Path,
    format: Option<TargetFormat>,
    compress: bool,
) -> Result<MovieFormat> {
    let source = MovieFormat::detect(input)?;
    if source == MovieFormat::Script {
        anyhow::bail!(
            "{} is an input script; bake it with `reel run-script --output` instead",
            input.display()
        );
    }

    let target = match format {
        Some(format) => format.into(),
        None => MovieFormat::from_extension(output)
            .filter(|f| f.is_writable())
            .with_context(|| {
                format!(
                    "Cannot infer a profile from {}; pass --format",
                    output.display()
                )
            })?,
    };

    let doc = load_document(input, source)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    save_document(&doc, output, target, compress)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        from = %source,
        to = %target,
        records = doc.record_count(),
        "converted movie"
    );
    Ok(target)
}

/// Execute the convert command
pub fn execute(args: ConvertArgs) -> Result<()> {
    let target = convert(&args.input, &args.output, args.format, !args.no_compress)?;
    println!("Wrote {} ({target})", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inputreel_core::movie::InputRecord;
    use inputreel_core::{MovieDocument, PadStatus};

    fn sample(dir: &Path) -> PathBuf {
        let mut doc = MovieDocument::new();
        doc.info.insert("author".into(), "tas".into());
        doc.put(
            2,
            InputRecord::Pad {
                index: 1,
                status: PadStatus {
                    trigger_l: 200,
                    ..PadStatus::NEUTRAL
                },
            },
        );
        let path = dir.join("source.irb");
        save_document(&doc, &path, MovieFormat::Binary, true).unwrap();
        path
    }

    #[test]
    fn test_binary_to_text_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = sample(dir.path());
        let output = dir.path().join("out.irt");

        assert_eq!(
            convert(&input, &output, None, true).unwrap(),
            MovieFormat::Text
        );
        let original = load_document(&input, MovieFormat::Binary).unwrap();
        let converted = load_document(&output, MovieFormat::Text).unwrap();
        assert_eq!(original, converted);
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = sample(dir.path());
        let output = dir.path().join("out.dat");

        assert!(convert(&input, &output, None, true).is_err());
        assert_eq!(
            convert(&input, &output, Some(TargetFormat::Text), true).unwrap(),
            MovieFormat::Text
        );
        assert_eq!(MovieFormat::detect(&output).unwrap(), MovieFormat::Text);
    }
}
