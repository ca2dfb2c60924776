//! Info command - print movie metadata

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use inputreel_core::movie::load_document;
use inputreel_core::{MovieDocument, MovieFormat};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs {
    /// Movie file (text or binary profile)
    pub movie: PathBuf,

    /// Print a JSON object instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Summary of one linear movie
#[derive(Debug, Serialize)]
pub struct MovieSummary {
    pub format: MovieFormat,
    pub frames: u64,
    pub last_input_frame: Option<u64>,
    pub records: usize,
    pub peripherals: Option<u8>,
    pub from_save_state: bool,
    pub info: BTreeMap<String, String>,
    pub settings: BTreeMap<String, String>,
}

impl MovieSummary {
    pub fn new(format: MovieFormat, doc: &MovieDocument) -> Self {
        Self {
            format,
            frames: doc.frame_length(),
            last_input_frame: doc.last_frame(),
            records: doc.record_count(),
            peripherals: doc.peripherals().map(|mask| mask.bits()),
            from_save_state: doc.from_save_state(),
            info: doc.info.clone(),
            settings: doc.settings.clone(),
        }
    }
}

/// Load and summarize a linear movie
pub fn summarize(path: &Path) -> Result<MovieSummary> {
    let format = MovieFormat::detect(path)?;
    if format == MovieFormat::Script {
        anyhow::bail!(
            "{} is an input script; it has no stored frames",
            path.display()
        );
    }
    let doc = load_document(path, format)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(MovieSummary::new(format, &doc))
}

/// Execute the info command
pub fn execute(args: InfoArgs) -> Result<()> {
    let summary = summarize(&args.movie)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", args.movie.display());
    println!("  Format:      {}", summary.format);
    println!("  Frames:      {}", summary.frames);
    match summary.last_input_frame {
        Some(frame) => println!("  Last input:  frame {frame}"),
        None => println!("  Last input:  none"),
    }
    println!("  Records:     {}", summary.records);
    if let Some(mask) = summary.peripherals {
        println!("  Peripherals: {mask:#04x}");
    }
    println!("  Savestate:   {}", summary.from_save_state);

    if !summary.info.is_empty() {
        println!("  Info:");
        for (key, value) in &summary.info {
            println!("    {key} = {value}");
        }
    }
    if !summary.settings.is_empty() {
        println!("  Settings:");
        for (key, value) in &summary.settings {
            println!("    {key} = {value}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inputreel_core::movie::{InputRecord, save_document};
    use inputreel_core::{PadButtons, PadStatus};

    #[test]
    fn test_summarize_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.irb");

        let mut doc = MovieDocument::new();
        doc.info.insert("frames".into(), "10".into());
        doc.put(
            4,
            InputRecord::Pad {
                index: 0,
                status: PadStatus::with_buttons(PadButtons::A),
            },
        );
        save_document(&doc, &path, MovieFormat::Binary, true).unwrap();

        let summary = summarize(&path).unwrap();
        assert_eq!(summary.format, MovieFormat::Binary);
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.last_input_frame, Some(4));
        assert_eq!(summary.records, 1);
    }

    #[test]
    fn test_summarize_rejects_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combo.lua");
        std::fs::write(&path, "function main() end").unwrap();
        assert!(summarize(&path).is_err());
    }
}
