//! Validate command - check that movies and scripts load

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use inputreel_core::movie::load_document;
use inputreel_core::{MovieFormat, ScriptPlayback};

/// Arguments for the validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// Movies or scripts to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Load one source completely, discarding the result
pub fn validate(path: &Path) -> Result<MovieFormat> {
    let format = MovieFormat::detect(path)?;
    match format {
        MovieFormat::Text | MovieFormat::Binary => {
            load_document(path, format)?;
        }
        MovieFormat::Script => {
            let budget = inputreel_core::config::load().script.instruction_budget;
            ScriptPlayback::load(path, None, budget)?;
        }
    }
    Ok(format)
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> Result<()> {
    let mut failed = 0;
    for path in &args.paths {
        match validate(path) {
            Ok(format) => println!("  ok    {} ({format})", path.display()),
            Err(e) => {
                failed += 1;
                println!("  FAIL  {}: {e:#}", path.display());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} sources failed to load", args.paths.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_script() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.lua");
        let bad = dir.path().join("bad.lua");
        std::fs::write(&good, "function main() core.advance() end").unwrap();
        std::fs::write(&bad, "local speed = 3").unwrap();

        assert_eq!(validate(&good).unwrap(), MovieFormat::Script);
        assert!(validate(&bad).is_err());
    }

    #[test]
    fn test_validate_truncated_movie() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.irt");
        std::fs::write(&path, "{\"info\": {").unwrap();
        assert!(validate(&path).is_err());
    }
}
