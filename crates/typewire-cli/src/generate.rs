//! Generate command implementation

use crate::manifest::{self, Manifest};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use typewire_codegen::{Artifact, CommandFormatter, format_artifacts, write_artifacts};

/// Options for one `generate` invocation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub manifest: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub no_format: bool,
}

/// Run generation and print the written files
pub fn run(options: &GenerateOptions) -> Result<()> {
    let written = generate(options)?;

    for path in &written {
        println!("  Wrote {}", path.display());
    }
    println!("\nGenerated {} file(s)", written.len());

    Ok(())
}

/// Load the manifest, generate every artifact, and write them.
///
/// Nothing is written unless every endpoint validated.
pub fn generate(options: &GenerateOptions) -> Result<Vec<PathBuf>> {
    let manifest_path = options
        .manifest
        .clone()
        .unwrap_or_else(|| PathBuf::from(manifest::DEFAULT_MANIFEST));
    let base_dir = manifest::base_dir(&manifest_path);

    let manifest = Manifest::from_file(&manifest_path)?;
    manifest.validate()?;

    let sources = manifest.load_sources(&base_dir)?;
    let input = manifest.to_input(&sources)?;
    let artifacts =
        typewire_codegen::generate(&input, &manifest.generator).context("Generation failed")?;

    let artifacts = if options.no_format {
        artifacts
    } else {
        format(&manifest, artifacts)
    };

    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| manifest.output_dir(&base_dir));
    write(&output_dir, &artifacts)
}

fn format(manifest: &Manifest, artifacts: Vec<Artifact>) -> Vec<Artifact> {
    match manifest
        .generator
        .formatter
        .clone()
        .and_then(CommandFormatter::new)
        .map(|formatter| {
            formatter.with_timeout(Duration::from_millis(
                manifest.generator.formatter_timeout_ms,
            ))
        })
    {
        Some(formatter) => format_artifacts(artifacts, &formatter),
        None => artifacts,
    }
}

fn write(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    write_artifacts(dir, artifacts)
        .with_context(|| format!("Failed to write artifacts to {}", dir.display()))
}

#[cfg(test)]
#[path = "generate/generate_tests.rs"]
mod generate_tests;
