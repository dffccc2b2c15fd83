//! Xnbkit CLI - Command-line tool for XNB game asset extraction.
//!
//! This is the main entry point for the xnbkit command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use xnbkit::content::Error as ContentError;
use xnbkit::export::Error as ExportError;
use xnbkit::prelude::*;

/// Xnbkit - XNB game asset extraction tool
#[derive(Parser)]
#[command(name = "xnbkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack XNB files into editable JSON documents
    Extract {
        /// Input XNB file or directory
        input: PathBuf,

        /// Output JSON file or directory (defaults next to the input)
        output: Option<PathBuf>,
    },

    /// Repack JSON documents into XNB files
    Pack {
        /// Input JSON file or directory
        input: PathBuf,

        /// Output XNB file or directory (defaults next to the input)
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { input, output } => {
            run_batch(&input, output, "xnb", "json", cli.quiet, &extract_file)?;
        }
        Commands::Pack { input, output } => {
            run_batch(&input, output, "json", "xnb", cli.quiet, &|i, o| {
                pack_file(i, o, cli.quiet)
            })?;
        }
    }

    Ok(())
}

/// Run a per-file conversion over a single file or a directory tree.
///
/// Files failing with unsupported-content errors are skipped with a
/// message; the batch continues. A missing input is not an error.
fn run_batch(
    input: &Path,
    output: Option<PathBuf>,
    from_ext: &str,
    to_ext: &str,
    quiet: bool,
    convert: &(dyn Fn(&Path, &Path) -> std::result::Result<(), ExportError> + Sync),
) -> Result<()> {
    if !input.exists() {
        println!("Input not found: {}", input.display());
        return Ok(());
    }

    if !input.is_dir() {
        let output = output.unwrap_or_else(|| input.with_extension(to_ext));
        return match convert(input, &output) {
            Ok(()) => {
                if !quiet {
                    println!("{} -> {}", input.display(), output.display());
                }
                Ok(())
            }
            Err(e) if is_unsupported(&e) => {
                eprintln!("Skipping {}: {}", input.display(), e);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to convert {}", input.display())),
        };
    }

    let output_dir = output.unwrap_or_else(|| input.to_path_buf());
    let files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), from_ext))
        .map(|e| e.into_path())
        .collect();

    if !quiet {
        println!("Converting {} files...", files.len());
    }

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        pb
    };

    let converted = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);
    let errors = AtomicUsize::new(0);

    let start = Instant::now();
    files.par_iter().for_each(|file| {
        // Input layout is mirrored below the output directory.
        let relative = file.strip_prefix(input).unwrap_or(file);
        let target = output_dir.join(relative).with_extension(to_ext);

        match convert(file, &target) {
            Ok(()) => {
                converted.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if is_unsupported(&e) => {
                eprintln!("Skipping {}: {}", file.display(), e);
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                eprintln!("Error converting {}: {}", file.display(), e);
                errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        pb.inc(1);
    });

    pb.finish_with_message("Done");
    if !quiet {
        println!(
            "Converted {} files in {:?} ({} skipped, {} errors)",
            converted.load(Ordering::Relaxed),
            start.elapsed(),
            skipped.load(Ordering::Relaxed),
            errors.load(Ordering::Relaxed)
        );
    }

    Ok(())
}

fn extract_file(input: &Path, output: &Path) -> std::result::Result<(), ExportError> {
    let bytes = fs::read(input)?;
    let container = Container::decode(&bytes, &LzxCodec)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    save_document(container, output)
}

fn pack_file(input: &Path, output: &Path, quiet: bool) -> std::result::Result<(), ExportError> {
    let mut container = load_document(input)?;

    let bytes = match container.encode(&LzxCodec) {
        Ok(bytes) => bytes,
        Err(ContentError::CompressionUnsupported) => {
            if !quiet {
                eprintln!(
                    "{}: no LZX encoder available, writing uncompressed",
                    input.display()
                );
            }
            container.compressed = false;
            container.encode(&LzxCodec).map_err(ExportError::Content)?
        }
        Err(e) => return Err(ExportError::Content(e)),
    };

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes)?;
    Ok(())
}

/// Whether a failure marks content the codec does not implement, as
/// opposed to a broken file or i/o problem.
fn is_unsupported(err: &ExportError) -> bool {
    matches!(err, ExportError::Content(e) if e.is_unsupported())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
