mod classify;
mod exif_time;
mod scan;
mod touch;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
#[command(name = "met", version, about = "Set image file times from the EXIF capture timestamp")]
struct Cli {
    /// Print diagnostic output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// When a file has no EXIF time, search similar files for one
    #[arg(short = 'r', long = "recsearch")]
    recsearch: bool,

    /// Image files or directories to process (default: current directory)
    paths: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let files = resolve_targets(&cli.paths, cli.verbose)?;
    for file in &files {
        println!("processing: {}", file.display());
        process_file(file, cli.recsearch)?;
    }
    Ok(())
}

/// Resolve CLI arguments into a deduplicated, lexicographically sorted
/// list of absolute image paths.
///
/// A directory argument stands for its parent directory's images, unless
/// the parent is the filesystem root, in which case the directory itself
/// is expanded. No arguments at all means the current directory.
fn resolve_targets(paths: &[PathBuf], verbose: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if paths.is_empty() {
        let cwd = std::env::current_dir().context("failed to resolve current directory")?;
        if verbose {
            println!("processing current dir: {}", cwd.display());
        }
        files = scan::expand_dir(&cwd, verbose)?;
    } else {
        for arg in paths {
            if classify::is_dir(arg)? {
                let abs = fs::canonicalize(arg)
                    .with_context(|| format!("failed to resolve {}", arg.display()))?;
                match abs.parent() {
                    Some(parent) if parent.parent().is_some() => {
                        files.extend(scan::expand_dir(parent, verbose)?);
                    }
                    _ => files.extend(scan::expand_dir(&abs, verbose)?),
                }
            } else if classify::is_supported_image(arg) {
                let abs = fs::canonicalize(arg)
                    .with_context(|| format!("failed to resolve {}", arg.display()))?;
                files.push(abs);
            } else if verbose {
                println!("unsupported file type: {}", arg.display());
            }
        }
    }

    let (unique, counts) = uniq(files);
    if verbose {
        for (path, count) in &counts {
            if *count > 1 {
                println!("duplicate filename: {} ({count} occurrences)", path.display());
            }
        }
    }
    Ok(unique)
}

/// Collapse duplicate paths, keeping an occurrence count per path for
/// diagnostics. The surviving list is sorted.
fn uniq(files: Vec<PathBuf>) -> (Vec<PathBuf>, HashMap<PathBuf, usize>) {
    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for file in files {
        *counts.entry(file).or_insert(0) += 1;
    }
    let mut unique: Vec<PathBuf> = counts.keys().cloned().collect();
    unique.sort();
    (unique, counts)
}

/// Set one file's times from its own EXIF data, or, with `recsearch`,
/// from the first similar file that has a usable capture timestamp.
fn process_file(file: &Path, recsearch: bool) -> anyhow::Result<()> {
    if let Some(extime) = exif_time::read_exif_time(file)? {
        let time = exif_time::parse_exif_datetime(&extime)?;
        touch::apply_time(file, time)?;
        println!("times -> EXIF({extime}): {}", file.display());
        return Ok(());
    }

    if !recsearch {
        println!("EXIF time missing: {}", file.display());
        return Ok(());
    }

    for candidate in scan::find_similar(file)? {
        if let Some(extime) = exif_time::read_exif_time(&candidate)? {
            let time = exif_time::parse_exif_datetime(&extime)?;
            touch::apply_time(file, time)?;
            println!(
                "times -> EXIF({extime}): {} (used from {})",
                file.display(),
                candidate.display()
            );
            return Ok(());
        }
    }
    println!("no suitable source of EXIF time found: {}", file.display());
    Ok(())
}
