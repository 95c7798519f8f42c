use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use crossbeam_channel::bounded;
use dotsweep::{CleanSummary, Engine, EngineEvent, PatternSet};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Remove macOS metadata artifacts (.DS_Store, ._* resource forks, __MACOSX, ...) from directory trees",
    long_about = None
)]
struct Args {
    /// Directories to clean (defaults to current directory)
    #[arg(default_values_t = vec![String::from(".")])]
    paths: Vec<String>,

    /// Count matches and report, without deleting anything
    #[arg(long, short = 'n')]
    dry_run: bool,

    /// Suppress per-item log lines
    #[arg(long, short)]
    quiet: bool,
}

/// What one path contributed to the run.
struct PathOutcome {
    found: u64,
    summary: Option<CleanSummary>,
}

/// Run the engine for one path on a worker thread while this thread drains
/// the event channel onto the terminal. Returns None for skipped arguments.
fn process_path(path: &str, patterns: &PatternSet, args: &Args) -> Result<Option<PathOutcome>> {
    let root = PathBuf::from(path);
    if !root.is_dir() {
        println!("Skipped: {} (not a directory)", root.display());
        return Ok(None);
    }

    let (sender, receiver) = bounded::<EngineEvent>(256);
    let engine = Engine::new(patterns.clone(), sender);
    let dry_run = args.dry_run;

    let worker = thread::spawn(move || -> Result<PathOutcome, dotsweep::PathError> {
        let found = engine.count(&root)?;
        let summary = if found > 0 && !dry_run {
            Some(engine.clean(&root, found)?)
        } else {
            None
        };
        Ok(PathOutcome { found, summary })
    });

    // The worker's sender closes when the engine is dropped, ending this loop.
    let mut bar: Option<ProgressBar> = None;
    for event in receiver {
        match event {
            EngineEvent::Log(log) => {
                if !args.quiet {
                    match &bar {
                        Some(bar) => bar.println(log.to_string()),
                        None => println!("{}", log),
                    }
                }
            }
            EngineEvent::Progress(progress) => {
                let bar = bar.get_or_insert_with(|| {
                    let bar = ProgressBar::new(progress.total);
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("[{bar:40.cyan/blue}] {pos}/{len}")
                            .unwrap()
                            .progress_chars("=> "),
                    );
                    bar
                });
                bar.set_position(progress.processed);
            }
        }
    }
    if let Some(bar) = bar.take() {
        bar.finish_and_clear();
    }

    let outcome = worker
        .join()
        .map_err(|_| anyhow::anyhow!("Engine worker thread panicked"))??;
    Ok(Some(outcome))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let patterns = PatternSet::load()?;

    let mut total_found: u64 = 0;
    let mut totals = CleanSummary::default();
    let mut failures = 0usize;

    for path in &args.paths {
        match process_path(path, &patterns, &args) {
            Ok(Some(outcome)) => {
                total_found += outcome.found;
                if let Some(summary) = outcome.summary {
                    totals.files_removed += summary.files_removed;
                    totals.folders_removed += summary.folders_removed;
                    totals.bytes_reclaimed += summary.bytes_reclaimed;
                }
            }
            Ok(None) => {}
            Err(err) => {
                eprintln!("Error processing {}: {}", path, err);
                failures += 1;
            }
        }
    }

    println!("========================================");
    if args.dry_run {
        println!("Dry run mode: no files were deleted.");
        println!("Items found: {}", total_found.to_string().bold());
    } else {
        println!("Files removed: {}", totals.files_removed.to_string().bold());
        println!(
            "Folders removed: {}",
            totals.folders_removed.to_string().bold()
        );
        println!(
            "Total space cleaned: {}",
            format_size(totals.bytes_reclaimed, BINARY).bold().green()
        );
    }

    if failures > 0 {
        anyhow::bail!("{} path(s) could not be processed", failures);
    }
    Ok(())
}
