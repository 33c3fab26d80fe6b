use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pyedit::config::{self, EditorConfig};
use pyedit::persist::{self, StagedWrite, WriteOutcome};
use pyedit::request::{self, Buffers, Operation, Outcome};
use pyedit::{reformat, FormatPath};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pyedit")]
#[command(about = "Structural editor for Python source", long_about = None)]
#[command(version)]
struct Cli {
    /// Explicit config file (otherwise pyproject.toml is discovered)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one edit request against a file
    Apply {
        /// File to edit (the source file for relocations)
        #[arg(short, long)]
        file: PathBuf,

        /// Destination file for cross-file relocations
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Request JSON: {"operation": ..., "params": {...}}
        #[arg(short, long)]
        request: String,

        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Reformat Python files; directories are searched for *.py
    Fmt {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Report files that would change and exit non-zero, without writing
        #[arg(long)]
        check: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply {
            file,
            dest,
            request,
            dry_run,
            diff,
        } => cmd_apply(cli.config.as_deref(), &file, dest.as_deref(), &request, dry_run, diff),
        Commands::Fmt { paths, check } => cmd_fmt(cli.config.as_deref(), &paths, check),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by `PYEDIT_LOG` (default `warn`).
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("PYEDIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>, near: &Path) -> Result<EditorConfig> {
    match explicit {
        Some(path) => Ok(config::load_from_path(path)?),
        None => {
            let dir = near
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            Ok(config::discover(dir)?)
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_apply(
    config_path: Option<&Path>,
    file: &Path,
    dest: Option<&Path>,
    request_json: &str,
    dry_run: bool,
    show_diff: bool,
) -> Result<ExitCode> {
    let operation: Operation =
        serde_json::from_str(request_json).context("request is not a valid operation")?;
    // A destination naming the edited file is a same-file edit.
    let dest = dest.filter(|dest| !same_file(dest, file));
    if operation.needs_destination() && dest.is_none() {
        bail!("{} needs --dest naming another file", operation.name());
    }
    let config = load_config(config_path, file)?;

    let source = read_source(file)?;
    // A destination that does not exist yet starts out empty.
    let destination = match dest {
        Some(path) if path.exists() => Some(read_source(path)?),
        Some(_) => Some(String::new()),
        None => None,
    };

    let buffers = match (&destination, dest) {
        (Some(destination), Some(_)) => Buffers::Two {
            source: &source,
            destination,
        },
        _ => Buffers::One(&source),
    };

    let outcome = request::execute(&operation, buffers, &config.format)?;

    let writes = match outcome {
        Outcome::One(text) => vec![StagedWrite::new(file, &source, text)],
        Outcome::Two {
            source: new_source,
            destination: new_destination,
        } => {
            let (Some(dest), Some(old_destination)) = (dest, destination.as_deref()) else {
                bail!("{} produced two files but no --dest was given", operation.name());
            };
            vec![
                StagedWrite::new(file, &source, new_source),
                StagedWrite::new(dest, old_destination, new_destination),
            ]
        }
    };

    if show_diff || dry_run {
        for write in &writes {
            let before = if write.path == file {
                source.as_str()
            } else {
                destination.as_deref().unwrap_or("")
            };
            if before != write.contents {
                display_diff(&write.path, before, &write.contents);
            }
        }
    }

    if dry_run {
        println!("{}", "[DRY RUN - no files written]".cyan());
        return Ok(ExitCode::SUCCESS);
    }

    for outcome in persist::commit(&writes)? {
        match outcome {
            WriteOutcome::Written { path, bytes } => {
                println!("{} {} ({} bytes)", "✓".green(), path.display(), bytes)
            }
            WriteOutcome::Unchanged { path } => {
                println!("{} {} (unchanged)", "⊘".cyan(), path.display())
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn cmd_fmt(config_path: Option<&Path>, paths: &[PathBuf], check: bool) -> Result<ExitCode> {
    let files = collect_python_files(paths);
    if files.is_empty() {
        bail!("no Python files found");
    }

    let mut changed = 0usize;
    let mut degraded = 0usize;
    for file in &files {
        let config = load_config(config_path, file)?;
        let original = read_source(file)?;
        let formatted = reformat(&original, &config.format);

        if formatted.path == FormatPath::Fallback {
            degraded += 1;
            eprintln!(
                "{} {}: does not parse, re-indented with the fallback formatter",
                "!".yellow(),
                file.display()
            );
        }
        if formatted.text == original {
            continue;
        }
        changed += 1;

        if check {
            println!("{} {}", "would reformat".yellow(), file.display());
        } else {
            persist::commit(&[StagedWrite::new(file, &original, formatted.text)])?;
            println!("{} {}", "reformatted".green(), file.display());
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files", files.len());
    println!("  {} changed", format!("{changed}").green());
    println!("  {} fallback", format!("{degraded}").yellow());

    if check && changed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn collect_python_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry_path.is_file() && entry_path.extension().is_some_and(|ext| ext == "py") {
                files.push(entry_path.to_path_buf());
            }
        }
    }
    files
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{line}");
    }
}
