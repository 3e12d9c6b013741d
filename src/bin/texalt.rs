//! TexAlt CLI - PDF accessibility patches and HTML+MathML for LaTeX sources

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, ValueEnum};
use texalt::utils::files::find_batch;
use texalt::{process_batch, Dialect, DocumentReport, Profile, RunOptions};

#[derive(Parser)]
#[command(name = "texalt")]
#[command(version)]
#[command(about = "Accessibility patches (PDF metadata, alt-text tooltips) and HTML+MathML for LaTeX", long_about = None)]
struct Cli {
    /// Source files to process (omit with --batch)
    files: Vec<PathBuf>,

    /// Patch the source with accessibility changes (idempotent)
    #[arg(long, visible_alias = "shn")]
    pdf: bool,

    /// Generate self-contained HTML with MathML via pandoc
    #[arg(long)]
    html: bool,

    /// Apply both --pdf and --html
    #[arg(long)]
    all: bool,

    /// Process every top-level document in DIR (default: current directory)
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = ".")]
    batch: Option<PathBuf>,

    /// Skip .bak backups when patching
    #[arg(long)]
    no_backup: bool,

    /// Source dialect
    #[arg(long, value_enum, default_value_t = DialectArg::Auto)]
    dialect: DialectArg,

    /// coursetex output variant for HTML (s=slides, h=handout, n=notes, c=combined)
    #[arg(long)]
    variant: Option<String>,

    /// Profile TOML (author, subject, keywords, lookup tables, tool names)
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Write a JSON report of every document to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Exit with status 1 when any document or step failed
    #[arg(long)]
    fail_on_error: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    /// Go by file extension (.shn is a stream source); --batch collects both
    Auto,
    /// Plain LaTeX
    Tex,
    /// coursetex stream source
    Stream,
}

impl DialectArg {
    fn forced(self) -> Option<Dialect> {
        match self {
            DialectArg::Auto => None,
            DialectArg::Tex => Some(Dialect::Tex),
            DialectArg::Stream => Some(Dialect::Stream),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let patch = cli.pdf || cli.all;
    let html = cli.html || cli.all;
    if !patch && !html {
        let _ = Cli::command().print_help();
        eprintln!("\nSpecify at least one of --pdf, --html, or --all.");
        return ExitCode::FAILURE;
    }

    let profile = match Profile::discover(cli.profile.as_deref()) {
        Ok(profile) => profile,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let files = match cli.batch.as_ref() {
        Some(dir) => match find_batch(dir, cli.dialect.forced()) {
            Ok(files) if files.is_empty() => {
                log::info!("No top-level documents found in {}.", dir.display());
                return ExitCode::SUCCESS;
            }
            Ok(files) => files,
            Err(err) => {
                log::error!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        None => {
            if cli.files.is_empty() {
                let mut cmd = Cli::command();
                cmd.error(
                    clap::error::ErrorKind::MissingRequiredArgument,
                    "Provide file(s) or use --batch",
                )
                .exit();
            }
            cli.files.clone()
        }
    };

    let options = RunOptions {
        patch,
        html,
        backup: !cli.no_backup,
        dialect: cli.dialect.forced(),
        variant: cli.variant.clone(),
    };
    let reports = process_batch(&files, &profile, &options);

    if let Some(path) = cli.report.as_ref() {
        if let Err(err) = write_report(path, &reports) {
            log::error!("failed to write report '{}': {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    }

    let failed = reports.iter().filter(|r| r.failed()).count();
    if failed > 0 {
        log::warn!("{} of {} document(s) had failures", failed, reports.len());
    }
    log::info!("Done.");

    if cli.fail_on_error && failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn write_report(path: &Path, reports: &[DocumentReport]) -> std::io::Result<()> {
    let serialized = serde_json::to_string_pretty(reports)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    fs::write(path, serialized)
}
