use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use pagescan::config::AppConfig;
use pagescan::error::ScanError;
use pagescan::logging::SCAN_OPERATIONS;
use pagescan::report::{render_text, DisplayFilter, DocumentReport};
use pagescan::run_scan;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Find passages of a PDF that overlap with the PDFs of a corpus directory.",
    arg_required_else_help = true
)]
pub struct Args {
    /// Path to the main PDF to check
    pub main_pdf: Option<PathBuf>,

    /// Directory holding the PDFs to compare against
    #[clap(short, long)]
    pub corpus: Option<PathBuf>,

    /// JSON configuration file; command line flags take precedence
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Number of leading pages left out of every document
    #[clap(long)]
    pub skip_pages: Option<u32>,

    /// Minimum best-match score for a document to be reported
    #[clap(long)]
    pub document_threshold: Option<f64>,

    /// Score a paragraph pair must exceed to be recorded
    #[clap(long)]
    pub paragraph_threshold: Option<f64>,

    /// Minimum best-match score for a page pair to be printed
    #[clap(long)]
    pub page_display_threshold: Option<f64>,

    /// Minimum score for a paragraph pair to be printed
    #[clap(long)]
    pub match_display_threshold: Option<f64>,

    /// Worker threads; defaults to the number of cores
    #[clap(short, long)]
    pub jobs: Option<usize>,

    /// Leave out a candidate once one page comparison takes longer than this
    #[clap(long)]
    pub task_timeout_ms: Option<u64>,

    /// Emit the full report as JSON instead of text
    #[clap(long)]
    pub json: bool,

    /// Pretty print JSON output
    #[clap(short, long)]
    pub pretty: bool,

    /// Optional output file path. If omitted, writes to stdout.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Log debug details of the scan
    #[clap(short, long)]
    pub verbose: bool,

    /// Directory for a detailed log file
    #[clap(long)]
    pub log_dir: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    fn into_config(self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(path) = self.main_pdf {
            config.main_document = Some(path);
        }
        if let Some(dir) = self.corpus {
            config.corpus_dir = Some(dir);
        }
        if let Some(n) = self.skip_pages {
            config.scan.skip_count = n;
        }
        if let Some(t) = self.document_threshold {
            config.scan.document_threshold = t;
        }
        if let Some(t) = self.paragraph_threshold {
            config.scan.paragraph_threshold = t;
        }
        if let Some(t) = self.page_display_threshold {
            config.display.page_display_threshold = t;
        }
        if let Some(t) = self.match_display_threshold {
            config.display.match_display_threshold = t;
        }
        if let Some(jobs) = self.jobs {
            config.scan.parallelism = Some(jobs);
        }
        if let Some(ms) = self.task_timeout_ms {
            config.scan.task_timeout_ms = Some(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse_args();

    // Keep the guard alive so the log file is flushed on exit.
    let _guard = match &args.log_dir {
        Some(dir) => pagescan::logging::init_logging_with_dir(args.verbose, dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?,
        None => {
            pagescan::logging::init_logging(args.verbose);
            None
        }
    };

    let json = args.json;
    let pretty = args.pretty;
    let output = args.output.clone();
    let config = args.into_config()?;

    let reports = match run_scan(&config) {
        Ok(reports) => reports,
        Err(err @ ScanError::MainDocument { .. }) => {
            error!(target: SCAN_OPERATIONS, error = %err, "main document unreadable");
            eprintln!("error: {err}");
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(err.into()),
    };
    info!(
        target: SCAN_OPERATIONS,
        documents = reports.len(),
        matches = reports.iter().map(DocumentReport::match_count).sum::<usize>(),
        "scan complete"
    );

    let rendered = if json {
        if pretty {
            serde_json::to_string_pretty(&reports)?
        } else {
            serde_json::to_string(&reports)?
        }
    } else {
        render_text(&reports, &DisplayFilter::from(&config.display))
    };

    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("cannot write {}", path.display()))?;
            info!(target: SCAN_OPERATIONS, path = %path.display(), "output written");
        }
        None => print!("{rendered}"),
    }

    Ok(ExitCode::SUCCESS)
}
