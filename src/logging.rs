use std::io;
use std::path::Path;
use std::sync::Once;

use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::{Directive, EnvFilter},
    fmt::format::FmtSpan,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};

// Log targets
pub const SCAN_OPERATIONS: &str = "scan_ops";
pub const PDF_PARSING: &str = "pdf_parse";
pub const CORPUS_LOADING: &str = "corpus_load";

pub const LOG_FILE_NAME: &str = "pagescan.log";

static INIT: Once = Once::new();

fn directive(raw: String) -> Option<Directive> {
    raw.parse().ok()
}

fn stderr_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env().add_directive(Level::WARN.into());
    for target in [SCAN_OPERATIONS, PDF_PARSING, CORPUS_LOADING] {
        if let Some(d) = directive(format!("{target}={level}")) {
            filter = filter.add_directive(d);
        }
    }
    filter
}

/// Installs a stderr subscriber. `RUST_LOG` directives are honored on top of
/// the defaults; `verbose` raises the crate targets to `debug`.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(io::stderr)
            .with_filter(stderr_filter(verbose));

        let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
    });
}

/// Like [`init_logging`], and also writes every crate event at `trace` level
/// to `pagescan.log` in `log_dir`. Keep the returned guard alive until exit so
/// buffered lines get flushed.
pub fn init_logging_with_dir(verbose: bool, log_dir: &Path) -> io::Result<Option<WorkerGuard>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, LOG_FILE_NAME);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let mut file_filter = EnvFilter::new("warn");
    for target in [SCAN_OPERATIONS, PDF_PARSING, CORPUS_LOADING] {
        if let Some(d) = directive(format!("{target}=trace")) {
            file_filter = file_filter.add_directive(d);
        }
    }

    let mut installed = false;
    INIT.call_once(|| {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(non_blocking_appender)
            .with_filter(file_filter);

        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(io::stderr)
            .with_filter(stderr_filter(verbose));

        installed = tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .try_init()
            .is_ok();
    });

    Ok(installed.then_some(guard))
}
