use {
    crate::error::Result,
    std::{
        fs::File,
        path::Path,
        sync::Arc,
    },
    tracing::Level,
    tracing_subscriber::{
        fmt::{
            layer,
            writer::MakeWriterExt,
        },
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

/// Route log events to a file and to stdout, each behind its own level
/// cutoff.
///
/// The file layer records everything down to `file_level` without ANSI
/// escapes, so per-step `info` detail can be grepped after a run without
/// drowning the terminal; the stdout layer keeps a terse single-line format
/// for the episode summaries. Either level defaults to `INFO` when absent.
///
/// Installs the global subscriber, so this can only be called once per
/// process.
pub fn setup_logging(
    path: impl AsRef<Path>,
    file_level: Option<Level>,
    stdout_level: Option<Level>,
) -> Result<()> {
    let log_file = Arc::new(File::create(path)?);

    tracing_subscriber::registry()
        .with(
            layer()
                .with_writer(log_file.with_max_level(file_level.unwrap_or(Level::INFO)))
                .with_ansi(false),
        )
        .with(
            layer()
                .with_writer(std::io::stdout.with_max_level(stdout_level.unwrap_or(Level::INFO)))
                .compact()
                .with_target(false),
        )
        .init();

    Ok(())
}
