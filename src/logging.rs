use indicatif::ProgressBar;
use std::env;
use std::io::{self, Write};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
///
/// Log lines are written with the progress line suspended so they never
/// land on top of it.
pub fn init(verbose: bool, progress: ProgressBar) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if verbose { Level::DEBUG } else { Level::WARN };

        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            if let Ok(directive) = format!("gradle_sweep={level}").parse() {
                filter = filter.add_directive(directive);
            }
            if let Ok(directive) = "reqwest=warn".parse() {
                filter = filter.add_directive(directive);
            }
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(verbose)
                    .with_writer(ProgressAwareStderr { progress }),
            )
            .init();
    });
}

struct ProgressAwareStderr {
    progress: ProgressBar,
}

impl<'a> MakeWriter<'a> for ProgressAwareStderr {
    type Writer = SuspendedWrite<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendedWrite::new(self.progress.clone(), io::stderr())
    }
}

/// Buffers one log event and writes it out while the progress line is hidden.
struct SuspendedWrite<W: Write> {
    progress: ProgressBar,
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> SuspendedWrite<W> {
    fn new(progress: ProgressBar, inner: W) -> Self {
        Self {
            progress,
            inner,
            buffer: Vec::new(),
        }
    }

    fn emit(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.progress
            .suspend(|| self.inner.write_all(&self.buffer).and_then(|_| self.inner.flush()))?;
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> Write for SuspendedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()
    }
}

impl<W: Write> Drop for SuspendedWrite<W> {
    fn drop(&mut self) {
        let _ = self.emit();
    }
}
