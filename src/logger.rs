//! Process-wide logging.
//!
//! Both the `log` facade (used through the `log_*` macros) and `tracing`
//! (spans from `tower-http` and the pipeline) end up in the same sinks: an
//! optional append-only log file and, when switched on, stderr. Stdout is
//! left to command output.

use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "hagglz=debug,tower_http=info,warn";

/// Targets whose chatter is hidden unless verbose logging is on
const NOISY_TARGETS: &[&str] = &["reqwest", "hyper", "h2", "rustls", "want", "mio", "tower"];

#[derive(Default)]
struct Sinks {
    enabled: bool,
    stderr: bool,
    verbose: bool,
    file: Option<File>,
}

impl Sinks {
    fn emit(&mut self, bytes: &[u8]) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(bytes);
            let _ = file.flush();
        }
        if self.stderr {
            let _ = io::stderr().write_all(bytes);
        }
    }
}

static SINKS: Mutex<Sinks> = Mutex::new(Sinks {
    enabled: false,
    stderr: false,
    verbose: false,
    file: None,
});

/// `tracing` writer over the shared sinks
#[derive(Clone, Copy)]
struct SinkWriter;

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SINKS.lock().emit(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = SINKS.lock().file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

impl<'a> fmt::MakeWriter<'a> for SinkWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        *self
    }
}

/// `log` facade backend over the shared sinks
struct FacadeLogger;

static FACADE: FacadeLogger = FacadeLogger;

impl log::Log for FacadeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let sinks = SINKS.lock();
        if !sinks.enabled {
            return false;
        }

        let target = metadata.target();
        if target.starts_with("hagglz") {
            return metadata.level() <= Level::Debug;
        }
        if !sinks.verbose && NOISY_TARGETS.iter().any(|prefix| target.starts_with(prefix)) {
            return false;
        }
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} {} [{}] - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
        SINKS.lock().emit(line.as_bytes());
    }

    fn flush(&self) {}
}

/// Install the `tracing` subscriber and the `log` backend.
///
/// Safe to call more than once; later calls return the first outcome.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    static OUTCOME: OnceLock<Result<(), String>> = OnceLock::new();

    let outcome = OUTCOME.get_or_init(|| {
        if std::env::var("HAGGLZ_VERBOSE").is_ok() {
            set_verbose_logging(true);
        }
        enable_logging();
        set_log_to_stderr(true);

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
        let layer = fmt::Layer::new()
            .with_ansi(false)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(SinkWriter);
        let tracing = Registry::default().with(filter).with(layer).try_init();
        let facade = log::set_logger(&FACADE).map(|()| log::set_max_level(LevelFilter::Debug));

        // Another subscriber or logger may already be installed (tests); one
        // working backend is enough
        match (tracing, facade) {
            (Err(tracing_err), Err(log_err)) => Err(format!(
                "Failed to initialize logging: tracing={tracing_err}, log={log_err}"
            )),
            _ => Ok(()),
        }
    });

    outcome.clone().map_err(Into::into)
}

pub fn enable_logging() {
    SINKS.lock().enabled = true;
}

pub fn disable_logging() {
    SINKS.lock().enabled = false;
}

/// Let dependency debug output through
pub fn set_verbose_logging(enabled: bool) {
    SINKS.lock().verbose = enabled;
}

/// Append log lines to `path` in addition to any other sink
pub fn set_log_file(path: impl AsRef<Path>) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    SINKS.lock().file = Some(file);
    Ok(())
}

pub fn set_log_to_stderr(enabled: bool) {
    SINKS.lock().stderr = enabled;
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// Structured debug event, for fields the `log` facade cannot carry
#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}
