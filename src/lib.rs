//! # Throwler
//!
//! Throwler is a small logger that timestamps each entry, pretty-prints it
//! and either writes it to the console or appends it to a log file. File
//! output is organized in date named directories (one per hour or per day,
//! following the directory date pattern) and files named after the current
//! date, the entry's level and a rotation index:
//!
//! ```text
//! <dir>/07-March-2024/07-March-2024T14_warn_1.log
//! ```
//!
//! When a file reaches the configured size, the next entry spills into the
//! next index. The rotation index is always derived from the files on disk,
//! so several processes or restarts keep continuing the same files.
//!
//! Writing never fails from the caller's point of view: I/O errors are
//! retried a bounded number of times and reported through `tracing`.
//!
//! ## Example
//!
//! ```rust
//! use throwler::{create_logger, RawOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = std::env::temp_dir().join("throwler-doc");
//!     let logger = create_logger(
//!         &RawOptions::new()
//!             .dir(dir.to_string_lossy().into_owned())
//!             .autorotate("daily")
//!             .size("10M")
//!             .levels(["info", "warn", "error"]),
//!     )?;
//!
//!     logger.log("Server listening on port 8080", Some("info"));
//!     logger.log(&vec![("retries", 3), ("timeout", 30)], Some("Warn"));
//!     logger.flush();
//!
//!     Ok(())
//! }
//! ```
use {
    chrono::Local,
    std::{
        fmt::{self, Debug},
        io::{self, Write},
        sync::Arc,
    },
};

mod date;
mod entry;
mod error;
mod options;
mod rotation;
mod writer;

pub use {
    date::{DatePattern, TIMESTAMP_PATTERN},
    entry::LogEntry,
    error::ThrowlerError,
    options::{resolve, Autorotate, Options, Output, RawOptions, RotationSize},
    rotation::{log_file_path, normalize_level, rotation_index},
    writer::{append_with_retry, WriteOutcome, MAX_WRITE_ATTEMPTS},
};

use writer::{ConsoleSink, FileWorker, WriteRequest};

enum Sink {
    Console(ConsoleSink),
    File(FileWorker),
}

struct LoggerInner {
    options: Options,
    timestamp_pattern: DatePattern,
    sink: Sink,
}

/// A configured logger, returned by [`create_logger`].
///
/// Cloning is cheap and every clone feeds the same output. With file output,
/// entries are handed to a background thread and appended in call order;
/// the thread exits once the last clone is dropped and the queue is drained.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("options", &self.inner.options).finish()
    }
}

impl Logger {
    fn new(options: Options, console: Box<dyn Write + Send>) -> Result<Self, ThrowlerError> {
        let sink = match options.output() {
            Output::Console => Sink::Console(ConsoleSink::new(console)),
            Output::File => Sink::File(FileWorker::spawn(options.clone())?),
        };
        Ok(Logger {
            inner: Arc::new(LoggerInner {
                options,
                timestamp_pattern: DatePattern::new(TIMESTAMP_PATTERN),
                sink,
            }),
        })
    }

    /// The resolved options of this logger.
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Log `content` with an optional level.
    ///
    /// The level is lowercased; it is ignored when an allow-list is
    /// configured and does not contain it. Console entries are written
    /// before this returns. File entries are queued and written in the
    /// background.
    pub fn log<T: Debug + ?Sized>(&self, content: &T, level: Option<&str>) {
        let now = Local::now();
        let options = &self.inner.options;
        let level = normalize_level(level, options.levels());
        let timestamp = options
            .timestamp()
            .then(|| self.inner.timestamp_pattern.format(&now));
        let bytes = LogEntry::new(timestamp, level.as_deref(), content).render().into_bytes();

        match &self.inner.sink {
            Sink::Console(console) => console.write(&bytes),
            Sink::File(worker) => worker.submit(WriteRequest { now, level, bytes }),
        }
    }

    /// Block until every entry logged so far has been written or dropped.
    pub fn flush(&self) {
        match &self.inner.sink {
            Sink::Console(console) => console.flush(),
            Sink::File(worker) => worker.flush(),
        }
    }
}

/// Create a logger from raw options, writing console output to stdout.
///
/// Missing or invalid options are replaced by their defaults.
///
/// # Errors
/// * [`ThrowlerError::InvalidDirectory`] if `dir` is an existing file.
/// * [`ThrowlerError::DirectoryNotFound`] if `dir` and its parent are missing.
pub fn create_logger(raw: &RawOptions) -> Result<Logger, ThrowlerError> {
    create_logger_with_console(raw, io::stdout())
}

/// Like [`create_logger`], with console output going to `console`.
pub fn create_logger_with_console<W>(raw: &RawOptions, console: W) -> Result<Logger, ThrowlerError>
where
    W: Write + Send + 'static,
{
    let options = resolve(raw)?;
    Logger::new(options, Box::new(console))
}
