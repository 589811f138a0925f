//! Output sinks: the console, and the background worker that appends
//! entries to rotated files.
//!
//! A file write goes `Pending -> Writing -> (Draining <-> Writing)* -> Closed`.
//! An I/O error moves it to a retry which re-resolves the target file and
//! starts over; after [`MAX_WRITE_ATTEMPTS`] the entry is dropped. Failures
//! are only ever reported through `tracing`.

use {
    crate::{error::ThrowlerError, options::Options, rotation},
    chrono::{DateTime, Local},
    std::{
        fs,
        io::{self, Write},
        path::PathBuf,
        sync::{
            mpsc::{self, Receiver, Sender},
            Mutex, PoisonError,
        },
        thread::{self, JoinHandle},
    },
};

/// Number of attempts made for one entry before it is dropped.
pub const MAX_WRITE_ATTEMPTS: u32 = 4;

const WORKER_THREAD_NAME: &str = "throwler-writer";

/// A rendered entry waiting to be appended.
pub(crate) struct WriteRequest {
    /// Time of the logging call; the target file is resolved for this time.
    pub now: DateTime<Local>,
    pub level: Option<String>,
    pub bytes: Vec<u8>,
}

enum Message {
    Write(WriteRequest),
    Flush(Sender<()>),
}

/// How a write ended.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry was fully written to `path`.
    Closed { path: PathBuf, attempts: u32 },
    /// Every attempt failed and the entry was discarded.
    Dropped { attempts: u32 },
}

/// Write `buf` completely, waiting out partial writes and `WouldBlock`.
fn write_draining<W: Write>(writer: &mut W, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole entry"));
            }
            Ok(n) => buf = &buf[n..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => thread::yield_now(),
            Err(err) => return Err(err),
        }
    }
    writer.flush()
}

/// Append `bytes` to the writer produced by `open`, retrying the whole
/// open-and-write on error.
///
/// `open` is called once per attempt so that every retry resolves its
/// target again.
pub fn append_with_retry<W, F>(bytes: &[u8], mut open: F) -> WriteOutcome
where
    W: Write,
    F: FnMut() -> Result<(PathBuf, W), ThrowlerError>,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let result = open().and_then(|(path, mut writer)| {
            write_draining(&mut writer, bytes).map_err(ThrowlerError::FileIOError)?;
            Ok(path)
        });
        match result {
            Ok(path) => {
                return WriteOutcome::Closed {
                    path,
                    attempts: attempt,
                }
            }
            Err(err) if attempt < MAX_WRITE_ATTEMPTS => {
                tracing::warn!(attempt, error = %err, "failed to write log entry, retrying");
            }
            Err(err) => {
                tracing::error!(attempt, error = %err, "failed to write log entry, dropping it");
            }
        }
    }
    WriteOutcome::Dropped {
        attempts: MAX_WRITE_ATTEMPTS,
    }
}

/// Resolve the target file of `request` and append its bytes.
pub(crate) fn write_to_file(options: &Options, request: &WriteRequest) -> WriteOutcome {
    append_with_retry(&request.bytes, || {
        let path = rotation::resolve_log_path(options, request.level.as_deref(), &request.now)?;
        let file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|err| ThrowlerError::CreateFileFailed(path.clone(), err.to_string()))?;
        Ok((path, file))
    })
}

/// Background thread appending entries in the order they were submitted.
pub(crate) struct FileWorker {
    sender: Option<Sender<Message>>,
    handle: Option<JoinHandle<()>>,
}

impl FileWorker {
    pub fn spawn(options: Options) -> Result<Self, ThrowlerError> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || Self::run(&options, receiver))
            .map_err(|err| ThrowlerError::WorkerUnavailable(err.to_string()))?;
        Ok(FileWorker {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    fn run(options: &Options, receiver: Receiver<Message>) {
        for message in receiver {
            match message {
                Message::Write(request) => {
                    if let WriteOutcome::Closed { path, attempts } = write_to_file(options, &request) {
                        tracing::trace!(path = %path.display(), attempts, "log entry written");
                    }
                }
                Message::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }

    pub fn submit(&self, request: WriteRequest) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Message::Write(request)).is_err() {
            tracing::error!("log writer thread has stopped, dropping log entry");
        }
    }

    /// Block until everything submitted so far has been written or dropped.
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (ack, done) = mpsc::channel();
        if sender.send(Message::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }
}

impl Drop for FileWorker {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the queue and exit.
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("log writer thread panicked");
            }
        }
    }
}

/// Synchronous console output. Stdout unless another sink is supplied.
pub(crate) struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        ConsoleSink {
            writer: Mutex::new(writer),
        }
    }

    pub fn write(&self, bytes: &[u8]) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writer.write_all(bytes).and_then(|()| writer.flush()) {
            tracing::error!(error = %err, "failed to write log entry to the console");
        }
    }

    pub fn flush(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writer.flush() {
            tracing::error!(error = %err, "failed to flush the console");
        }
    }
}
