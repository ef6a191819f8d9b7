// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::Category;
use crate::Error;
use crate::Trap;
use crate::clock::Clock;
use crate::entry::LogEntry;
use crate::entry::normalize_line_endings;
use crate::rolling::Resolver;
use crate::rolling::RollingWriter;
use crate::scan::scan;
use crate::trap::DiscardTrap;
use crate::worker::Task;
use crate::worker::Worker;

pub(crate) type SharedWriter = Arc<Mutex<RollingWriter>>;

const BYTES_PER_MB: u64 = 1024 * 1024;
const DEFAULT_MAX_FILE_SIZE_MB: i64 = 10;
const DEFAULT_LOG_DIRNAME: &str = "Log";

fn size_limit_from_mb(mb: i64) -> Option<NonZeroU64> {
    if mb <= 0 {
        return None;
    }
    NonZeroU64::new((mb as u64).saturating_mul(BYTES_PER_MB))
}

/// A builder to configure and create a [`CategoryLog`].
#[derive(Debug)]
pub struct CategoryLogBuilder {
    basedir: Option<PathBuf>,
    max_size: Option<NonZeroU64>,
    thread_name: String,
    trap: Box<dyn Trap>,
    clock: Clock,
}

impl Default for CategoryLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryLogBuilder {
    /// Create a new builder with default settings.
    ///
    /// Logs go to `Log/` next to the running executable, files rotate above 10 MB and
    /// background write failures are discarded.
    pub fn new() -> Self {
        Self {
            basedir: None,
            max_size: size_limit_from_mb(DEFAULT_MAX_FILE_SIZE_MB),
            thread_name: "catlog-worker".to_string(),
            trap: Box::new(DiscardTrap::default()),
            clock: Clock::DefaultClock,
        }
    }

    /// Set the root directory. Day directories are created under it.
    pub fn basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = Some(basedir.into());
        self
    }

    /// Rotate a log file once it is larger than `mb` megabytes.
    ///
    /// A non-positive value disables rotation.
    pub fn rollover_size_mb(mut self, mb: i64) -> Self {
        self.max_size = size_limit_from_mb(mb);
        self
    }

    /// Rotate a log file once it is larger than `n` bytes.
    pub fn rollover_size(mut self, n: NonZeroU64) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Never rotate; files grow without bound.
    pub fn no_rollover(mut self) -> Self {
        self.max_size = None;
        self
    }

    /// Set the name of the background worker thread.
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Set the trap for background write failures.
    ///
    /// Default to [`DiscardTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    #[cfg(test)]
    pub(crate) fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Recover today's rotation counters and start the background worker.
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * No root directory is set and the executable's directory cannot be determined.
    /// * Today's log directory exists but cannot be read.
    /// * The worker thread cannot be spawned.
    pub fn build(self) -> Result<CategoryLog, Error> {
        let Self {
            basedir,
            max_size,
            thread_name,
            trap,
            clock,
        } = self;

        let basedir = match basedir {
            Some(basedir) => basedir,
            None => default_basedir()?,
        };

        let counters = scan(&basedir.join(clock.today()))?;
        let resolver = Resolver::new(basedir.clone(), counters, clock.clone());
        let writer = Arc::new(Mutex::new(RollingWriter::new(resolver, max_size)));
        let dropped = Arc::new(AtomicU64::new(0));

        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker = Worker::new(receiver, writer.clone(), Arc::from(trap), dropped.clone());
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .map_err(|err| Error::new("failed to spawn log worker thread").with_source(err))?;

        Ok(CategoryLog {
            state: WorkerState(Some((sender, handle))),
            writer,
            dropped,
            basedir,
            clock,
        })
    }
}

fn default_basedir() -> Result<PathBuf, Error> {
    let exe = std::env::current_exe()
        .map_err(|err| Error::new("failed to locate the running executable").with_source(err))?;
    let dir = exe.parent().ok_or_else(|| {
        Error::new("executable has no parent directory").with_context("path", exe.display())
    })?;
    Ok(dir.join(DEFAULT_LOG_DIRNAME))
}

/// The process-wide category log writer.
///
/// Create it once at startup with [`CategoryLogBuilder`] and share it by reference (or in an
/// `Arc`) with every producer. Entries written with [`CategoryLog::write_log_async`] are
/// appended by a single background thread, first to `All.log`, then to the category's own file.
///
/// Queued entries live only in memory. Dropping the writer drains what is queued and joins the
/// worker; anything still queued when the process dies is lost.
///
/// # Examples
///
/// ```
/// use catlog::Category;
/// use catlog::CategoryLogBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let log = CategoryLogBuilder::new()
///     .basedir(dir.path())
///     .rollover_size_mb(10)
///     .build()
///     .unwrap();
///
/// log.write_log_async("order 42 created", Category::Insert);
/// log.write_log("order 42 paid", Category::Update).unwrap();
/// log.flush();
/// ```
#[derive(Debug)]
pub struct CategoryLog {
    state: WorkerState,
    writer: SharedWriter,
    dropped: Arc<AtomicU64>,
    basedir: PathBuf,
    clock: Clock,
}

impl CategoryLog {
    /// Create a new [`CategoryLogBuilder`].
    pub fn builder() -> CategoryLogBuilder {
        CategoryLogBuilder::new()
    }

    /// Queue a line for the background worker and return immediately.
    ///
    /// A line ending is appended, so empty text still writes a bare `\r\n`. Failures are never
    /// reported to the caller; see [`CategoryLog::dropped_writes`].
    pub fn write_log_async(&self, text: &str, category: Category) {
        self.state.send(Task::Log(LogEntry::line(category, text)));
    }

    /// Write `text` to the category's file on the calling thread, bypassing the queue.
    ///
    /// Only the given category's file is written; use [`Category::All`] for the aggregate log.
    /// The text is written as given, with line endings normalized to `\r\n`. Empty text is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Return an error if the day directory cannot be created, or the file cannot be rotated or
    /// appended to.
    pub fn write_log(&self, text: &str, category: Category) -> Result<(), Error> {
        if text.is_empty() {
            return Ok(());
        }
        let text = normalize_line_endings(text);
        self.writer().write(category, text.as_bytes())
    }

    /// Write `text` to the aggregate log on the calling thread.
    ///
    /// Same as `write_log(text, Category::All)`.
    pub fn write_log_all(&self, text: &str) -> Result<(), Error> {
        self.write_log(text, Category::All)
    }

    /// Block until every entry queued before this call has been handled.
    pub fn flush(&self) {
        let (done, wait) = crossbeam_channel::bounded(1);
        if self.state.send(Task::Flush(done)) {
            let _ = wait.recv();
        }
    }

    /// Number of queued entries dropped because writing them failed.
    pub fn dropped_writes(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Today's log directory.
    ///
    /// Computed from the root directory and the current date; it does not wait for a write in
    /// progress.
    pub fn log_dir(&self) -> PathBuf {
        self.basedir.join(self.clock.today())
    }

    fn writer(&self) -> MutexGuard<'_, RollingWriter> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug)]
struct WorkerState(Option<(Sender<Task>, JoinHandle<()>)>);

impl WorkerState {
    fn send(&self, task: Task) -> bool {
        match &self.0 {
            Some((sender, _)) => sender.send(task).is_ok(),
            None => false,
        }
    }
}

impl Drop for WorkerState {
    fn drop(&mut self) {
        if let Some((sender, handle)) = self.0.take() {
            // the worker drains what is left, then exits its loop
            drop(sender);
            let _ = handle.join();
        }
    }
}
