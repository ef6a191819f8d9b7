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

//! A bridge to forward logs from the `log` crate to a [`CategoryLog`].
//!
//! The record target picks the category: `insert` and `update` (in any case) go to their own
//! files, every other target only goes to the aggregate log.

use crate::Category;
use crate::CategoryLog;

impl log::Log for CategoryLog {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let category = Category::from_name(record.target()).unwrap_or(Category::All);
        self.write_log_async(&record.args().to_string(), category);
    }

    fn flush(&self) {
        CategoryLog::flush(self);
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] so that all logs from the log crate are queued
/// to `log`. The logger is never dropped, so entries still queued at process exit are lost.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// use catlog::CategoryLogBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let log = CategoryLogBuilder::new().basedir(dir.path()).build().unwrap();
/// if let Err(err) = catlog::bridge::try_setup_log_crate(log) {
///     eprintln!("failed to setup log crate: {err}");
/// }
///
/// log::info!(target: "insert", "order 42 created");
/// ```
pub fn try_setup_log_crate(log: CategoryLog) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(log))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
