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

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroU64;
use std::path::Path;
use std::path::PathBuf;

use crate::Category;
use crate::Error;
use crate::clock::Clock;

/// Number of rotated files per category on the current day.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub(crate) struct RotationCounters([usize; 3]);

impl RotationCounters {
    #[cfg(test)]
    pub(crate) fn get(&self, category: Category) -> usize {
        self.0[category.index()]
    }

    pub(crate) fn increment(&mut self, category: Category) -> usize {
        let n = &mut self.0[category.index()];
        *n += 1;
        *n
    }

    pub(crate) fn reset(&mut self) {
        self.0 = [0; 3];
    }
}

/// Resolves log file paths under `<basedir>/<YYYY-MM-DD>/`.
#[derive(Debug)]
pub(crate) struct Resolver {
    basedir: PathBuf,
    counters: RotationCounters,
    clock: Clock,
}

impl Resolver {
    pub(crate) fn new(basedir: PathBuf, counters: RotationCounters, clock: Clock) -> Self {
        Self {
            basedir,
            counters,
            clock,
        }
    }

    pub(crate) fn day_dir(&self) -> PathBuf {
        self.basedir.join(self.clock.today())
    }

    /// Return today's directory, creating it on the first write of a day.
    ///
    /// A directory that has to be created starts a fresh rotation sequence for every category.
    fn ensure_day_dir(&mut self) -> Result<PathBuf, Error> {
        let dir = self.day_dir();
        if !dir.is_dir() {
            fs::create_dir_all(&dir)
                .map_err(|err| Error::from_path_error("failed to create log directory", &dir, err))?;
            self.counters.reset();
        }
        Ok(dir)
    }

    /// The canonical `<Category>.log` path of today.
    pub(crate) fn resolve_active_path(&mut self, category: Category) -> Result<PathBuf, Error> {
        let dir = self.ensure_day_dir()?;
        Ok(dir.join(format!("{category}.log")))
    }

    /// Advance the category counter and return `<Category>(<n>).log` of today.
    ///
    /// Indices already taken on disk are skipped, so a rotation never overwrites an archive.
    pub(crate) fn resolve_next_rotated_path(
        &mut self,
        category: Category,
    ) -> Result<PathBuf, Error> {
        let dir = self.ensure_day_dir()?;
        loop {
            let n = self.counters.increment(category);
            let path = dir.join(format!("{category}({n}).log"));
            if !path.exists() {
                return Ok(path);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn counters(&self) -> &RotationCounters {
        &self.counters
    }

    #[cfg(test)]
    pub(crate) fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}

/// Append `bytes` at the end of `path`, creating the file if absent.
///
/// The handle is closed before returning.
pub(crate) fn append(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| Error::from_path_error("failed to open log file", path, err))?;
    file.write_all(bytes)
        .map_err(|err| Error::from_path_error("failed to append log file", path, err))
}

/// Move `path` to the next rotated name if it is larger than `max_size`.
///
/// Returns the archive path when a rotation happened.
pub(crate) fn check_and_rotate(
    resolver: &mut Resolver,
    path: &Path,
    category: Category,
    max_size: Option<NonZeroU64>,
) -> Result<Option<PathBuf>, Error> {
    let Some(max_size) = max_size else {
        return Ok(None);
    };

    let len = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::from_path_error("failed to stat log file", path, err)),
    };
    if len <= max_size.get() {
        return Ok(None);
    }

    let archive = resolver.resolve_next_rotated_path(category)?;
    fs::rename(path, &archive).map_err(|err| {
        Error::from_path_error("failed to rotate log file", path, err)
            .with_context("archive", archive.display())
    })?;
    Ok(Some(archive))
}

/// The single writer of the log directory tree.
#[derive(Debug)]
pub(crate) struct RollingWriter {
    resolver: Resolver,
    max_size: Option<NonZeroU64>,
}

impl RollingWriter {
    pub(crate) fn new(resolver: Resolver, max_size: Option<NonZeroU64>) -> Self {
        Self { resolver, max_size }
    }

    /// Resolve, rotate if needed, then append to the category's active file.
    pub(crate) fn write(&mut self, category: Category, bytes: &[u8]) -> Result<(), Error> {
        let path = self.resolver.resolve_active_path(category)?;
        check_and_rotate(&mut self.resolver, &path, category, self.max_size)?;
        append(&path, bytes)
    }

    /// Write to the aggregate log, then to the category log unless it is the aggregate.
    pub(crate) fn write_entry(&mut self, category: Category, bytes: &[u8]) -> Result<(), Error> {
        self.write(Category::All, bytes)?;
        if category != Category::All {
            self.write(category, bytes)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }
}
