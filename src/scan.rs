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
use std::io;
use std::path::Path;

use crate::Category;
use crate::Error;
use crate::rolling::RotationCounters;

/// Recover today's rotation counters from the rotated files already on disk.
///
/// A missing directory means nothing was rotated yet. Files that do not look like
/// `<category>(<n>).log` are skipped.
pub(crate) fn scan(day_dir: &Path) -> Result<RotationCounters, Error> {
    let mut counters = RotationCounters::default();

    let read_dir = match fs::read_dir(day_dir) {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(counters),
        Err(err) => return Err(Error::from_path_error("failed to read log dir", day_dir, err)),
    };

    for entry in read_dir {
        let Ok(entry) = entry else {
            continue;
        };
        // the writer only creates files
        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let is_log = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("log"));
        if !is_log {
            continue;
        }

        // if the filename is not a UTF-8 string, skip it.
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if let Some(category) = Category::from_rotated_stem(stem) {
            counters.increment(category);
        }
    }

    Ok(counters)
}
