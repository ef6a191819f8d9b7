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

use crate::Category;

pub(crate) const LINE_ENDING: &str = "\r\n";

/// A queued log line.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct LogEntry {
    category: Category,
    bytes: Vec<u8>,
}

impl LogEntry {
    /// Build an entry terminated by a line ending.
    pub(crate) fn line(category: Category, text: &str) -> Self {
        let mut text = normalize_line_endings(text);
        text.push_str(LINE_ENDING);
        Self {
            category,
            bytes: text.into_bytes(),
        }
    }

    pub(crate) fn category(&self) -> Category {
        self.category
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Turn every lone `\n` into `\r\n`.
pub(crate) fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut prev = None;
    for c in text.chars() {
        if c == '\n' && prev != Some('\r') {
            out.push('\r');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}
