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

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The stream a log line belongs to.
///
/// [`Category::All`] is a category of its own and also the aggregate stream: every entry is
/// written to it, whatever its category.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Category {
    /// Inserted records.
    Insert,
    /// Updated records.
    Update,
    /// Everything.
    All,
}

impl Category {
    /// All categories, in counter order.
    pub const ALL: [Category; 3] = [Category::Insert, Category::Update, Category::All];

    /// The canonical name, which is also the log file stem.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Insert => "Insert",
            Category::Update => "Update",
            Category::All => "All",
        }
    }

    pub(crate) const fn index(&self) -> usize {
        match self {
            Category::Insert => 0,
            Category::Update => 1,
            Category::All => 2,
        }
    }

    /// Match a name case-insensitively against the known categories.
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    /// Recover the category of a rotated log file from its file stem.
    ///
    /// Only stems shaped like `name(index)` count. The name is the part before the last `(`
    /// and is matched case-insensitively. Active files (no parentheses) and anything else
    /// return `None`.
    pub fn from_rotated_stem(stem: &str) -> Option<Category> {
        if !stem.ends_with(')') {
            return None;
        }
        let open = stem.rfind('(')?;
        let index = &stem[open + 1..stem.len() - 1];
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Category::from_name(&stem[..open])
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_name(s)
            .ok_or_else(|| Error::new("unknown log category").with_context("name", s))
    }
}
