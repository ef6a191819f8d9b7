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

//! Catlog writes log lines to per-category files from a single background thread.
//!
//! # Overview
//!
//! Every line carries a [`Category`]. Lines are appended to the aggregate `All.log` and, unless
//! the category is [`Category::All`], to the category's own file. Files live in one directory per
//! calendar day and are rotated once they grow past a size limit:
//!
//! ```text
//! <basedir>/2024-08-10/All.log        active
//! <basedir>/2024-08-10/Insert.log     active
//! <basedir>/2024-08-10/Insert(1).log  rotated
//! <basedir>/2024-08-10/Insert(2).log  rotated
//! ```
//!
//! Rotation numbering survives restarts: the day directory is scanned when the writer is built.
//!
//! # Examples
//!
//! ```
//! use catlog::Category;
//! use catlog::CategoryLogBuilder;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let log = CategoryLogBuilder::new()
//!     .basedir(dir.path())
//!     .rollover_size_mb(10)
//!     .build()
//!     .unwrap();
//!
//! log.write_log_async("a", Category::Insert);
//! log.write_log_async("b", Category::Update);
//! log.flush();
//!
//! let all = std::fs::read_to_string(log.log_dir().join("All.log")).unwrap();
//! assert_eq!(all, "a\r\nb\r\n");
//! ```
//!
//! # Limitations
//!
//! Queued lines live in memory only and are lost if the process dies. Several processes writing
//! into the same directory are not coordinated.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[cfg(feature = "bridge-log")]
pub mod bridge;
pub mod trap;

pub use self::category::Category;
pub use self::error::Error;
pub use self::logger::CategoryLog;
pub use self::logger::CategoryLogBuilder;
pub use self::trap::Trap;

mod category;
mod clock;
mod entry;
mod error;
mod logger;
mod rolling;
mod scan;
mod worker;
