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

//! Traps for errors that cannot be returned to a caller.
//!
//! The background worker has no caller to report to. Whatever fails there is handed to a
//! [`Trap`] and the entry is dropped. Traps must not write back into the category logs.

use std::fmt;
use std::io;
use std::io::Write;

use crate::Error;

/// A sink for internal errors.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error that could not be propagated.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A trap that drops every error.
///
/// This is the default: a failed background write is neither retried nor reported.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DiscardTrap {}

impl Trap for DiscardTrap {
    fn trap(&self, _: &Error) {}
}

/// A trap that reports each dropped entry on standard error.
///
/// Each error is printed as one line prefixed with `catlog:`. Nothing is reported if standard
/// error is closed.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct StderrTrap {}

impl Trap for StderrTrap {
    fn trap(&self, err: &Error) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "catlog: dropped log entry: {err}");
    }
}
