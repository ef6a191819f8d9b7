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

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::Error;
use crate::Trap;
use crate::entry::LogEntry;
use crate::logger::SharedWriter;

pub(crate) enum Task {
    Log(LogEntry),
    Flush(Sender<()>),
}

/// The only consumer of the queue.
pub(crate) struct Worker {
    receiver: Receiver<Task>,
    writer: SharedWriter,
    trap: Arc<dyn Trap>,
    dropped: Arc<AtomicU64>,
}

impl Worker {
    pub(crate) fn new(
        receiver: Receiver<Task>,
        writer: SharedWriter,
        trap: Arc<dyn Trap>,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            receiver,
            writer,
            trap,
            dropped,
        }
    }

    /// Drain the queue until every sender is gone.
    pub(crate) fn run(self) {
        let Self {
            receiver,
            writer,
            trap,
            dropped,
        } = self;

        while let Ok(task) = receiver.recv() {
            match task {
                Task::Log(entry) => {
                    let result = writer
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .write_entry(entry.category(), entry.bytes());
                    if let Err(err) = result {
                        dropped.fetch_add(1, Ordering::Relaxed);
                        let err = Error::new("failed to write log entry")
                            .with_context("category", entry.category())
                            .with_source(err);
                        trap.trap(&err);
                    }
                }
                Task::Flush(done) => {
                    // the flusher may have given up waiting
                    let _ = done.send(());
                }
            }
        }
    }
}
