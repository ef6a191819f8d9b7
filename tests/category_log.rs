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
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use catlog::Category;
use catlog::CategoryLog;
use catlog::CategoryLogBuilder;
use catlog::Error;
use catlog::Trap;
use catlog::trap::StderrTrap;
use rand::Rng;
use rand::distr::Alphanumeric;
use tempfile::TempDir;

fn build(temp_dir: &TempDir) -> CategoryLog {
    CategoryLogBuilder::new()
        .basedir(temp_dir.path())
        .no_rollover()
        .build()
        .unwrap()
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

fn generate_random_string() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(1..=40);
    std::iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .map(char::from)
        .take(len)
        .collect()
}

#[test]
fn test_drain_writes_aggregate_and_category_files() {
    let temp_dir = TempDir::new().unwrap();
    let log = build(&temp_dir);

    log.write_log_async("a", Category::Insert);
    log.write_log_async("b", Category::Update);
    log.write_log_async("c", Category::Insert);
    log.flush();

    let day = log.log_dir();
    assert_eq!(read(&day, "All.log"), "a\r\nb\r\nc\r\n");
    assert_eq!(read(&day, "Insert.log"), "a\r\nc\r\n");
    assert_eq!(read(&day, "Update.log"), "b\r\n");
}

#[test]
fn test_fifo_order_without_loss_or_duplication() {
    let temp_dir = TempDir::new().unwrap();
    let log = build(&temp_dir);

    let mut rng = rand::rng();
    let mut all = String::new();
    let mut insert = String::new();
    let mut update = String::new();
    for _ in 0..500 {
        let text = generate_random_string();
        let category = Category::ALL[rng.random_range(0..Category::ALL.len())];
        log.write_log_async(&text, category);

        let line = format!("{text}\r\n");
        all.push_str(&line);
        match category {
            Category::Insert => insert.push_str(&line),
            Category::Update => update.push_str(&line),
            Category::All => {}
        }
    }
    log.flush();

    let day = log.log_dir();
    assert_eq!(read(&day, "All.log"), all);
    if !insert.is_empty() {
        assert_eq!(read(&day, "Insert.log"), insert);
    }
    if !update.is_empty() {
        assert_eq!(read(&day, "Update.log"), update);
    }
}

#[test]
fn test_aggregate_category_is_written_once() {
    let temp_dir = TempDir::new().unwrap();
    let log = build(&temp_dir);

    log.write_log_async("only once", Category::All);
    log.write_log_async("", Category::All);
    log.flush();

    let day = log.log_dir();
    assert_eq!(read(&day, "All.log"), "only once\r\n\r\n");
    assert!(!day.join("Insert.log").exists());
    assert!(!day.join("Update.log").exists());
}

#[test]
fn test_empty_entries_still_write_a_line() {
    let temp_dir = TempDir::new().unwrap();
    let log = build(&temp_dir);

    log.write_log_async("a", Category::Insert);
    log.write_log_async("", Category::Insert);
    log.write_log_async("c", Category::Insert);
    log.flush();

    let day = log.log_dir();
    assert_eq!(read(&day, "All.log"), "a\r\n\r\nc\r\n");
    assert_eq!(read(&day, "Insert.log"), "a\r\n\r\nc\r\n");
}

#[test]
fn test_drop_drains_queue() {
    let temp_dir = TempDir::new().unwrap();
    let log = build(&temp_dir);
    let day = log.log_dir();

    for i in 0..100 {
        log.write_log_async(&format!("line {i}"), Category::Update);
    }
    drop(log);

    let expected = (0..100).map(|i| format!("line {i}\r\n")).collect::<String>();
    assert_eq!(read(&day, "Update.log"), expected);
}

#[test]
fn test_concurrent_producers_keep_their_order() {
    let temp_dir = TempDir::new().unwrap();
    let log = build(&temp_dir);
    let producers = 4;
    let per_producer = 250;

    std::thread::scope(|s| {
        for p in 0..producers {
            let log = &log;
            s.spawn(move || {
                for i in 0..per_producer {
                    log.write_log_async(&format!("{p}:{i}"), Category::Insert);
                }
            });
        }
    });
    log.flush();

    let all = read(&log.log_dir(), "All.log");
    let mut next = vec![0; producers];
    for line in all.split_terminator("\r\n") {
        let (p, i) = line.split_once(':').unwrap();
        let p = p.parse::<usize>().unwrap();
        let i = i.parse::<usize>().unwrap();
        assert_eq!(i, next[p], "producer {p} out of order");
        next[p] += 1;
    }
    assert_eq!(next, vec![per_producer; producers]);
}

#[test]
fn test_rotation_of_oversized_entries() {
    let temp_dir = TempDir::new().unwrap();
    let log = CategoryLogBuilder::new()
        .basedir(temp_dir.path())
        .rollover_size_mb(1)
        .build()
        .unwrap();

    let first = "1".repeat(2 * 1024 * 1024);
    let second = "2".repeat(2 * 1024 * 1024);
    log.write_log_async(&first, Category::Update);
    log.write_log_async(&second, Category::Update);
    log.flush();

    let day = log.log_dir();
    assert_eq!(read(&day, "Update(1).log"), format!("{first}\r\n"));
    assert_eq!(read(&day, "Update.log"), format!("{second}\r\n"));
    assert_eq!(read(&day, "All(1).log"), format!("{first}\r\n"));
    assert_eq!(read(&day, "All.log"), format!("{second}\r\n"));
    assert!(!day.join("Update(2).log").exists());
}

#[test]
fn test_synchronous_rotation_of_oversized_entries() {
    let temp_dir = TempDir::new().unwrap();
    let log = CategoryLogBuilder::new()
        .basedir(temp_dir.path())
        .rollover_size(NonZeroU64::new(1024).unwrap())
        .build()
        .unwrap();

    let first = "a".repeat(2048);
    let second = "b".repeat(2048);
    log.write_log(&first, Category::Update).unwrap();
    log.write_log(&second, Category::Update).unwrap();

    let day = log.log_dir();
    assert_eq!(read(&day, "Update(1).log"), first);
    assert_eq!(read(&day, "Update.log"), second);
    assert!(!day.join("All.log").exists());
}

#[test]
fn test_startup_recovers_rotation_counters() {
    let temp_dir = TempDir::new().unwrap();
    let day = {
        let log = build(&temp_dir);
        log.log_dir()
    };
    fs::create_dir_all(&day).unwrap();
    fs::write(day.join("Insert(1).log"), "first archive").unwrap();
    fs::write(day.join("Insert(2).log"), "second archive").unwrap();
    fs::write(day.join("Insert.log"), "x".repeat(64)).unwrap();

    let log = CategoryLogBuilder::new()
        .basedir(temp_dir.path())
        .rollover_size(NonZeroU64::new(32).unwrap())
        .build()
        .unwrap();
    log.write_log_async("after restart", Category::Insert);
    log.flush();

    assert_eq!(read(&day, "Insert(1).log"), "first archive");
    assert_eq!(read(&day, "Insert(2).log"), "second archive");
    assert_eq!(read(&day, "Insert(3).log"), "x".repeat(64));
    assert_eq!(read(&day, "Insert.log"), "after restart\r\n");
}

#[derive(Debug)]
struct CountingTrap(Arc<AtomicUsize>);

impl Trap for CountingTrap {
    fn trap(&self, err: &Error) {
        assert_eq!(err.message(), "failed to write log entry");
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_background_failures_are_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let trapped = Arc::new(AtomicUsize::new(0));
    let log = CategoryLogBuilder::new()
        .basedir(temp_dir.path())
        .no_rollover()
        .trap(CountingTrap(trapped.clone()))
        .build()
        .unwrap();

    // a directory where the aggregate file should be
    let day = log.log_dir();
    fs::create_dir_all(day.join("All.log")).unwrap();

    log.write_log_async("lost", Category::Insert);
    log.write_log_async("lost too", Category::All);
    log.flush();
    assert_eq!(log.dropped_writes(), 2);
    assert_eq!(trapped.load(Ordering::SeqCst), 2);
    assert!(!day.join("Insert.log").exists());

    // the worker keeps going once the obstacle is gone
    fs::remove_dir(day.join("All.log")).unwrap();
    log.write_log_async("kept", Category::Insert);
    log.flush();
    assert_eq!(log.dropped_writes(), 2);
    assert_eq!(read(&day, "All.log"), "kept\r\n");
    assert_eq!(read(&day, "Insert.log"), "kept\r\n");

    // the synchronous path reports instead
    fs::create_dir_all(day.join("Update.log")).unwrap();
    let err = log.write_log("visible", Category::Update).unwrap_err();
    assert_eq!(err.message(), "failed to open log file");
    assert_eq!(log.dropped_writes(), 2);
}

#[test]
fn test_stderr_trap_reports_and_continues() {
    let temp_dir = TempDir::new().unwrap();
    let log = CategoryLogBuilder::new()
        .basedir(temp_dir.path())
        .no_rollover()
        .trap(StderrTrap::default())
        .build()
        .unwrap();

    let day = log.log_dir();
    fs::create_dir_all(day.join("All.log")).unwrap();

    log.write_log_async("lost", Category::Update);
    log.flush();
    assert_eq!(log.dropped_writes(), 1);
    assert!(!day.join("Update.log").exists());

    fs::remove_dir(day.join("All.log")).unwrap();
    log.write_log_async("kept", Category::Update);
    log.flush();
    assert_eq!(log.dropped_writes(), 1);
    assert_eq!(read(&day, "Update.log"), "kept\r\n");
}
