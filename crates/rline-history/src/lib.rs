//! A bounded, ordered command history with in-progress-line preservation.
//!
//! `current` ranges over `[0, entries.len()]`; the value `entries.len()`
//! means "not navigating history right now" and is where the caller's
//! in-progress line lives. The first step away from that position stashes
//! the in-progress text into `scratch`; stepping back to it restores that
//! text verbatim.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Bounded ordered history plus the scratch slot for the line in progress.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
    current: usize,
    scratch: String,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            current: 0,
            scratch: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current navigation position, in `[0, len()]`.
    pub fn cursor(&self) -> usize {
        self.current
    }

    fn at_scratch(&self) -> bool {
        self.current == self.entries.len()
    }

    /// Append `line`. Empty lines are ignored. A line identical to the most
    /// recent entry is not duplicated but still resets navigation to the
    /// scratch slot. Eviction of the oldest entry happens at capacity.
    pub fn add(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if self.entries.back().map(String::as_str) != Some(line) {
            if self.entries.len() == self.capacity {
                self.entries.pop_front();
            }
            self.entries.push_back(line.to_string());
        }
        self.current = self.entries.len();
    }

    /// Step to the previous entry. `current_line` is stashed into `scratch`
    /// the first time navigation leaves the scratch slot. Returns `None` at
    /// the oldest entry (or on an empty history).
    pub fn back(&mut self, current_line: &str) -> Option<&str> {
        if self.current == 0 {
            return None;
        }
        if self.at_scratch() {
            self.scratch = current_line.to_string();
        }
        self.current -= 1;
        Some(&self.entries[self.current])
    }

    /// Step to the next entry, restoring `scratch` once navigation returns
    /// to the in-progress slot. Returns `None` if already at that slot.
    pub fn forward(&mut self) -> Option<&str> {
        if self.current >= self.entries.len() {
            return None;
        }
        self.current += 1;
        if self.at_scratch() {
            Some(self.scratch.as_str())
        } else {
            Some(&self.entries[self.current])
        }
    }

    /// Jump to the oldest entry, stashing `current_line` if this is the
    /// first step away from the scratch slot.
    pub fn begin(&mut self, current_line: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        if self.at_scratch() {
            self.scratch = current_line.to_string();
        }
        self.current = 0;
        Some(&self.entries[0])
    }

    /// Jump back to the scratch slot, restoring the in-progress line.
    /// No-op (returns `None`) if already there.
    pub fn end(&mut self) -> Option<&str> {
        if self.at_scratch() {
            return None;
        }
        self.current = self.entries.len();
        Some(self.scratch.as_str())
    }

    /// Write each entry on its own line. I/O failures are the caller's to
    /// decide whether to ignore; history-file persistence is best-effort.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(entry);
            content.push('\n');
        }
        fs::write(path, content).with_context(|| format!("writing history to {path:?}"))
    }

    /// Replace the in-memory history with the lines in `path`, most recent
    /// last. Navigation resets to the scratch slot.
    pub fn restore(&mut self, path: &Path) -> Result<()> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading history from {path:?}"))?;
        self.entries.clear();
        for line in content.lines() {
            if !line.is_empty() {
                self.entries.push_back(line.to_string());
            }
        }
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.current = self.entries.len();
        Ok(())
    }
}
