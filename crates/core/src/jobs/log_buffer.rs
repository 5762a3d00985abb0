//! Capacity-bounded, sequence-numbered log buffer for a single job.
//!
//! Cursors handed to pollers are sequence numbers, never buffer indices.
//! Sequence numbers come from a counter that is never reset, so trimming the
//! oldest lines cannot shift or invalidate a cursor that was already issued.

use std::collections::VecDeque;
use std::fmt;

/// Default maximum number of retained lines per job.
pub const DEFAULT_LOG_CAPACITY: usize = 2000;

/// Which worker stream a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// Worker standard output (and progress markers).
    Out,
    /// Worker standard error (and failure markers).
    Err,
}

impl LogSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::Err => "err",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct LogLine {
    seq: u64,
    source: LogSource,
    text: String,
}

impl LogLine {
    fn render(&self) -> String {
        format!("[{}] {}", self.source, self.text)
    }
}

/// Result of reading a [`LogBuffer`] from a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSlice {
    /// Rendered lines (`"[tag] text"`), oldest first.
    pub lines: Vec<String>,
    /// Cursor to pass on the next read.
    pub next_cursor: u64,
}

#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<LogLine>,
    capacity: usize,
    next_seq: u64,
}

impl LogBuffer {
    /// Create an empty buffer retaining at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    /// Append `text`, one entry per non-empty line.
    ///
    /// Lines are split on `\n` with a trailing `\r` stripped. Oldest entries
    /// are evicted once the capacity is exceeded.
    pub fn append(&mut self, source: LogSource, text: &str) {
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            self.lines.push_back(LogLine {
                seq: self.next_seq,
                source,
                text: line.to_string(),
            });
            self.next_seq += 1;
        }

        let excess = self.lines.len().saturating_sub(self.capacity);
        if excess > 0 {
            self.lines.drain(..excess);
        }
    }

    /// Return every retained line with a sequence number `>= cursor`.
    ///
    /// A cursor older than the oldest retained line is clamped to it. When
    /// nothing is at or past the cursor, `next_cursor` echoes the input.
    pub fn read_from(&self, cursor: u64) -> LogSlice {
        let Some(first_seq) = self.lines.front().map(|l| l.seq) else {
            return LogSlice {
                lines: Vec::new(),
                next_cursor: cursor,
            };
        };

        // Retained sequence numbers are contiguous, so the offset is direct.
        let skip = usize::try_from(cursor.saturating_sub(first_seq)).unwrap_or(usize::MAX);
        let lines: Vec<String> = self.lines.iter().skip(skip).map(LogLine::render).collect();

        let next_cursor = match self.lines.back() {
            Some(last) if !lines.is_empty() => last.seq + 1,
            _ => cursor,
        };

        LogSlice { lines, next_cursor }
    }

    /// Number of lines currently retained.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sequence number the next appended line will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
