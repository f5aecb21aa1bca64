//! Revlog CSV reader.
//!
//! Streams a log line by line, skipping the header and blank lines.
//! Malformed records, including lines that are not valid UTF-8, are
//! counted and logged but don't abort the read.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::parser::parse_record;
use crate::config::PipelineConfig;
use crate::error::{ErrorCode, RevlogError, RevlogResult};
use crate::time::DayBoundary;
use crate::types::ReviewEvent;

/// Keep at most this many error messages; the count is always exact.
const MAX_ERROR_MESSAGES: usize = 100;

/// Statistics from reading a log.
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    /// Data records seen (header and blank lines excluded).
    pub total: u64,
    /// Records parsed into events.
    pub parsed: u64,
    /// Malformed records skipped.
    pub skipped: u64,
    /// Error messages for skipped records (capped).
    pub errors: Vec<String>,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if every record parsed.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }

    /// Get the skip rate as a percentage.
    pub fn skip_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.skipped as f64 / self.total as f64) * 100.0
        }
    }
}

/// Events parsed from one log, with read statistics.
#[derive(Debug, Default, Clone)]
pub struct ParsedLog {
    pub events: Vec<ReviewEvent>,
    pub stats: IngestStats,
}

/// Line-at-a-time accumulator shared by the sync and async readers.
#[derive(Debug)]
pub struct RevlogParser {
    boundary: DayBoundary,
    has_header: bool,
    line_number: u64,
    header_seen: bool,
    log: ParsedLog,
}

impl RevlogParser {
    pub fn new(boundary: DayBoundary, has_header: bool) -> Self {
        Self {
            boundary,
            has_header,
            line_number: 0,
            header_seen: false,
            log: ParsedLog::default(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.day_boundary, config.has_header)
    }

    /// Feed one raw line (without its terminator).
    pub fn push_line(&mut self, raw: &str) {
        self.line_number += 1;
        let line = raw.trim();

        if self.consume_header(line) || line.is_empty() {
            return;
        }

        self.log.stats.total += 1;
        match parse_record(self.line_number, line, &self.boundary) {
            Ok(event) => {
                self.log.events.push(event);
                self.log.stats.parsed += 1;
            }
            Err(e) => self.skip(e),
        }
    }

    /// Feed one line as raw bytes. A line that is not valid UTF-8 is
    /// skipped as a malformed record.
    pub fn push_bytes(&mut self, raw: &[u8]) {
        match std::str::from_utf8(raw) {
            Ok(line) => self.push_line(line),
            Err(e) => {
                self.line_number += 1;
                if self.consume_header("<non-UTF-8 header>") {
                    return;
                }
                self.log.stats.total += 1;
                self.skip(RevlogError::malformed(
                    self.line_number,
                    ErrorCode::RecInvalidEncoding,
                    format!("invalid UTF-8 after byte {}", e.valid_up_to()),
                ));
            }
        }
    }

    fn consume_header(&mut self, line: &str) -> bool {
        if self.has_header && !self.header_seen {
            self.header_seen = true;
            debug!(header = line, "Skipping header line");
            return true;
        }
        false
    }

    fn skip(&mut self, err: RevlogError) {
        warn!(line = self.line_number, error = %err, "Skipping malformed record");
        self.log.stats.skipped += 1;
        if self.log.stats.errors.len() < MAX_ERROR_MESSAGES {
            self.log.stats.errors.push(err.to_string());
        }
    }

    /// Finish reading. Fails with `EmptyInput` when no data records were seen.
    pub fn finish(self) -> RevlogResult<ParsedLog> {
        if self.log.stats.total == 0 {
            warn!("Review log contains no records after the header");
            return Err(RevlogError::EmptyInput);
        }

        info!(
            total = self.log.stats.total,
            parsed = self.log.stats.parsed,
            skipped = self.log.stats.skipped,
            "Read review log"
        );
        Ok(self.log)
    }
}

/// Parse a log that is already in memory.
pub fn parse_revlog_str(input: &str, config: &PipelineConfig) -> RevlogResult<ParsedLog> {
    let mut parser = RevlogParser::from_config(config);
    for line in input.lines() {
        parser.push_line(line);
    }
    parser.finish()
}

/// Read a log from an async buffered reader.
///
/// # Example
///
/// ```ignore
/// use tokio::fs::File;
/// use tokio::io::BufReader;
///
/// let file = File::open("revlog.csv").await?;
/// let log = read_revlog(BufReader::new(file), &PipelineConfig::default()).await?;
/// println!("{} events, {} skipped", log.events.len(), log.stats.skipped);
/// ```
pub async fn read_revlog<R>(mut reader: R, config: &PipelineConfig) -> RevlogResult<ParsedLog>
where
    R: AsyncBufRead + Unpin,
{
    let mut parser = RevlogParser::from_config(config);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let mut line = buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }
        parser.push_bytes(line);
    }

    parser.finish()
}

/// Read a log file from disk.
pub async fn read_revlog_file(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> RevlogResult<ParsedLog> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Opening review log");
    let file = tokio::fs::File::open(path).await?;
    read_revlog(BufReader::new(file), config).await
}
