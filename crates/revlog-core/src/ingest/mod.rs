//! Review-log ingestion.
//!
//! # Example
//!
//! ```ignore
//! use revlog_core::ingest::read_revlog_file;
//!
//! let log = read_revlog_file("revlog.csv", &PipelineConfig::default()).await?;
//! println!("Parsed {}/{}", log.stats.parsed, log.stats.total);
//! ```

pub mod parser;
pub mod reader;

pub use parser::{parse_record, split_fields};
pub use reader::{
    parse_revlog_str, read_revlog, read_revlog_file, IngestStats, ParsedLog, RevlogParser,
};
