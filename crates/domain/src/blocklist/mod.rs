//! Blocklist dialects and the pure parsers that read them.
pub mod format;
pub mod parser;

pub use format::SourceFormat;
pub use parser::{parse_declared, parse_list, NormalizedBatch, ParseReport, ParsedLine};
