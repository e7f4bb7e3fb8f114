//! Loading and saving delimited text files.

mod parser;
mod source;
mod writer;

pub use parser::{Parser, ParserConfig};
pub use source::SourceMetadata;
pub use writer::{write_delimited, write_file};
