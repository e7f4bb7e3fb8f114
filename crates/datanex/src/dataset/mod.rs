//! Tabular data model shared by the validation, deduplication and pattern engines.

mod infer;
mod profile;
mod table;
mod types;

pub use infer::{is_null_token, parse_datetime, parse_number};
pub use profile::ColumnProfile;
pub use table::{Column, Dataset, SnapshotId};
pub use types::{ColumnType, SemanticType, Value};
