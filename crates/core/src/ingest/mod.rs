pub mod delimited;
pub mod source;

pub use source::{FileRecordSource, InMemoryRecordSource, RecordSource};
