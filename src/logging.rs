pub mod record;

pub use record::StreamLogRecord;
