pub mod coordinator;
pub mod engine;
pub mod report;
pub mod request;

pub use crate::domain::format::ExportFormat;
pub use crate::domain::model::{Batch, Record};
pub use crate::domain::ports::{FormatAdapter, RecordSource, Storage};
pub use crate::utils::error::Result;
