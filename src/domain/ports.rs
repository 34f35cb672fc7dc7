use crate::domain::format::ExportFormat;
use crate::domain::model::Batch;
use crate::utils::error::{ExportError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Serializes a whole batch into the bytes of one file format.
pub trait FormatAdapter: Send + Sync {
    fn format(&self) -> ExportFormat;

    /// Encodes a batch that has already passed the empty-batch check.
    fn encode(&self, batch: &Batch) -> Result<Vec<u8>>;

    /// Zero-record batches are refused unless `header_only` is set; a batch
    /// without any fields is always refused.
    fn serialize(&self, batch: &Batch, header_only: bool) -> Result<Vec<u8>> {
        if batch.schema().is_empty() || (batch.is_empty() && !header_only) {
            return Err(ExportError::EmptyBatch {
                format: self.format().to_string(),
            });
        }
        self.encode(batch)
    }
}

/// Destination for finished exports.
pub trait Storage: Send + Sync {
    /// Either the complete `data` ends up at `path` or nothing does.
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()>;
}

/// The upstream scrape stage: anything that can hand over a batch.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self) -> Result<Batch>;
}
