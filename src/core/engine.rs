use crate::core::coordinator::ExportCoordinator;
use crate::core::report::ExportReport;
use crate::core::request::ExportRequest;
use crate::domain::ports::{RecordSource, Storage};
use crate::utils::error::Result;

/// Fetch then export: pulls a batch from the source and hands it to the
/// coordinator. Errors building the batch abort the run; per-format
/// errors end up in the report.
pub struct ExportEngine<R: RecordSource, S: Storage> {
    source: R,
    coordinator: ExportCoordinator<S>,
}

impl<R: RecordSource, S: Storage + 'static> ExportEngine<R, S> {
    pub fn new(source: R, coordinator: ExportCoordinator<S>) -> Self {
        Self {
            source,
            coordinator,
        }
    }

    pub async fn run(&self) -> Result<ExportReport> {
        tracing::info!("Starting export run");

        let batch = self.source.fetch().await?;
        tracing::info!(
            "Fetched {} records with fields [{}]",
            batch.len(),
            batch.schema().join(", ")
        );

        let request = ExportRequest::from_settings(self.coordinator.settings(), batch);
        let report = self.coordinator.export(request).await;

        for result in &report.results {
            tracing::debug!("{} ({:?})", result, result.elapsed);
        }
        Ok(report)
    }
}
