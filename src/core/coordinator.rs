use crate::adapters::adapter_for;
use crate::config::ExportSettings;
use crate::core::report::{ExportOutcome, ExportReport, ExportStage, FormatExport, FormatReport};
use crate::core::request::ExportRequest;
use crate::domain::format::ExportFormat;
use crate::domain::model::Batch;
use crate::domain::ports::{FormatAdapter, Storage};
use crate::utils::error::ExportError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs export requests: one adapter per requested format, each written
/// atomically and reported on its own. A failing format never stops the others.
pub struct ExportCoordinator<S: Storage> {
    settings: ExportSettings,
    storage: Arc<S>,
}

impl<S: Storage + 'static> ExportCoordinator<S> {
    pub fn new(settings: ExportSettings, storage: S) -> Self {
        Self {
            settings,
            storage: Arc::new(storage),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub async fn export(&self, request: ExportRequest) -> ExportReport {
        let started = Instant::now();
        let ExportRequest {
            formats,
            target,
            batch,
            header_only,
        } = request;

        tracing::info!(
            "Exporting {} records as {}",
            batch.len(),
            formats
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let jobs: Vec<Job> = formats
            .iter()
            .map(|&format| Job {
                format,
                adapter: adapter_for(format, &self.settings),
                path: target.path_for(format),
            })
            .collect();
        let batch = Arc::new(batch);

        let results = if self.settings.parallel && jobs.len() > 1 {
            self.run_parallel(jobs, batch, header_only).await
        } else {
            self.run_sequential(jobs, batch, header_only).await
        };

        let report = ExportReport {
            results,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Export total time: {:.2} seconds",
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Formats one after another, each on its own blocking worker so a lost
    /// worker only costs its own format.
    async fn run_sequential(
        &self,
        jobs: Vec<Job>,
        batch: Arc<Batch>,
        header_only: bool,
    ) -> Vec<FormatReport> {
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            let format = job.format;
            let batch = Arc::clone(&batch);
            let storage = Arc::clone(&self.storage);
            let handle = tokio::task::spawn_blocking(move || {
                job.run(&batch, header_only, storage.as_ref())
            });

            results.push(match handle.await {
                Ok(report) => report,
                Err(e) => worker_lost(format, &e),
            });
        }
        results
    }

    /// One blocking worker per format, joined in request order.
    async fn run_parallel(
        &self,
        jobs: Vec<Job>,
        batch: Arc<Batch>,
        header_only: bool,
    ) -> Vec<FormatReport> {
        tracing::debug!("Running {} format exports in parallel", jobs.len());

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let format = job.format;
                let batch = Arc::clone(&batch);
                let storage = Arc::clone(&self.storage);
                let handle = tokio::task::spawn_blocking(move || {
                    job.run(&batch, header_only, storage.as_ref())
                });
                (format, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (format, handle) in handles {
            results.push(match handle.await {
                Ok(report) => report,
                Err(e) => worker_lost(format, &e),
            });
        }
        results
    }
}

struct Job {
    format: ExportFormat,
    adapter: Box<dyn FormatAdapter>,
    path: PathBuf,
}

impl Job {
    fn run<S: Storage + ?Sized>(self, batch: &Batch, header_only: bool, storage: &S) -> FormatReport {
        export_format(self.adapter.as_ref(), batch, &self.path, header_only, storage)
    }
}

/// Drives one format through `Pending -> Serializing -> Writing -> Committed`,
/// stopping at `Failed` on the first error.
pub fn export_format<S: Storage + ?Sized>(
    adapter: &dyn FormatAdapter,
    batch: &Batch,
    path: &Path,
    header_only: bool,
    storage: &S,
) -> FormatReport {
    let mut export = FormatExport::start(adapter.format());

    export.advance(ExportStage::Serializing);
    let bytes = match adapter.serialize(batch, header_only) {
        Ok(bytes) => bytes,
        Err(e) => return export.fail(e),
    };

    export.advance(ExportStage::Writing);
    if let Err(e) = storage.write_atomic(path, &bytes) {
        return export.fail(e);
    }

    export.commit(path.to_path_buf(), bytes.len())
}

fn worker_lost(format: ExportFormat, e: &tokio::task::JoinError) -> FormatReport {
    tracing::error!("Export worker for {} did not finish: {}", format, e);
    FormatReport {
        format,
        outcome: ExportOutcome::Failed {
            stage: ExportStage::Pending,
            error: ExportError::WorkerLost {
                format: format.name().to_string(),
                message: e.to_string(),
            },
        },
        elapsed: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::{NamingPolicy, OutputTarget};
    use crate::domain::model::Record;
    use crate::utils::error::{ErrorKind, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockStorage {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
        fail_extension: Option<&'static str>,
        panic_extension: Option<&'static str>,
    }

    impl MockStorage {
        fn failing_on(extension: &'static str) -> Self {
            Self {
                fail_extension: Some(extension),
                ..Self::default()
            }
        }

        fn panicking_on(extension: &'static str) -> Self {
            Self {
                panic_extension: Some(extension),
                ..Self::default()
            }
        }
    }

    impl Storage for MockStorage {
        fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
            let extension = path.extension().and_then(|e| e.to_str());
            if extension.is_some() && extension == self.panic_extension {
                panic!("storage crashed writing {}", path.display());
            }
            if extension.is_some() && extension == self.fail_extension {
                return Err(ExportError::write_failure(
                    path,
                    std::io::Error::other("disk full"),
                ));
            }
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), data.to_vec());
            Ok(())
        }
    }

    fn products() -> Batch {
        Batch::from_records(vec![
            Record::new().with("name", "Widget").with("price", 9.99),
            Record::new().with("name", "Gadget").with("price", 19.5),
        ])
        .unwrap()
    }

    fn request(batch: Batch) -> ExportRequest {
        ExportRequest::new(
            ExportFormat::ALL,
            OutputTarget::new("out", NamingPolicy::new("data")),
            batch,
        )
    }

    #[tokio::test]
    async fn test_exports_every_format() {
        let coordinator = ExportCoordinator::new(ExportSettings::default(), MockStorage::default());
        let report = coordinator.export(request(products())).await;

        assert!(report.is_success());
        assert_eq!(
            report.written_paths(),
            vec![
                Path::new("out/data.csv"),
                Path::new("out/data.xml"),
                Path::new("out/data.xlsx")
            ]
        );
        let files = coordinator.storage.files.lock().unwrap();
        assert_eq!(
            files[Path::new("out/data.csv")],
            b"name,price\nWidget,9.99\nGadget,19.5\n"
        );
    }

    #[tokio::test]
    async fn test_write_failure_does_not_stop_siblings() {
        let coordinator =
            ExportCoordinator::new(ExportSettings::default(), MockStorage::failing_on("xml"));
        let report = coordinator.export(request(products())).await;

        assert!(!report.is_success());
        assert!(report.get(ExportFormat::Csv).unwrap().is_committed());
        assert!(report.get(ExportFormat::Xls).unwrap().is_committed());

        let xml = report.get(ExportFormat::Xml).unwrap();
        assert!(matches!(
            xml.outcome,
            ExportOutcome::Failed {
                stage: ExportStage::Writing,
                ref error
            } if error.kind() == ErrorKind::WriteFailure
        ));
    }

    #[tokio::test]
    async fn test_panicking_worker_only_loses_its_format() {
        for parallel in [false, true] {
            let settings = ExportSettings {
                parallel,
                ..ExportSettings::default()
            };
            let coordinator = ExportCoordinator::new(settings, MockStorage::panicking_on("xml"));
            let report = coordinator.export(request(products())).await;

            assert!(report.get(ExportFormat::Csv).unwrap().is_committed());
            assert!(report.get(ExportFormat::Xls).unwrap().is_committed());

            let xml = report.get(ExportFormat::Xml).unwrap();
            let error = xml.error().unwrap();
            assert_eq!(error.kind(), ErrorKind::WorkerLost);
            assert!(matches!(error, ExportError::WorkerLost { format, .. } if format == "xml"));
            assert!(xml.to_string().starts_with("xml: Failed(WorkerLost)"));
        }
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let batch = Batch::from_records(vec![Record::new()
            .with("name", "Widget")
            .with("in_stock", true)])
        .unwrap();

        let settings = ExportSettings {
            parallel: true,
            ..ExportSettings::default()
        };
        let parallel = ExportCoordinator::new(settings, MockStorage::default());
        let sequential = ExportCoordinator::new(ExportSettings::default(), MockStorage::default());

        let a = parallel.export(request(batch.clone())).await;
        let b = sequential.export(request(batch)).await;

        let summary = |r: &ExportReport| {
            r.results
                .iter()
                .map(|f| (f.format, f.stage()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&a), summary(&b));
        assert_eq!(
            summary(&a),
            vec![
                (ExportFormat::Csv, ExportStage::Committed),
                (ExportFormat::Xml, ExportStage::Committed),
                (ExportFormat::Xls, ExportStage::Failed),
            ]
        );
        assert_eq!(
            *parallel.storage.files.lock().unwrap(),
            *sequential.storage.files.lock().unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let coordinator = ExportCoordinator::new(ExportSettings::default(), MockStorage::default());
        let batch = Batch::empty(vec!["name".into()]).unwrap();
        let report = coordinator.export(request(batch)).await;

        assert_eq!(report.failures().count(), 3);
        assert!(report
            .failures()
            .all(|(_, e)| e.kind() == ErrorKind::EmptyBatch));
        assert!(coordinator.storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_header_only_request() {
        let coordinator = ExportCoordinator::new(ExportSettings::default(), MockStorage::default());
        let batch = Batch::empty(vec!["name".into(), "price".into()]).unwrap();
        let report = coordinator
            .export(request(batch).with_header_only(true))
            .await;

        assert!(report.is_success());
        let files = coordinator.storage.files.lock().unwrap();
        assert_eq!(files[Path::new("out/data.csv")], b"name,price\n");
        assert_eq!(files[Path::new("out/data.xml")], b"<records></records>");
    }
}
