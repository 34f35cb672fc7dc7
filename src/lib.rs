pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ExportSettings, TomlConfig};

pub use adapters::{CsvAdapter, JsonFileSource, LocalStorage, XlsxAdapter, XmlAdapter};
pub use core::coordinator::ExportCoordinator;
pub use core::engine::ExportEngine;
pub use core::report::{ExportOutcome, ExportReport, ExportStage, FormatReport};
pub use core::request::{ExportRequest, NamingPolicy, OutputTarget};
pub use domain::format::ExportFormat;
pub use domain::model::{Batch, Record};
pub use utils::error::{ErrorKind, ExportError, Result};
