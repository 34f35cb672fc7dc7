// Adapters layer: concrete format encoders, storage backends and record sources.

pub mod csv;
pub mod source;
pub mod storage;
pub mod xlsx;
pub mod xml;

use crate::config::ExportSettings;
use crate::domain::format::ExportFormat;
use crate::domain::ports::FormatAdapter;

pub use self::csv::CsvAdapter;
pub use self::source::JsonFileSource;
pub use self::storage::LocalStorage;
pub use self::xlsx::XlsxAdapter;
pub use self::xml::XmlAdapter;

/// Static format to adapter lookup.
pub fn adapter_for(format: ExportFormat, settings: &ExportSettings) -> Box<dyn FormatAdapter> {
    match format {
        ExportFormat::Csv => Box::new(CsvAdapter::new(settings.csv_delimiter)),
        ExportFormat::Xml => Box::new(
            XmlAdapter::new(&settings.xml_root_element, &settings.xml_record_element)
                .with_declaration(settings.xml_declaration),
        ),
        ExportFormat::Xls => Box::new(XlsxAdapter::new(&settings.xlsx_sheet_name)),
    }
}
