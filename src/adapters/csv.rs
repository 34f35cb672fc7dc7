use crate::domain::format::ExportFormat;
use crate::domain::model::{value_text, Batch};
use crate::domain::ports::FormatAdapter;
use crate::utils::error::Result;
use csv::{QuoteStyle, Terminator, WriterBuilder};

#[derive(Debug, Clone)]
pub struct CsvAdapter {
    delimiter: u8,
}

impl CsvAdapter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl FormatAdapter for CsvAdapter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn encode(&self, batch: &Batch) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(batch.schema())?;
        for record in batch.records() {
            writer.write_record(record.values().map(value_text))?;
        }

        writer.into_inner().map_err(|e| e.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Record;
    use serde_json::json;

    fn encode(batch: &Batch) -> String {
        let bytes = CsvAdapter::default().serialize(batch, false).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_products() {
        let batch = Batch::from_records(vec![
            Record::new().with("name", "Widget").with("price", 9.99),
            Record::new().with("name", "Gadget").with("price", 19.5),
        ])
        .unwrap();

        assert_eq!(encode(&batch), "name,price\nWidget,9.99\nGadget,19.5\n");
    }

    #[test]
    fn test_quotes_special_characters() {
        let batch = Batch::from_records(vec![
            Record::new().with("a", "x,y").with("b", "say \"hi\""),
            Record::new().with("a", "line\nbreak").with("b", json!(null)),
        ])
        .unwrap();

        assert_eq!(
            encode(&batch),
            "a,b\n\"x,y\",\"say \"\"hi\"\"\"\n\"line\nbreak\",\n"
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let batch =
            Batch::from_records(vec![Record::new().with("a", "x\ty").with("b", "z")]).unwrap();
        let bytes = CsvAdapter::new(b'\t').serialize(&batch, false).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a\tb\n\"x\ty\"\tz\n");
    }

    #[test]
    fn test_header_only() {
        let batch = Batch::empty(vec!["name".into(), "price".into()]).unwrap();
        assert!(CsvAdapter::default().serialize(&batch, false).is_err());

        let bytes = CsvAdapter::default().serialize(&batch, true).unwrap();
        assert_eq!(bytes, b"name,price\n");
    }
}
