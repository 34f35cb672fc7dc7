//! Single-sheet Office Open XML workbook writer.
//!
//! The workbook is assembled by hand from its XML parts and zipped. Strings
//! are written as inline strings so no shared string table is needed; the
//! header row uses a bold cell style.

use crate::adapters::xml::{escape_attr, escape_text};
use crate::domain::format::ExportFormat;
use crate::domain::model::{value_kind, Batch};
use crate::domain::ports::FormatAdapter;
use crate::utils::error::{ExportError, Result};
use serde_json::Value;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLUMNS: usize = 16_384;
pub const MAX_CELL_CHARS: usize = 32_767;

const HEADER_STYLE: u8 = 1;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

#[derive(Debug, Clone)]
pub struct XlsxAdapter {
    sheet_name: String,
}

impl XlsxAdapter {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    fn workbook_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            escape_attr(&self.sheet_name)
        )
    }
}

impl Default for XlsxAdapter {
    fn default() -> Self {
        Self::new("data")
    }
}

impl FormatAdapter for XlsxAdapter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xls
    }

    fn encode(&self, batch: &Batch) -> Result<Vec<u8>> {
        let sheet = sheet_xml(batch)?;
        let workbook = self.workbook_xml();

        let parts: [(&str, &str); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", &workbook),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/styles.xml", STYLES),
            ("xl/worksheets/sheet1.xml", &sheet),
        ];

        // Fixed timestamp keeps repeated exports byte-identical.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
        }
        let cursor = zip.finish()?;

        tracing::debug!(
            rows = batch.len() + 1,
            columns = batch.schema().len(),
            "encoded worksheet"
        );
        Ok(cursor.into_inner())
    }
}

/// Builds `xl/worksheets/sheet1.xml`, checking every cell on the way.
fn sheet_xml(batch: &Batch) -> Result<String> {
    let rows = batch.len() + 1;
    let columns = batch.schema().len();
    if rows > MAX_ROWS || columns > MAX_COLUMNS {
        return Err(ExportError::SheetLimitExceeded { rows, columns });
    }

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    let _ = write!(
        xml,
        r#"<dimension ref="A1:{}{}"/><sheetData>"#,
        column_name(columns.saturating_sub(1)),
        rows
    );

    xml.push_str(r#"<row r="1">"#);
    for (col, field) in batch.schema().iter().enumerate() {
        if field.chars().count() > MAX_CELL_CHARS {
            return Err(ExportError::UnsupportedCellValue {
                row: 1,
                field: field.clone(),
                reason: format!("header longer than {} characters", MAX_CELL_CHARS),
            });
        }
        push_string_cell(&mut xml, &cell_ref(col, 1), field, Some(HEADER_STYLE));
    }
    xml.push_str("</row>");

    // Sheet rows are 1-based and row 1 is the header.
    for (row, record) in (2..).zip(batch.records()) {
        let _ = write!(xml, r#"<row r="{}">"#, row);
        for (col, (field, value)) in batch.schema().iter().zip(record.values()).enumerate() {
            let reference = cell_ref(col, row);
            match value {
                Value::Null => {}
                Value::Number(n) => {
                    let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, reference, n);
                }
                Value::String(s) if s.chars().count() <= MAX_CELL_CHARS => {
                    push_string_cell(&mut xml, &reference, s, None);
                }
                Value::String(_) => {
                    return Err(ExportError::UnsupportedCellValue {
                        row,
                        field: field.clone(),
                        reason: format!("string longer than {} characters", MAX_CELL_CHARS),
                    })
                }
                other => {
                    return Err(ExportError::UnsupportedCellValue {
                        row,
                        field: field.clone(),
                        reason: format!(
                            "{} values cannot be stored in a spreadsheet cell",
                            value_kind(other)
                        ),
                    })
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

fn push_string_cell(xml: &mut String, reference: &str, text: &str, style: Option<u8>) {
    let style = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    let space = if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        r#" xml:space="preserve""#
    } else {
        ""
    };
    let _ = write!(
        xml,
        r#"<c r="{}" t="inlineStr"{}><is><t{}>{}</t></is></c>"#,
        reference,
        style,
        space,
        escape_text(text)
    );
}

/// Zero-based column index to spreadsheet letters: 0 -> A, 26 -> AA.
pub fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn cell_ref(col: usize, row: usize) -> String {
    format!("{}{}", column_name(col), row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Record;
    use serde_json::json;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(51), "AZ");
        assert_eq!(column_name(52), "BA");
        assert_eq!(column_name(16_383), "XFD");
    }

    #[test]
    fn test_typed_cells() {
        let batch = Batch::from_records(vec![
            Record::new().with("name", "Widget").with("price", 9.99),
            Record::new().with("name", " Gadget").with("price", json!(null)),
        ])
        .unwrap();

        let bytes = XlsxAdapter::default().serialize(&batch, false).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

        assert!(sheet.contains(r#"<dimension ref="A1:B3"/>"#));
        assert!(sheet.contains(r#"<c r="A1" t="inlineStr" s="1"><is><t>name</t></is></c>"#));
        assert!(sheet.contains(r#"<c r="B2"><v>9.99</v></c>"#));
        assert!(sheet.contains(r#"<t xml:space="preserve"> Gadget</t>"#));
        assert!(!sheet.contains(r#"r="B3""#));

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="data" sheetId="1" r:id="rId1"/>"#));
    }

    #[test]
    fn test_rejects_booleans_and_nested_values() {
        let batch = Batch::from_records(vec![
            Record::new().with("name", "Widget").with("in_stock", true),
        ])
        .unwrap();

        let err = XlsxAdapter::default().serialize(&batch, false).unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnsupportedCellValue { row: 2, ref field, .. } if field == "in_stock"
        ));

        let batch =
            Batch::from_records(vec![Record::new().with("tags", json!(["a", "b"]))]).unwrap();
        assert!(XlsxAdapter::default().serialize(&batch, false).is_err());
    }

    #[test]
    fn test_rejects_strings_over_cell_limit() {
        let batch = Batch::from_records(vec![
            Record::new().with("notes", "x".repeat(MAX_CELL_CHARS)),
            Record::new().with("notes", "x".repeat(MAX_CELL_CHARS + 1)),
        ])
        .unwrap();

        let err = XlsxAdapter::default().serialize(&batch, false).unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnsupportedCellValue { row: 3, ref field, .. } if field == "notes"
        ));
    }

    #[test]
    fn test_header_errors_point_at_the_header_row() {
        let long_name = "h".repeat(MAX_CELL_CHARS + 1);
        let batch = Batch::from_records(vec![Record::new().with(long_name.as_str(), 1)]).unwrap();

        let err = XlsxAdapter::default().serialize(&batch, false).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedCellValue { row: 1, .. }));
    }

    #[test]
    fn test_rejects_too_many_columns() {
        let schema: Vec<String> = (0..=MAX_COLUMNS).map(|i| format!("c{}", i)).collect();
        let batch = Batch::empty(schema).unwrap();

        let err = XlsxAdapter::default().serialize(&batch, true).unwrap_err();
        assert!(matches!(
            err,
            ExportError::SheetLimitExceeded { rows: 1, columns } if columns == MAX_COLUMNS + 1
        ));
    }

    #[test]
    fn test_output_is_reproducible() {
        let batch = Batch::from_records(vec![Record::new().with("id", 1)]).unwrap();
        let adapter = XlsxAdapter::new("products");
        assert_eq!(
            adapter.serialize(&batch, false).unwrap(),
            adapter.serialize(&batch, false).unwrap()
        );
    }

    #[test]
    fn test_header_only_sheet() {
        let batch = Batch::empty(vec!["id".into()]).unwrap();
        let bytes = XlsxAdapter::default().serialize(&batch, true).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<dimension ref="A1:A1"/>"#));
        assert!(!sheet.contains(r#"<row r="2">"#));
    }
}
