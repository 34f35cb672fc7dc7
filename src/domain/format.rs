use crate::utils::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of export formats. Declaration order is the order
/// formats are exported and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xml,
    Xls,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Xml, ExportFormat::Xls];

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Xls => "xls",
        }
    }

    /// `xls` output is an Office Open XML workbook, hence `.xlsx`.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Xls => "xlsx",
        }
    }

    /// Parses a comma separated list such as `csv,xml`.
    pub fn parse_list(input: &str) -> Result<Vec<ExportFormat>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "xls" | "xlsx" => Ok(ExportFormat::Xls),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xls);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(v)) if v == "pdf"
        ));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ExportFormat::parse_list("xls, csv").unwrap(),
            vec![ExportFormat::Xls, ExportFormat::Csv]
        );
        assert!(ExportFormat::parse_list("csv,json").is_err());
    }

    #[test]
    fn test_extensions_are_distinct() {
        let mut extensions: Vec<_> = ExportFormat::ALL.iter().map(|f| f.extension()).collect();
        extensions.dedup();
        assert_eq!(extensions.len(), ExportFormat::ALL.len());
    }
}
