use crate::config::{ExportSettings, TomlConfig};
use crate::domain::format::ExportFormat;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "scrape-export")]
#[command(about = "Export scraped records to CSV, XML or XLS files")]
pub struct CliConfig {
    /// File type(s) to export: csv, xml, xls (comma separated)
    #[arg(long)]
    pub filetype: Option<String>,

    /// JSON array or JSON Lines file holding the scraped records
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Declare the record schema (comma separated field names)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Directory the exported files are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output file name without extension
    #[arg(long)]
    pub base_name: Option<String>,

    /// Append a _YYYYmmdd_HHMMSS suffix to the base name
    #[arg(long)]
    pub timestamp: bool,

    /// Write a header-only file when there are no records
    #[arg(long)]
    pub header_only: bool,

    /// Export each requested format on its own worker
    #[arg(long)]
    pub parallel: bool,

    /// CSV field delimiter
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl CliConfig {
    /// Resolves the final settings: defaults, then the TOML file (if any),
    /// then flags given on the command line.
    pub fn resolve(&self) -> Result<ExportSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let toml = TomlConfig::from_file(path)?;
                toml.validate()?;
                ExportSettings::from_toml(&toml)?
            }
            None => ExportSettings::default(),
        };
        self.apply_to(&mut settings)?;
        settings.validate()?;
        Ok(settings)
    }

    fn apply_to(&self, settings: &mut ExportSettings) -> Result<()> {
        if let Some(filetype) = &self.filetype {
            settings.formats = ExportFormat::parse_list(filetype)?;
        }
        if let Some(input) = &self.input {
            settings.input = input.clone();
        }
        if !self.fields.is_empty() {
            settings.fields = Some(self.fields.clone());
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(base_name) = &self.base_name {
            settings.base_name = base_name.clone();
        }
        if let Some(delimiter) = self.delimiter {
            settings.csv_delimiter = validation::validate_delimiter("delimiter", delimiter)?;
        }
        settings.timestamped |= self.timestamp;
        settings.header_only |= self.header_only;
        settings.parallel |= self.parallel;
        settings.json_logs |= self.log_json;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ExportError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_filetype_flag() {
        let cli = CliConfig::parse_from(["scrape-export", "--filetype", "xls"]);
        let settings = cli.resolve().unwrap();
        assert_eq!(settings.formats, vec![ExportFormat::Xls]);
        assert_eq!(settings.base_name, "data");
    }

    #[test]
    fn test_multiple_filetypes() {
        let cli = CliConfig::parse_from(["scrape-export", "--filetype", "csv,xml,xls"]);
        assert_eq!(cli.resolve().unwrap().formats, ExportFormat::ALL.to_vec());
    }

    #[test]
    fn test_unknown_filetype() {
        let cli = CliConfig::parse_from(["scrape-export", "--filetype", "pdf"]);
        assert!(matches!(
            cli.resolve(),
            Err(ExportError::UnsupportedFormat(ref v)) if v == "pdf"
        ));
    }

    #[test]
    fn test_missing_filetype() {
        let cli = CliConfig::parse_from(["scrape-export"]);
        assert!(matches!(
            cli.resolve(),
            Err(ExportError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut config_file = NamedTempFile::new().unwrap();
        config_file
            .write_all(
                b"[export]\nformats = [\"csv\"]\nbase_name = \"from-file\"\noutput_dir = \"out\"\n",
            )
            .unwrap();

        let cli = CliConfig::parse_from([
            "scrape-export",
            "--config",
            config_file.path().to_str().unwrap(),
            "--base-name",
            "from-flag",
            "--fields",
            "name,price",
            "--parallel",
        ]);
        let settings = cli.resolve().unwrap();

        assert_eq!(settings.formats, vec![ExportFormat::Csv]);
        assert_eq!(settings.base_name, "from-flag");
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.fields, Some(vec!["name".into(), "price".into()]));
        assert!(settings.parallel);
    }
}
