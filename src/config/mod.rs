#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::xml::is_valid_element_name;
use crate::domain::format::ExportFormat;
use crate::utils::error::{ExportError, Result};
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_BASE_NAME: &str = "data";
pub const DEFAULT_INPUT: &str = "records.json";

/// Everything an export run needs, resolved from defaults, the TOML file
/// and command line flags (in increasing precedence).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub formats: Vec<ExportFormat>,
    pub input: PathBuf,
    pub fields: Option<Vec<String>>,
    pub output_dir: PathBuf,
    pub base_name: String,
    pub timestamped: bool,
    pub header_only: bool,
    pub parallel: bool,
    pub csv_delimiter: u8,
    pub xml_root_element: String,
    pub xml_record_element: String,
    pub xml_declaration: bool,
    pub xlsx_sheet_name: String,
    pub json_logs: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            input: PathBuf::from(DEFAULT_INPUT),
            fields: None,
            output_dir: PathBuf::from("."),
            base_name: DEFAULT_BASE_NAME.to_string(),
            timestamped: false,
            header_only: false,
            parallel: false,
            csv_delimiter: b',',
            xml_root_element: "records".to_string(),
            xml_record_element: "record".to_string(),
            xml_declaration: false,
            xlsx_sheet_name: "data".to_string(),
            json_logs: false,
        }
    }
}

impl ExportSettings {
    /// Layers the TOML file over the defaults.
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let mut settings = Self::default();
        config.apply_to(&mut settings)?;
        Ok(settings)
    }
}

impl Validate for ExportSettings {
    fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            return Err(ExportError::MissingConfigError {
                field: "filetype".to_string(),
            });
        }

        validation::validate_path("input", &self.input.to_string_lossy())?;
        validation::validate_path("output_dir", &self.output_dir.to_string_lossy())?;
        validation::validate_base_name("base_name", &self.base_name)?;
        validation::validate_sheet_name("xls.sheet_name", &self.xlsx_sheet_name)?;

        for (field, name) in [
            ("xml.root_element", &self.xml_root_element),
            ("xml.record_element", &self.xml_record_element),
        ] {
            if !is_valid_element_name(name) {
                return Err(ExportError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: name.clone(),
                    reason: "Not a valid XML element name".to_string(),
                });
            }
        }

        if let Some(fields) = &self.fields {
            if fields.is_empty() {
                return Err(ExportError::InvalidConfigValueError {
                    field: "fields".to_string(),
                    value: String::new(),
                    reason: "Declared schema must name at least one field".to_string(),
                });
            }
        }

        Ok(())
    }
}
