use crate::config::ExportSettings;
use crate::domain::format::ExportFormat;
use crate::utils::error::{ExportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern compiles"));

/// On-disk configuration. Every section and key is optional; missing
/// values fall back to [`ExportSettings::default`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub export: ExportSection,
    pub source: SourceSection,
    pub csv: CsvSection,
    pub xml: XmlSection,
    pub xls: XlsSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSection {
    pub formats: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    pub base_name: Option<String>,
    pub timestamped: Option<bool>,
    pub header_only: Option<bool>,
    pub parallel: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub input: Option<PathBuf>,
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvSection {
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XmlSection {
    pub root_element: Option<String>,
    pub record_element: Option<String>,
    pub declaration: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XlsSection {
    pub sheet_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// `compact` (default) or `json`.
    pub format: Option<String>,
}

impl TomlConfig {
    /// Loads and parses a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ExportError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML text after environment substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ExportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with its environment value; undefined variables are left as is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn formats(&self) -> Result<Option<Vec<ExportFormat>>> {
        self.export
            .formats
            .as_ref()
            .map(|names| {
                names
                    .iter()
                    .map(|name| name.parse())
                    .collect::<Result<Vec<ExportFormat>>>()
            })
            .transpose()
    }

    /// Copies every value present in the file onto `settings`.
    pub fn apply_to(&self, settings: &mut ExportSettings) -> Result<()> {
        if let Some(formats) = self.formats()? {
            settings.formats = formats;
        }
        if let Some(dir) = &self.export.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(base_name) = &self.export.base_name {
            settings.base_name = base_name.clone();
        }
        if let Some(timestamped) = self.export.timestamped {
            settings.timestamped = timestamped;
        }
        if let Some(header_only) = self.export.header_only {
            settings.header_only = header_only;
        }
        if let Some(parallel) = self.export.parallel {
            settings.parallel = parallel;
        }
        if let Some(input) = &self.source.input {
            settings.input = input.clone();
        }
        if let Some(fields) = &self.source.fields {
            settings.fields = Some(fields.clone());
        }
        if let Some(delimiter) = self.csv.delimiter {
            settings.csv_delimiter = validation::validate_delimiter("csv.delimiter", delimiter)?;
        }
        if let Some(root) = &self.xml.root_element {
            settings.xml_root_element = root.clone();
        }
        if let Some(record) = &self.xml.record_element {
            settings.xml_record_element = record.clone();
        }
        if let Some(declaration) = self.xml.declaration {
            settings.xml_declaration = declaration;
        }
        if let Some(sheet) = &self.xls.sheet_name {
            settings.xlsx_sheet_name = sheet.clone();
        }
        if self.logging.format.is_some() {
            settings.json_logs = self.json_logs();
        }
        Ok(())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .format
            .as_deref()
            .is_some_and(|format| format.eq_ignore_ascii_case("json"))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.formats()?;

        if let Some(format) = &self.logging.format {
            if !["compact", "json"].contains(&format.to_ascii_lowercase().as_str()) {
                return Err(ExportError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.clone(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        ExportSettings::from_toml(self)?;
        Ok(())
    }
}
