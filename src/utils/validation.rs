use crate::utils::error::{ExportError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// A base name becomes `<base>.<ext>` inside the output directory, so it
/// must not smuggle in directory components.
pub fn validate_base_name(field_name: &str, base_name: &str) -> Result<()> {
    validate_non_empty_string(field_name, base_name)?;

    if base_name.contains(['/', '\\', '\0']) || base_name == "." || base_name == ".." {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: base_name.to_string(),
            reason: "Base name must be a plain file name without directories".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_delimiter(field_name: &str, delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' || delimiter == '\r' {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.escape_default().to_string(),
            reason: "Delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        });
    }
    Ok(delimiter as u8)
}

/// Worksheet names: 1..=31 chars, none of `[]:*?/\`.
pub fn validate_sheet_name(field_name: &str, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("Sheet name cannot be empty".to_string())
    } else if name.chars().count() > 31 {
        Some("Sheet name cannot be longer than 31 characters".to_string())
    } else if name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        Some("Sheet name cannot contain any of []:*?/\\".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
