use crate::domain::format::ExportFormat;
use crate::domain::model::{value_text, Batch};
use crate::domain::ports::FormatAdapter;
use crate::utils::error::{ExportError, Result};
use serde_json::Value;
use std::collections::HashMap;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Debug, Clone)]
pub struct XmlAdapter {
    root_element: String,
    record_element: String,
    declaration: bool,
}

impl XmlAdapter {
    pub fn new(root_element: impl Into<String>, record_element: impl Into<String>) -> Self {
        Self {
            root_element: root_element.into(),
            record_element: record_element.into(),
            declaration: false,
        }
    }

    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// Sanitized element name per schema field, in schema order.
    pub fn element_names(schema: &[String]) -> Result<Vec<String>> {
        let mut seen: HashMap<String, &str> = HashMap::with_capacity(schema.len());
        let mut names = Vec::with_capacity(schema.len());

        for field in schema {
            let element = sanitize_element_name(field)?;
            if let Some(other) = seen.insert(element.clone(), field) {
                return Err(ExportError::InvalidFieldName {
                    name: field.clone(),
                    reason: format!("collides with field '{}' as <{}>", other, element),
                });
            }
            names.push(element);
        }

        Ok(names)
    }
}

impl Default for XmlAdapter {
    fn default() -> Self {
        Self::new("records", "record")
    }
}

impl FormatAdapter for XmlAdapter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xml
    }

    fn encode(&self, batch: &Batch) -> Result<Vec<u8>> {
        let elements = Self::element_names(batch.schema())?;
        let mut out = String::new();

        if self.declaration {
            out.push_str(XML_DECLARATION);
        }

        out.push_str(&format!("<{}>", self.root_element));
        for record in batch.records() {
            out.push_str(&format!("<{}>", self.record_element));
            for (element, value) in elements.iter().zip(record.values()) {
                match value {
                    Value::Null => out.push_str(&format!("<{}/>", element)),
                    other => out.push_str(&format!(
                        "<{0}>{1}</{0}>",
                        element,
                        escape_text(&value_text(other))
                    )),
                }
            }
            out.push_str(&format!("</{}>", self.record_element));
        }
        out.push_str(&format!("</{}>", self.root_element));

        Ok(out.into_bytes())
    }
}

/// Maps a field name onto a valid XML element name.
pub fn sanitize_element_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(ExportError::InvalidFieldName {
            name: name.to_string(),
            reason: "empty names have no element form".to_string(),
        });
    }

    let mut element: String = name
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();

    let starts_ok = element.chars().next().is_some_and(is_name_start_char);
    let reserved = element
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("xml"));
    if !starts_ok || reserved {
        element.insert(0, '_');
    }

    Ok(element)
}

/// XML 1.0 `NameStartChar`, minus `:` which is reserved for namespaces.
fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// XML 1.0 `NameChar`, minus `:`.
fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

pub fn is_valid_element_name(name: &str) -> bool {
    sanitize_element_name(name).is_ok_and(|element| element == name)
}

/// Escapes character data. `\r` is kept as a reference so parsers do not
/// normalize it away; characters XML 1.0 cannot carry are dropped.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' | '\n' => escaped.push(c),
            c if c < ' ' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Character data escaping plus `"`, for attribute values.
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}
