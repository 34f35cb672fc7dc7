use crate::utils::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One normalized scraped item: field name to scalar, in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    data: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Appends a field, replacing the value in place if the name is already present.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.data.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = value,
            None => self.data.push((name, value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|(name, _)| name.as_str())
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.data
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Values in field order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.data.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn has_schema(&self, schema: &[String]) -> bool {
        self.data.len() == schema.len()
            && self
                .data
                .iter()
                .zip(schema)
                .all(|((field, _), expected)| field == expected)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl From<serde_json::Map<String, Value>> for Record {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            data: map.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Ordered records that all share one ordered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    schema: Vec<String>,
    records: Vec<Record>,
}

impl Batch {
    pub fn new(schema: Vec<String>, records: Vec<Record>) -> Result<Self> {
        for (index, name) in schema.iter().enumerate() {
            if schema[..index].contains(name) {
                return Err(ExportError::DuplicateField { name: name.clone() });
            }
        }

        if let Some(index) = records.iter().position(|r| !r.has_schema(&schema)) {
            return Err(ExportError::SchemaMismatch {
                index,
                expected: schema,
                found: records[index].fields().map(str::to_string).collect(),
            });
        }

        Ok(Self { schema, records })
    }

    /// Takes the schema from the first record.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let schema = match records.first() {
            Some(first) => first.fields().map(str::to_string).collect(),
            None => {
                return Err(ExportError::InvalidInput {
                    message: "cannot infer a schema from zero records".to_string(),
                })
            }
        };
        Self::new(schema, records)
    }

    pub fn empty(schema: Vec<String>) -> Result<Self> {
        Self::new(schema, Vec::new())
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Short name of a scalar's JSON type, used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Text rendering shared by the text formats. Null renders as the empty string.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        nested => nested.to_string(),
    }
}
