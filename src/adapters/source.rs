use crate::domain::model::{Batch, Record};
use crate::domain::ports::RecordSource;
use crate::utils::error::{ExportError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Reads scraped records dumped to disk, either as a JSON array of objects
/// or as JSON Lines (one object per line, chosen by a `.jsonl`/`.ndjson`
/// extension). Field order of the first record becomes the schema.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    schema: Option<Vec<String>>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: None,
        }
    }

    /// Declares the schema up front, which also allows empty inputs.
    pub fn with_schema(mut self, schema: Vec<String>) -> Self {
        self.schema = Some(schema);
        self
    }

    fn is_json_lines(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson")
            })
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch(&self) -> Result<Batch> {
        tracing::debug!("Reading records from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ExportError::read_failure(&self.path, e))?;

        let values: Vec<Value> = if self.is_json_lines() {
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<Value>)
                .collect::<std::result::Result<_, _>>()?
        } else {
            match serde_json::from_str::<Value>(&content)? {
                Value::Array(items) => items,
                other => {
                    return Err(ExportError::InvalidInput {
                        message: format!(
                            "expected a JSON array of records, found {}",
                            crate::domain::model::value_kind(&other)
                        ),
                    })
                }
            }
        };

        let records = parse_records(values)?;
        tracing::info!(
            "Loaded {} records from {}",
            records.len(),
            self.path.display()
        );

        match &self.schema {
            Some(schema) => Batch::new(schema.clone(), records),
            None => Batch::from_records(records),
        }
    }
}

fn parse_records(values: Vec<Value>) -> Result<Vec<Record>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => Ok(Record::from(map)),
            other => Err(ExportError::InvalidInput {
                message: format!(
                    "record {} is a {}, expected an object",
                    index,
                    crate::domain::model::value_kind(&other)
                ),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_json_array_keeps_field_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        std::fs::write(
            &path,
            r#"[{"name": "Widget", "price": 9.99, "id": 1}, {"name": "Gadget", "price": 19.5, "id": 2}]"#,
        )
        .unwrap();

        let batch = JsonFileSource::new(&path).fetch().await.unwrap();
        assert_eq!(batch.schema(), ["name", "price", "id"]);
        assert_eq!(batch.records()[1].value("price"), Some(&json!(19.5)));
    }

    #[tokio::test]
    async fn test_fetch_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        std::fs::write(&path, "{\"a\": 1}\n\n{\"a\": null}\n").unwrap();

        let batch = JsonFileSource::new(&path).fetch().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records()[1].value("a"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_rejects_non_object_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        std::fs::write(&path, "[{\"a\": 1}, 2]").unwrap();

        let err = JsonFileSource::new(&path).fetch().await.unwrap_err();
        assert!(matches!(err, ExportError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_input_is_a_read_failure() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");

        let err = JsonFileSource::new(&missing).fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadFailure);
        assert!(matches!(err, ExportError::ReadFailure { ref path, .. } if *path == missing));
        assert_eq!(
            err.recovery_suggestion(),
            "Check the input file exists and is UTF-8 encoded"
        );

        let latin1 = temp_dir.path().join("latin1.json");
        std::fs::write(&latin1, b"[{\"name\": \"caf\xe9\"}]").unwrap();
        let err = JsonFileSource::new(&latin1).fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadFailure);
    }

    #[test]
    fn test_empty_input_with_declared_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        std::fs::write(&path, "[]").unwrap();

        let source = JsonFileSource::new(&path).with_schema(vec!["name".into()]);
        let batch = tokio_test::block_on(source.fetch()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.schema(), ["name"]);
    }
}
