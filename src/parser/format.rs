//! Format-aware default parser backed by the `config` crate.

use super::{DocumentParser, parse_properties};
use crate::core::{DocumentFormat, FlatMapping, KEY_DELIMITER};
use crate::error::{ConfigError, Result};
use config::{File, FileFormat, Value, ValueKind};
use std::collections::HashMap;

/// Default parser: dispatches on the source's [`DocumentFormat`].
///
/// JSON, YAML, TOML and INI documents are parsed with the `config` crate and
/// flattened with `.` between nested keys and array indices
/// (`servers.0.host`). Properties documents are parsed line by line.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::core::DocumentFormat;
/// use hotswap_nacos::parser::{DocumentParser, FormatParser};
///
/// let parser = FormatParser::new();
/// let mapping = parser
///     .parse(r#"{"database": {"host": "localhost", "port": 5432}}"#, DocumentFormat::Json)
///     .unwrap();
///
/// assert_eq!(mapping.get("database.host"), Some("localhost"));
/// assert_eq!(mapping.get("database.port"), Some("5432"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatParser;

impl FormatParser {
    /// Create a new format parser.
    pub fn new() -> Self {
        FormatParser
    }
}

impl DocumentParser for FormatParser {
    fn parse(&self, document: &str, format: DocumentFormat) -> Result<FlatMapping> {
        if document.trim().is_empty() {
            return Ok(FlatMapping::new());
        }

        match format {
            DocumentFormat::Properties => parse_properties(document),
            structured => parse_structured(document, file_format(structured)?),
        }
    }
}

fn file_format(format: DocumentFormat) -> Result<FileFormat> {
    match format {
        #[cfg(feature = "json")]
        DocumentFormat::Json => Ok(FileFormat::Json),
        #[cfg(not(feature = "json"))]
        DocumentFormat::Json => Err(ConfigError::FeatureNotEnabled("json")),

        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => Ok(FileFormat::Yaml),
        #[cfg(not(feature = "yaml"))]
        DocumentFormat::Yaml => Err(ConfigError::FeatureNotEnabled("yaml")),

        #[cfg(feature = "toml")]
        DocumentFormat::Toml => Ok(FileFormat::Toml),
        #[cfg(not(feature = "toml"))]
        DocumentFormat::Toml => Err(ConfigError::FeatureNotEnabled("toml")),

        #[cfg(feature = "ini")]
        DocumentFormat::Ini => Ok(FileFormat::Ini),
        #[cfg(not(feature = "ini"))]
        DocumentFormat::Ini => Err(ConfigError::FeatureNotEnabled("ini")),

        DocumentFormat::Properties => Err(ConfigError::Other(
            "properties documents are not parsed by the config crate".to_string(),
        )),
    }
}

fn parse_structured(document: &str, format: FileFormat) -> Result<FlatMapping> {
    let parsed = config::Config::builder()
        .add_source(File::from_str(document, format))
        .build()
        .map_err(|e| ConfigError::parse(format!("Failed to parse document: {}", e)))?;

    let table = parsed
        .try_deserialize::<HashMap<String, Value>>()
        .map_err(|e| ConfigError::parse(format!("Document root is not a table: {}", e)))?;

    let mut mapping = FlatMapping::new();
    for (key, value) in table {
        flatten(&key, value, &mut mapping)?;
    }
    Ok(mapping)
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, KEY_DELIMITER, key)
    }
}

fn flatten(prefix: &str, value: Value, mapping: &mut FlatMapping) -> Result<()> {
    match value.kind {
        ValueKind::Table(table) => {
            for (key, nested) in table {
                flatten(&join(prefix, &key), nested, mapping)?;
            }
        }
        ValueKind::Array(items) => {
            for (index, nested) in items.into_iter().enumerate() {
                flatten(&join(prefix, &index.to_string()), nested, mapping)?;
            }
        }
        ValueKind::Nil => {
            mapping.insert(prefix, "");
        }
        scalar => {
            let text = Value::new(None, scalar)
                .into_string()
                .map_err(|e| ConfigError::parse(format!("Invalid value for '{}': {}", prefix, e)))?;
            mapping.insert(prefix, text);
        }
    }
    Ok(())
}
