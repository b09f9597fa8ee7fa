//! Java-style properties documents.

use crate::core::FlatMapping;
use crate::error::{ConfigError, Result};

/// Parse `key=value` (or `key: value`) lines into a flat mapping.
///
/// Blank lines and lines starting with `#` or `!` are skipped. Keys and values
/// are trimmed; a later line for the same key wins.
///
/// # Errors
///
/// Returns a parse failure for a line without a separator or with an empty key.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::parser::parse_properties;
///
/// let mapping = parse_properties("# defaults\nserver.port = 8080\nserver.host: 0.0.0.0\n").unwrap();
/// assert_eq!(mapping.get("server.port"), Some("8080"));
/// assert_eq!(mapping.get("server.host"), Some("0.0.0.0"));
/// ```
pub fn parse_properties(document: &str) -> Result<FlatMapping> {
    let mut mapping = FlatMapping::new();

    for (index, line) in document.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let separator = line.find(['=', ':']).ok_or_else(|| {
            ConfigError::parse(format!("line {} has no '=' or ':' separator", index + 1))
        })?;
        let (key, value) = (line[..separator].trim(), line[separator + 1..].trim());
        if key.is_empty() {
            return Err(ConfigError::parse(format!("line {} has an empty key", index + 1)));
        }

        mapping.insert(key, value);
    }

    Ok(mapping)
}
