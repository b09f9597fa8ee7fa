//! Typed binding of a flat mapping into a host configuration type.

use crate::core::FlatMapping;
use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;

/// Convert a dotted key into a `config` path, turning numeric segments into
/// array subscripts (`hosts.0` becomes `hosts[0]`).
fn to_path(key: &str) -> String {
    let mut path = String::with_capacity(key.len() + 2);
    for segment in key.split('.') {
        if !path.is_empty() && !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(segment);
            path.push(']');
        } else {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);
        }
    }
    path
}

/// Deserialize a flat mapping into `T`.
///
/// Dotted keys become nested tables and numeric segments become array
/// indices. Values stay strings until `T` asks for a number or a boolean.
///
/// # Errors
///
/// Returns an error if a key cannot be expressed as a path or the values do
/// not fit `T`.
pub(crate) fn bind<T>(mapping: &FlatMapping) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut builder = config::Config::builder();

    for (key, value) in mapping.to_sorted_vec() {
        builder = builder.set_override(to_path(&key), value).map_err(|e| {
            ConfigError::DeserializationError(format!("Failed to set key '{}': {}", key, e))
        })?;
    }

    let config = builder.build().map_err(|e| {
        ConfigError::DeserializationError(format!("Failed to build configuration: {}", e))
    })?;

    config.try_deserialize::<T>().map_err(|e| {
        ConfigError::DeserializationError(format!("Failed to deserialize configuration: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct ServerConfig {
        port: u16,
        host: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestConfig {
        server: ServerConfig,
        debug: bool,
        replicas: Vec<String>,
    }

    #[test]
    fn test_to_path() {
        assert_eq!(to_path("port"), "port");
        assert_eq!(to_path("server.port"), "server.port");
        assert_eq!(to_path("replicas.0"), "replicas[0]");
        assert_eq!(to_path("replicas.1.host"), "replicas[1].host");
    }

    #[test]
    fn test_bind_nested() {
        let mapping: FlatMapping = [
            ("server.port", "8080"),
            ("server.host", "localhost"),
            ("debug", "true"),
            ("replicas.0", "r1"),
            ("replicas.1", "r2"),
        ]
        .into_iter()
        .collect();

        let config: TestConfig = bind(&mapping).unwrap();

        assert_eq!(
            config,
            TestConfig {
                server: ServerConfig {
                    port: 8080,
                    host: "localhost".to_string(),
                },
                debug: true,
                replicas: vec!["r1".to_string(), "r2".to_string()],
            }
        );
    }

    #[test]
    fn test_bind_type_mismatch() {
        let mapping: FlatMapping = [("port", "not-a-number"), ("host", "h")].into_iter().collect();
        let result: Result<ServerConfig> = bind(&mapping);
        assert!(matches!(result, Err(ConfigError::DeserializationError(_))));
    }
}
