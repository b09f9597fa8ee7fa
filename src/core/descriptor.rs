//! Source descriptors: the identity and policy of one watched document.

use serde::Deserialize;
use std::fmt;

/// Group used when a descriptor does not name one.
pub const DEFAULT_GROUP: &str = "DEFAULT_GROUP";

/// Namespace used for source keys when neither the descriptor nor the
/// aggregator names one.
pub const DEFAULT_NAMESPACE: &str = "public";

/// Format of a remote document, used by the parser to flatten it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// JSON object documents.
    #[default]
    Json,
    /// YAML mapping documents.
    #[serde(alias = "yml")]
    Yaml,
    /// TOML documents.
    Toml,
    /// INI documents, sections become key prefixes.
    Ini,
    /// Java-style `key=value` lines.
    #[serde(alias = "props")]
    Properties,
}

impl DocumentFormat {
    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "ini" => Some(Self::Ini),
            "properties" | "props" => Some(Self::Properties),
            _ => None,
        }
    }

    /// Detect the format from the extension of a data id, falling back to JSON.
    pub fn detect(data_id: &str) -> Self {
        data_id
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .unwrap_or_default()
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Ini => "ini",
            Self::Properties => "properties",
        };
        f.write_str(name)
    }
}

/// The coordinates handed to the remote service for one document.
///
/// `namespace: None` means the document is addressed without a namespace
/// qualifier and the remote service applies its own default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    /// Document identifier
    pub data_id: String,
    /// Document group
    pub group: String,
    /// Namespace qualifier, if any
    pub namespace: Option<String>,
}

impl Coordinates {
    /// Coordinates without a namespace qualifier.
    pub fn new(data_id: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            data_id: data_id.into(),
            group: group.into(),
            namespace: None,
        }
    }

    /// Qualify these coordinates with a namespace.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dataId={}, group={}", self.data_id, self.group)?;
        if let Some(namespace) = &self.namespace {
            write!(f, ", namespace={}", namespace)?;
        }
        Ok(())
    }
}

/// Normalized, case-insensitive identity of a source: `namespace#group#data_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(String);

impl SourceKey {
    /// Derive the key for a descriptor, substituting `default_namespace` when
    /// the descriptor has none.
    pub fn derive(descriptor: &SourceDescriptor, default_namespace: &str) -> Self {
        let namespace = descriptor.namespace().unwrap_or(default_namespace);
        Self::from_parts(namespace, &descriptor.group, &descriptor.data_id)
    }

    /// Build a key from its three parts.
    pub fn from_parts(namespace: &str, group: &str, data_id: &str) -> Self {
        SourceKey(format!("{}#{}#{}", namespace, group, data_id).to_lowercase())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

/// Immutable identity and failure policy of one watched remote document.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::core::{DocumentFormat, SourceDescriptor};
///
/// let source = SourceDescriptor::new("orders.yaml")
///     .with_group("SHOP")
///     .with_namespace("prod")
///     .with_optional(true);
///
/// assert_eq!(source.format(), DocumentFormat::Yaml);
/// assert_eq!(source.namespace(), Some("prod"));
/// assert!(source.is_optional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDescriptor {
    #[serde(alias = "dataId", alias = "dataid")]
    data_id: String,
    #[serde(default = "default_group")]
    group: String,
    #[serde(default, alias = "tenant")]
    namespace: Option<String>,
    #[serde(default)]
    format: Option<DocumentFormat>,
    #[serde(default)]
    optional: bool,
}

impl SourceDescriptor {
    /// Create a required descriptor in the default group.
    pub fn new(data_id: impl Into<String>) -> Self {
        Self {
            data_id: data_id.into(),
            group: default_group(),
            namespace: None,
            format: None,
            optional: false,
        }
    }

    /// Set the group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Qualify the document with a namespace. Blank namespaces count as absent.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Override the format detected from the data id.
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Mark the source as optional: its failures never abort a load or reload.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Document identifier.
    pub fn data_id(&self) -> &str {
        &self.data_id
    }

    /// Document group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Namespace qualifier, `None` when absent or blank.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .filter(|namespace| !namespace.trim().is_empty())
    }

    /// Document format, explicit or detected from the data id.
    pub fn format(&self) -> DocumentFormat {
        self.format
            .unwrap_or_else(|| DocumentFormat::detect(&self.data_id))
    }

    /// Whether failures of this source are tolerated.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Coordinates to hand to the remote service.
    pub fn coordinates(&self) -> Coordinates {
        let coordinates = Coordinates::new(&self.data_id, &self.group);
        match self.namespace() {
            Some(namespace) => coordinates.in_namespace(namespace),
            None => coordinates,
        }
    }
}

/// A descriptor paired with its derived key, in registration order.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    descriptor: SourceDescriptor,
    key: SourceKey,
}

impl ResolvedSource {
    /// Resolve a descriptor against the aggregator-wide default namespace.
    pub fn new(descriptor: SourceDescriptor, default_namespace: &str) -> Self {
        let key = SourceKey::derive(&descriptor, default_namespace);
        Self { descriptor, key }
    }

    /// The source descriptor.
    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    /// The normalized source key.
    pub fn key(&self) -> &SourceKey {
        &self.key
    }
}

impl fmt::Display for ResolvedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor.coordinates())
    }
}
