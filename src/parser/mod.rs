//! Document parsers turning raw remote documents into flat mappings.

mod format;
mod properties;

pub use format::FormatParser;
pub use properties::parse_properties;

use crate::core::{DocumentFormat, FlatMapping};
use crate::error::Result;

/// Converts the text of one remote document into a flat key/value mapping.
///
/// An aggregator holds exactly one parser and hands it the format of the source
/// each document belongs to. Parsers that only understand one format may
/// ignore the argument. Closures with the same signature implement the trait.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::core::{DocumentFormat, FlatMapping};
/// use hotswap_nacos::parser::DocumentParser;
///
/// let csv = |document: &str, _format: DocumentFormat| -> hotswap_nacos::error::Result<FlatMapping> {
///     Ok(document
///         .split(',')
///         .filter_map(|pair| pair.split_once('='))
///         .collect::<FlatMapping>())
/// };
///
/// let mapping = csv.parse("a=1,b=2", DocumentFormat::Properties).unwrap();
/// assert_eq!(mapping.get("b"), Some("2"));
/// ```
pub trait DocumentParser: Send + Sync {
    /// Parse `document`, written in `format`, into a flat mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseFailure`](crate::error::ConfigError::ParseFailure)
    /// if the document is malformed.
    fn parse(&self, document: &str, format: DocumentFormat) -> Result<FlatMapping>;
}

impl<F> DocumentParser for F
where
    F: Fn(&str, DocumentFormat) -> Result<FlatMapping> + Send + Sync,
{
    fn parse(&self, document: &str, format: DocumentFormat) -> Result<FlatMapping> {
        self(document, format)
    }
}
