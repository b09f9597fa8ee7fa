//! Deterministic overlay of every source's cached document.

use crate::core::{FlatMapping, ResolvedSource, SourceCache};
use crate::error::Result;

/// Merge the cached documents of `sources` into one mapping.
///
/// Sources are visited in the given order; a source without a cached document
/// is skipped. Each present document is parsed and overlaid onto the
/// accumulator, so later sources win on duplicate keys. Parse errors are
/// returned as-is; classifying them as fatal or tolerated is the caller's job.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::core::{merge, FlatMapping, ResolvedSource, SourceCache, SourceDescriptor};
/// use hotswap_nacos::parser::{DocumentParser, FormatParser};
///
/// let sources = vec![
///     ResolvedSource::new(SourceDescriptor::new("a.properties"), "public"),
///     ResolvedSource::new(SourceDescriptor::new("b.properties"), "public"),
/// ];
/// let cache = SourceCache::new();
/// cache.put(sources[0].key().clone(), "k1=a\nk2=a");
/// cache.put(sources[1].key().clone(), "k2=b");
///
/// let parser = FormatParser::new();
/// let merged = merge(&sources, &cache, |source, document| {
///     parser.parse(document, source.descriptor().format())
/// })
/// .unwrap();
///
/// assert_eq!(merged.get("k1"), Some("a"));
/// assert_eq!(merged.get("k2"), Some("b"));
/// ```
pub fn merge<'a, I, F>(sources: I, cache: &SourceCache, mut parse: F) -> Result<FlatMapping>
where
    I: IntoIterator<Item = &'a ResolvedSource>,
    F: FnMut(&ResolvedSource, &str) -> Result<FlatMapping>,
{
    let mut merged = FlatMapping::new();

    for source in sources {
        let Some(document) = cache.get(source.key()) else {
            continue;
        };
        merged.overlay(parse(source, &document)?);
    }

    Ok(merged)
}
