//! Template parse cache for RustKit Grid.
//!
//! Memoizes [`TemplateParser`] output across layout invocations with LRU
//! eviction. Entries are keyed by property, the unparsed string and the font
//! reference sizes, so a cached parse is always what a fresh parse would
//! return, diagnostics included.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::style::FontContext;
use crate::template::{AreaGrid, Parsed, TemplateParser, TemplateProperty, TrackDefinition, TrackSize};

/// Cache key for a template string.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    /// Property the string was declared for.
    pub property: TemplateProperty,
    /// Unparsed declaration value.
    pub value: String,
    em_bits: u32,
    rem_bits: u32,
}

impl CacheKey {
    pub fn new(property: TemplateProperty, value: &str, font: FontContext) -> Self {
        Self {
            property,
            value: value.to_string(),
            em_bits: font.em.to_bits(),
            rem_bits: font.rem.to_bits(),
        }
    }
}

#[derive(Debug, Clone)]
enum CachedTemplate {
    Tracks(Parsed<TrackDefinition>),
    AutoTracks(Parsed<Vec<TrackSize>>),
    Areas(Parsed<Option<AreaGrid>>),
}

/// Cache entry with LRU tracking.
struct CacheEntry {
    value: CachedTemplate,
    last_accessed: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub insertions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoized template parses.
pub struct TemplateCache {
    entries: HashMap<CacheKey, CacheEntry>,
    capacity: usize,
    tick: u64,
    stats: CacheStats,
}

impl TemplateCache {
    /// Create a cache holding at most `capacity` parses. Zero disables storage.
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "Template cache initialized");
        Self {
            entries: HashMap::new(),
            capacity,
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    /// Parse (or recall) a `grid-template-*` track list.
    pub fn track_list(
        &mut self,
        parser: &TemplateParser,
        property: TemplateProperty,
        value: &str,
    ) -> Parsed<TrackDefinition> {
        let key = CacheKey::new(property, value, parser.font());
        if let Some(CachedTemplate::Tracks(parsed)) = self.lookup(&key) {
            return parsed.clone();
        }
        let parsed = parser.parse_track_list(property, value);
        self.store(key, CachedTemplate::Tracks(parsed.clone()));
        parsed
    }

    /// Parse (or recall) a `grid-auto-*` track list.
    pub fn auto_tracks(
        &mut self,
        parser: &TemplateParser,
        property: TemplateProperty,
        value: &str,
    ) -> Parsed<Vec<TrackSize>> {
        let key = CacheKey::new(property, value, parser.font());
        if let Some(CachedTemplate::AutoTracks(parsed)) = self.lookup(&key) {
            return parsed.clone();
        }
        let parsed = parser.parse_auto_tracks(property, value);
        self.store(key, CachedTemplate::AutoTracks(parsed.clone()));
        parsed
    }

    /// Parse (or recall) `grid-template-areas`.
    pub fn areas(&mut self, parser: &TemplateParser, value: &str) -> Parsed<Option<AreaGrid>> {
        let key = CacheKey::new(TemplateProperty::TemplateAreas, value, parser.font());
        if let Some(CachedTemplate::Areas(parsed)) = self.lookup(&key) {
            return parsed.clone();
        }
        let parsed = parser.parse_areas(value);
        self.store(key, CachedTemplate::Areas(parsed.clone()));
        parsed
    }

    fn lookup(&mut self, key: &CacheKey) -> Option<&CachedTemplate> {
        self.tick += 1;
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed = self.tick;
                self.stats.hits += 1;
                trace!(property = key.property.name(), value = %key.value, "Template cache hit");
                Some(&entry.value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    fn store(&mut self, key: CacheKey, value: CachedTemplate) {
        if self.capacity == 0 {
            return;
        }

        while self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(oldest) => {
                    trace!(property = oldest.property.name(), value = %oldest.value, "Evicting template");
                    self.entries.remove(&oldest);
                    self.stats.evictions += 1;
                }
                None => break,
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_accessed: self.tick,
            },
        );
        self.stats.insertions += 1;
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        debug!("Template cache cleared");
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::style::GridConfig;

    fn parser(em: f32) -> TemplateParser {
        TemplateParser::new(FontContext { em, rem: 16.0 }, &GridConfig::default())
    }

    #[test]
    fn test_cache_hit() {
        let mut cache = TemplateCache::new(8);
        let p = parser(16.0);

        let first = cache.track_list(&p, TemplateProperty::TemplateColumns, "1fr 2em");
        let second = cache.track_list(&p, TemplateProperty::TemplateColumns, "1fr 2em");

        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_font_is_part_of_key() {
        let mut cache = TemplateCache::new(8);

        let small = cache.track_list(&parser(10.0), TemplateProperty::TemplateColumns, "2em");
        let large = cache.track_list(&parser(20.0), TemplateProperty::TemplateColumns, "2em");

        assert_ne!(small.value, large.value);
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_property_is_part_of_key() {
        let mut cache = TemplateCache::new(8);
        let p = parser(16.0);

        cache.track_list(&p, TemplateProperty::TemplateColumns, "10px");
        let rows = cache.auto_tracks(&p, TemplateProperty::AutoRows, "10px");

        assert_eq!(rows.value, vec![TrackSize::Px(10.0)]);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = TemplateCache::new(2);
        let p = parser(16.0);

        cache.track_list(&p, TemplateProperty::TemplateColumns, "1px");
        cache.track_list(&p, TemplateProperty::TemplateColumns, "2px");
        // Touch "1px" so "2px" is the oldest.
        cache.track_list(&p, TemplateProperty::TemplateColumns, "1px");
        cache.track_list(&p, TemplateProperty::TemplateColumns, "3px");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);

        cache.track_list(&p, TemplateProperty::TemplateColumns, "1px");
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_zero_capacity_disables_storage() {
        let mut cache = TemplateCache::new(0);
        let p = parser(16.0);

        cache.areas(&p, "\"a\"");
        cache.areas(&p, "\"a\"");

        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_diagnostics_replayed_on_hit() {
        let mut cache = TemplateCache::new(4);
        let p = parser(16.0);

        cache.areas(&p, "\"a a\" \"b a\"");
        let again = cache.areas(&p, "\"a a\" \"b a\"");

        assert_eq!(again.value, None);
        assert!(matches!(
            again.diagnostics.as_slice(),
            [Diagnostic::InvalidTemplate { .. }]
        ));
    }
}
