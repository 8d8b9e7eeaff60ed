use crate::config::AdapterConfig;
use crate::types::ColumnDescriptor;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CachedColumns {
    columns: Vec<ColumnDescriptor>,
    cached_at: Instant,
}

/// Column descriptors per table, bounded by size and age.
///
/// Owned by a single adapter, so no locking. The adapter clears it whenever
/// it runs a statement that may have changed the schema.
pub struct SchemaCache {
    entries: LruCache<String, CachedColumns>,
    ttl: Duration,
}

impl SchemaCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Reads `column_cache_size` and `column_cache_ttl_secs`.
    pub fn from_config(config: &AdapterConfig) -> Self {
        let size = config
            .option_u64("column_cache_size")
            .and_then(|s| usize::try_from(s).ok())
            .unwrap_or(DEFAULT_CAPACITY);
        let ttl = config
            .option_u64("column_cache_ttl_secs")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TTL);
        Self::new(size, ttl)
    }

    pub fn get(&mut self, table: &str) -> Option<Vec<ColumnDescriptor>> {
        let entry = self.entries.get(table)?;
        if entry.cached_at.elapsed() > self.ttl {
            self.entries.pop(table);
            return None;
        }
        Some(entry.columns.clone())
    }

    pub fn put(&mut self, table: &str, columns: Vec<ColumnDescriptor>) {
        self.entries.put(
            table.to_string(),
            CachedColumns {
                columns,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;

    fn id_column() -> Vec<ColumnDescriptor> {
        vec![ColumnDescriptor::new("id", "NUMBER(38)", ColumnType::Integer)]
    }

    #[test]
    fn test_schema_cache_miss_then_hit() {
        let mut cache = SchemaCache::new(10, Duration::from_secs(60));
        assert!(cache.get("t1").is_none());
        cache.put("t1", id_column());
        let got = cache.get("t1").expect("should be present");
        assert_eq!(got[0].name, "id");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_schema_cache_ttl_expiry() {
        let mut cache = SchemaCache::new(10, Duration::from_millis(1));
        cache.put("t1", id_column());
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("t1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_schema_cache_evicts_least_recent() {
        let mut cache = SchemaCache::new(1, Duration::from_secs(60));
        cache.put("t1", id_column());
        cache.put("t2", id_column());
        assert!(cache.get("t1").is_none());
        assert!(cache.get("t2").is_some());
    }

    #[test]
    fn test_schema_cache_from_config() {
        let config = AdapterConfig::new()
            .with_option("column_cache_size", 5)
            .with_option("column_cache_ttl_secs", "30");
        let cache = SchemaCache::from_config(&config);
        assert_eq!(cache.capacity(), 5);
        assert_eq!(cache.ttl(), Duration::from_secs(30));

        let cache = SchemaCache::new(0, DEFAULT_TTL);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_schema_cache_clear() {
        let mut cache = SchemaCache::default();
        cache.put("t1", id_column());
        cache.clear();
        assert!(cache.get("t1").is_none());
    }
}
