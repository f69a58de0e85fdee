use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
    time::{Duration, Instant},
};

use sqlx::postgres::PgConnectOptions;

use crate::{
    dal::hotel_db::{self, HOTELS_QUERY},
    domain::{
        notification::{Level, Notifications},
        result_set::ResultSet,
    },
};

struct CachedResult {
    loaded_at: Instant,
    result: Arc<ResultSet>,
}

/// Last successful read of [`HOTELS_QUERY`], kept for `ttl`.
///
/// Every [`invalidate`](Self::invalidate) starts a new generation. A load
/// that began in an older generation is not stored.
pub struct ResultCache {
    ttl: Duration,
    generation: AtomicU64,
    entry: RwLock<Option<CachedResult>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        ResultCache {
            ttl,
            generation: AtomicU64::new(0),
            entry: RwLock::new(None),
        }
    }

    /// Take this before loading and hand it to [`store`](Self::store).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn get(&self) -> Option<Arc<ResultSet>> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry
            .as_ref()
            .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
            .map(|cached| cached.result.clone())
    }

    /// Stores `result` unless the cache was invalidated after `generation`
    /// was taken. Returns whether it was stored.
    pub fn store(&self, result: Arc<ResultSet>, generation: u64) -> bool {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        if self.generation() != generation {
            log::debug!("Dropping hotel rows loaded before the last invalidation");
            return false;
        }

        *entry = Some(CachedResult {
            loaded_at: Instant::now(),
            result,
        });
        true
    }

    pub fn invalidate(&self) {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        if entry.take().is_some() {
            log::info!("Invalidated cached result for `{}`", HOTELS_QUERY);
        }
    }
}

/// Reads the hotels table. Any database error becomes one error notification
/// and an empty result.
pub async fn load_data(options: &PgConnectOptions, notifications: &mut Notifications) -> ResultSet {
    match hotel_db::get_hotel_table(options).await {
        Ok(result) => {
            log::info!("Loaded {} hotel rows", result.len());
            result
        }
        Err(e) => {
            log::error!("Error loading hotels: {:?}", e);
            notifications.error(format!("Database error: {}", e));
            ResultSet::empty()
        }
    }
}

/// Like [`load_data`], but served from `cache` while it is fresh. Failed
/// loads, and loads overtaken by an invalidation, are not cached.
pub async fn load_data_cached(
    cache: &ResultCache,
    options: &PgConnectOptions,
    notifications: &mut Notifications,
) -> Arc<ResultSet> {
    if let Some(result) = cache.get() {
        log::debug!("Serving {} hotel rows from cache", result.len());
        return result;
    }

    let generation = cache.generation();
    let errors_before = notifications.count(Level::Error);
    let result = Arc::new(load_data(options, notifications).await);

    if notifications.count(Level::Error) == errors_before {
        cache.store(result.clone(), generation);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result_set::HotelRecord;

    fn unreachable_store() -> PgConnectOptions {
        PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("console")
            .password("console")
            .database("hotels")
    }

    fn one_row() -> Arc<ResultSet> {
        Arc::new(ResultSet {
            columns: vec!["name".into()],
            rows: vec![HotelRecord {
                cells: vec![Some("Adler".into())],
            }],
        })
    }

    #[test]
    fn fresh_entry_is_reused() {
        let cache = ResultCache::new(Duration::from_secs(60));
        assert!(cache.get().is_none());

        cache.store(one_row(), cache.generation());

        assert_eq!(cache.get().unwrap().len(), 1);
    }

    #[test]
    fn expired_entry_is_dropped() {
        let cache = ResultCache::new(Duration::ZERO);
        cache.store(one_row(), cache.generation());

        assert!(cache.get().is_none());
    }

    #[test]
    fn invalidate_clears_entry() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.store(one_row(), cache.generation());

        cache.invalidate();

        assert!(cache.get().is_none());
    }

    #[test]
    fn load_started_before_invalidate_is_not_stored() {
        let cache = ResultCache::new(Duration::from_secs(60));
        assert!(cache.get().is_none());
        let generation = cache.generation();

        // A scrape finishes while the miss above is still loading.
        cache.invalidate();

        assert!(!cache.store(one_row(), generation));
        assert!(cache.get().is_none());
    }

    #[test]
    fn load_started_after_invalidate_is_stored() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.invalidate();

        assert!(cache.store(one_row(), cache.generation()));
        assert_eq!(cache.get().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_store_yields_empty_result_and_one_error() {
        let mut notifications = Notifications::new();

        let result = load_data(&unreachable_store(), &mut notifications).await;

        assert!(result.is_empty());
        assert_eq!(notifications.count(Level::Error), 1);
        assert_eq!(notifications.iter().count(), 1);
        assert!(notifications
            .iter()
            .all(|n| n.message.starts_with("Database error: ")));
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache = ResultCache::new(Duration::from_secs(60));
        let mut notifications = Notifications::new();

        let result = load_data_cached(&cache, &unreachable_store(), &mut notifications).await;

        assert!(result.is_empty());
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn cached_result_skips_the_store() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.store(one_row(), cache.generation());
        let mut notifications = Notifications::new();

        let result = load_data_cached(&cache, &unreachable_store(), &mut notifications).await;

        assert_eq!(result.len(), 1);
        assert!(notifications.is_empty());
    }
}
