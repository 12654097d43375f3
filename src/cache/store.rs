//! Timed, partitioned response cache with durable snapshotting
//!
//! The cache is split into named sections, each with its own expiry policy:
//! catalog listings and artwork lookups stay fresh for 24 hours, item details
//! for 6 hours. Entries are timestamped on write and age-checked on read;
//! expired entries read as misses and are physically removed by a periodic
//! sweep. The whole cache is persisted as one JSON snapshot through a
//! [`SnapshotStore`], with writes coalesced behind a trailing-edge debounce so
//! bursts of fetches cost a single durable write.
//!
//! Nothing in here performs network I/O, and no failure in here is ever
//! surfaced to a caller: a broken snapshot hydrates as a cold cache, and a
//! failed persist is logged and dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::storage::{SnapshotStore, StorageError};
use crate::catalog::{CatalogItem, Category, ItemDetail, MediaKind};

/// Fixed key the snapshot blob is stored under
pub const SNAPSHOT_KEY: &str = "response_cache";

/// Separator for composed cache keys
///
/// Key components are closed enum tokens or integers, none of which can
/// contain this character, so differently-shaped inputs cannot collide.
pub const KEY_SEPARATOR: char = ':';

/// Named cache partitions, each with its own expiry duration
///
/// The per-section value types live on [`MediaCache`]; all section-agnostic
/// logic (timestamping, age checks, sweeping, snapshot encoding) is generic,
/// so adding a section is an enum variant plus a typed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Catalog listings keyed by (media kind, category)
    CatalogQuery,
    /// Logo/artwork lookups keyed by (item id, media kind)
    Artwork,
    /// Full detail records keyed by (item id, media kind)
    Detail,
}

impl Section {
    /// How long entries in this section stay fresh.
    pub fn expiry(self) -> Duration {
        match self {
            Section::CatalogQuery => Duration::from_secs(24 * 60 * 60),
            Section::Artwork => Duration::from_secs(24 * 60 * 60),
            Section::Detail => Duration::from_secs(6 * 60 * 60),
        }
    }
}

/// Millisecond epoch clock, injectable so expiry tests can advance time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now_ms(&self) -> i64;
}

/// Wall-clock implementation used outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Tunable cache timing
///
/// The debounce must stay well under the sweep interval; the defaults keep a
/// 600x gap.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Quiet period after the last write before the snapshot is persisted
    pub persist_debounce: Duration,
    /// How often the background sweep evicts expired entries
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            persist_debounce: Duration::from_millis(500),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// A stored value plus the epoch timestamp at which it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry<V> {
    value: V,
    stored_at_ms: i64,
}

/// One section's key -> entry map with the generic cache mechanics
#[derive(Debug, Clone)]
struct SectionMap<V> {
    entries: HashMap<String, Entry<V>>,
}

impl<V> Default for SectionMap<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: Clone> SectionMap<V> {
    /// Age-checked lookup. Expired entries read as absent but are not
    /// removed here; removal happens only via sweep or overwrite, keeping
    /// reads side-effect-free.
    fn get(&self, key: &str, now_ms: i64, expiry: Duration) -> Option<V> {
        let entry = self.entries.get(key)?;
        if is_expired(entry.stored_at_ms, now_ms, expiry) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Replaces any existing entry wholesale, timestamped at `now_ms`.
    fn insert(&mut self, key: String, value: V, now_ms: i64) {
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at_ms: now_ms,
            },
        );
    }

    /// Removes expired entries, returning how many were evicted.
    fn sweep(&mut self, now_ms: i64, expiry: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !is_expired(entry.stored_at_ms, now_ms, expiry));
        before - self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot encoding: an ordered list of key/entry pairs, which
    /// round-trips through JSON without depending on map serialization.
    fn to_pairs(&self) -> Vec<(String, Entry<V>)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect()
    }

    fn from_pairs(pairs: Vec<(String, Entry<V>)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }
}

fn is_expired(stored_at_ms: i64, now_ms: i64, expiry: Duration) -> bool {
    now_ms.saturating_sub(stored_at_ms) >= expiry.as_millis() as i64
}

/// The three typed sections held in memory
#[derive(Debug, Default)]
struct Sections {
    catalog: SectionMap<Vec<CatalogItem>>,
    artwork: SectionMap<Option<String>>,
    detail: SectionMap<ItemDetail>,
}

/// Durable form of the whole cache. Absent fields hydrate as empty sections,
/// so older or partial blobs still load.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    catalog_query: Vec<(String, Entry<Vec<CatalogItem>>)>,
    #[serde(default)]
    artwork: Vec<(String, Entry<Option<String>>)>,
    #[serde(default)]
    detail: Vec<(String, Entry<ItemDetail>)>,
}

impl Sections {
    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            catalog_query: self.catalog.to_pairs(),
            artwork: self.artwork.to_pairs(),
            detail: self.detail.to_pairs(),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            catalog: SectionMap::from_pairs(snapshot.catalog_query),
            artwork: SectionMap::from_pairs(snapshot.artwork),
            detail: SectionMap::from_pairs(snapshot.detail),
        }
    }
}

struct SweepHandle {
    task: JoinHandle<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl fmt::Debug for SweepHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepHandle").finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Shared {
    sections: Mutex<Sections>,
    storage: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    ready: AtomicBool,
    persist_timer: Mutex<Option<JoinHandle<()>>>,
    sweep: Mutex<Option<SweepHandle>>,
}

/// Session-wide response cache for catalog listings, artwork lookups, and
/// item details
///
/// Constructed once at startup and handed to every consumer; cloning shares
/// the same underlying state. Hydration from the snapshot store happens
/// exactly once, inside `open`, and cannot fail from the caller's
/// perspective. Reads and writes are synchronous and never error; durability
/// is eventually consistent within one debounce window.
#[derive(Debug, Clone)]
pub struct MediaCache {
    shared: Arc<Shared>,
}

impl MediaCache {
    /// Opens the cache against the default on-disk store.
    ///
    /// Returns `None` if the platform cache directory cannot be determined.
    pub fn open_default() -> Option<Self> {
        let store = super::storage::FileStore::new()?;
        Some(Self::open(Arc::new(store), CacheConfig::default()))
    }

    /// Opens the cache against the given store, hydrating one snapshot.
    pub fn open(storage: Arc<dyn SnapshotStore>, config: CacheConfig) -> Self {
        Self::open_with_clock(storage, config, Arc::new(SystemClock))
    }

    /// Opens the cache with an injected clock. Production code uses
    /// [`SystemClock`]; tests advance a manual clock to exercise expiry.
    pub fn open_with_clock(
        storage: Arc<dyn SnapshotStore>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Self {
            shared: Arc::new(Shared {
                sections: Mutex::new(Sections::default()),
                storage,
                clock,
                config,
                ready: AtomicBool::new(false),
                persist_timer: Mutex::new(None),
                sweep: Mutex::new(None),
            }),
        };
        // Hydration happens exactly once, here; success and failure both end
        // in the ready state.
        *cache.shared.sections.lock().unwrap() = hydrate(cache.shared.storage.as_ref());
        cache.shared.ready.store(true, Ordering::Release);
        cache.spawn_sweep_task();
        cache
    }

    /// Whether hydration has completed. Advisory only: reads and writes are
    /// well-defined regardless, operating on empty sections before readiness.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }

    /// Fresh catalog listing for (kind, category), if cached.
    pub fn catalog(&self, kind: MediaKind, category: Category) -> Option<Vec<CatalogItem>> {
        let key = catalog_key(kind, category);
        let now = self.shared.clock.now_ms();
        self.lock_sections()
            .catalog
            .get(&key, now, Section::CatalogQuery.expiry())
    }

    /// Remembers a catalog listing for (kind, category).
    pub fn store_catalog(&self, kind: MediaKind, category: Category, items: Vec<CatalogItem>) {
        let now = self.shared.clock.now_ms();
        self.lock_sections()
            .catalog
            .insert(catalog_key(kind, category), items, now);
        self.schedule_persist();
    }

    /// Fresh artwork lookup for (id, kind), if cached. The outer `Option` is
    /// hit-or-miss; the inner one is the lookup result itself, so a known
    /// "no logo" is a hit.
    pub fn artwork(&self, id: u64, kind: MediaKind) -> Option<Option<String>> {
        let key = item_key(id, kind);
        let now = self.shared.clock.now_ms();
        self.lock_sections()
            .artwork
            .get(&key, now, Section::Artwork.expiry())
    }

    /// Remembers an artwork lookup result for (id, kind).
    pub fn store_artwork(&self, id: u64, kind: MediaKind, path: Option<String>) {
        let now = self.shared.clock.now_ms();
        self.lock_sections()
            .artwork
            .insert(item_key(id, kind), path, now);
        self.schedule_persist();
    }

    /// Fresh detail record for (id, kind), if cached.
    pub fn detail(&self, id: u64, kind: MediaKind) -> Option<ItemDetail> {
        let key = item_key(id, kind);
        let now = self.shared.clock.now_ms();
        self.lock_sections()
            .detail
            .get(&key, now, Section::Detail.expiry())
    }

    /// Remembers a detail record for (id, kind).
    pub fn store_detail(&self, id: u64, kind: MediaKind, detail: ItemDetail) {
        let now = self.shared.clock.now_ms();
        self.lock_sections()
            .detail
            .insert(item_key(id, kind), detail, now);
        self.schedule_persist();
    }

    /// Evicts expired entries from every section, persisting only if
    /// something was removed. Idempotent and safe to call anytime; the
    /// background sweep calls this on its interval.
    pub fn clear_expired(&self) {
        let now = self.shared.clock.now_ms();
        let removed = {
            let mut sections = self.lock_sections();
            sections.catalog.sweep(now, Section::CatalogQuery.expiry())
                + sections.artwork.sweep(now, Section::Artwork.expiry())
                + sections.detail.sweep(now, Section::Detail.expiry())
        };
        if removed > 0 {
            debug!(removed, "evicted expired cache entries");
            self.schedule_persist();
        }
    }

    /// Empties every section and best-effort deletes the durable snapshot.
    /// The in-memory clear always takes effect, even if the deletion fails.
    pub fn clear_all(&self) {
        {
            let mut sections = self.lock_sections();
            sections.catalog.clear();
            sections.artwork.clear();
            sections.detail.clear();
        }
        // A pending persist would re-write the (now empty) blob right after
        // we delete it; cancel it first.
        if let Some(timer) = self.shared.persist_timer.lock().unwrap().take() {
            timer.abort();
        }
        if let Err(e) = self.shared.storage.remove(SNAPSHOT_KEY) {
            warn!(error = %e, "failed to delete cache snapshot");
        }
    }

    /// Stops the sweep task and flushes any pending persist.
    ///
    /// Call on application teardown so no timers outlive the owning scope.
    pub async fn shutdown(&self) {
        let sweep = self.shared.sweep.lock().unwrap().take();
        if let Some(sweep) = sweep {
            let _ = sweep.shutdown_tx.send(()).await;
            let _ = sweep.task.await;
        }
        let pending = self.shared.persist_timer.lock().unwrap().take();
        if let Some(timer) = pending {
            timer.abort();
            // The debounce window was cut short; write the final state now.
            run_persist(&self.shared);
        }
    }

    fn lock_sections(&self) -> std::sync::MutexGuard<'_, Sections> {
        self.shared.sections.lock().unwrap()
    }

    /// Resets the trailing-edge debounce: any pending persist is cancelled
    /// and a fresh timer starts. The snapshot written always reflects the
    /// in-memory state at the moment the timer fires, so the durable blob is
    /// last-write-wins and never an older state over a newer one.
    fn schedule_persist(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            // No runtime to host the timer; persist inline so durability is
            // still reached. Reads/writes stay infallible either way.
            run_persist(&self.shared);
            return;
        };
        let mut timer = self.shared.persist_timer.lock().unwrap();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        let weak = Arc::downgrade(&self.shared);
        let delay = self.shared.config.persist_debounce;
        *timer = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // No await past this point: once the timer fires, an abort can
            // no longer interrupt the write.
            if let Some(shared) = weak.upgrade() {
                run_persist(&shared);
            }
        }));
    }

    fn spawn_sweep_task(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            // Sweeping is a space optimization; reads age-check regardless.
            return;
        };
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let weak = Arc::downgrade(&self.shared);
        let interval = self.shared.config.sweep_interval;
        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the immediate first tick
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(shared) = weak.upgrade() else { break };
                        MediaCache { shared }.clear_expired();
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });
        *self.shared.sweep.lock().unwrap() = Some(SweepHandle { task, shutdown_tx });
    }
}

/// One-time hydration. Any failure, missing blob, or parse error yields a
/// cold cache and never propagates.
fn hydrate(storage: &dyn SnapshotStore) -> Sections {
    let blob = match storage.load(SNAPSHOT_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Sections::default(),
        Err(e) => {
            warn!(error = %e, "failed to load cache snapshot; starting cold");
            return Sections::default();
        }
    };
    match serde_json::from_str::<Snapshot>(&blob) {
        Ok(snapshot) => Sections::from_snapshot(snapshot),
        Err(e) => {
            warn!(error = %e, "cache snapshot is corrupt; starting cold");
            Sections::default()
        }
    }
}

/// Serializes the current sections and writes the snapshot. Quota exhaustion
/// deletes the durable blob and drops the write; every other failure is
/// logged and dropped. In-memory state is never touched.
fn run_persist(shared: &Shared) {
    let blob = {
        let sections = shared.sections.lock().unwrap();
        match serde_json::to_string(&sections.to_snapshot()) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "failed to serialize cache snapshot");
                return;
            }
        }
    };
    match shared.storage.save(SNAPSHOT_KEY, &blob) {
        Ok(()) => {}
        Err(StorageError::QuotaExceeded) => {
            warn!("cache snapshot exceeds storage quota; dropping durable copy");
            if let Err(e) = shared.storage.remove(SNAPSHOT_KEY) {
                warn!(error = %e, "failed to remove over-quota snapshot");
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to persist cache snapshot");
        }
    }
}

fn catalog_key(kind: MediaKind, category: Category) -> String {
    format!("{}{}{}", kind.token(), KEY_SEPARATOR, category.token())
}

fn item_key(id: u64, kind: MediaKind) -> String {
    format!("{}{}{}", id, KEY_SEPARATOR, kind.token())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::{MemoryFailure, MemoryStore};
    use std::sync::atomic::AtomicI64;

    /// Test clock advanced by hand
    #[derive(Debug, Default)]
    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn advance(&self, ms: i64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn sample_item(id: u64) -> CatalogItem {
        CatalogItem {
            id,
            title: format!("Item {}", id),
            overview: "overview".to_string(),
            poster_path: Some(format!("/poster{}.jpg", id)),
            backdrop_path: None,
            vote_average: 7.0,
            release_date: chrono::NaiveDate::from_ymd_opt(2020, 1, 1),
            genre_ids: vec![18],
        }
    }

    fn sample_detail(id: u64) -> ItemDetail {
        ItemDetail {
            id,
            title: format!("Detail {}", id),
            overview: "overview".to_string(),
            tagline: None,
            genres: vec![],
            runtime_minutes: Some(120),
            season_count: None,
            certification: Some("PG-13".to_string()),
            vote_average: 7.5,
            release_date: None,
            poster_path: None,
            backdrop_path: None,
        }
    }

    fn test_cache() -> (MediaCache, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        clock.advance(1_000);
        let cache =
            MediaCache::open_with_clock(store.clone(), CacheConfig::default(), clock.clone());
        (cache, store, clock)
    }

    fn expiry_ms(section: Section) -> i64 {
        section.expiry().as_millis() as i64
    }

    #[test]
    fn test_read_hits_until_expiry_boundary() {
        let (cache, _store, clock) = test_cache();
        cache.store_detail(42, MediaKind::Movie, sample_detail(42));

        // One millisecond before expiry: still a hit
        clock.advance(expiry_ms(Section::Detail) - 1);
        assert!(cache.detail(42, MediaKind::Movie).is_some());

        // At exactly the expiry age: logical miss
        clock.advance(1);
        assert!(cache.detail(42, MediaKind::Movie).is_none());
    }

    #[test]
    fn test_catalog_listing_expires_after_a_day() {
        let (cache, _store, clock) = test_cache();
        let items = vec![sample_item(1), sample_item(2)];
        cache.store_catalog(MediaKind::Tv, Category::Popular, items.clone());

        assert_eq!(cache.catalog(MediaKind::Tv, Category::Popular), Some(items));

        clock.advance(expiry_ms(Section::CatalogQuery) + 1);
        assert!(cache.catalog(MediaKind::Tv, Category::Popular).is_none());
    }

    #[test]
    fn test_overwrite_replaces_value_and_timestamp() {
        let (cache, _store, clock) = test_cache();
        cache.store_artwork(7, MediaKind::Tv, Some("/old.png".to_string()));

        clock.advance(expiry_ms(Section::Artwork) - 1);
        cache.store_artwork(7, MediaKind::Tv, Some("/new.png".to_string()));

        // Past the first write's expiry, but fresh relative to the second
        clock.advance(2);
        assert_eq!(
            cache.artwork(7, MediaKind::Tv),
            Some(Some("/new.png".to_string()))
        );
    }

    #[test]
    fn test_sections_are_isolated() {
        let (cache, _store, _clock) = test_cache();
        // Artwork and detail compose the same "42:movie" key string
        cache.store_artwork(42, MediaKind::Movie, Some("/logo.png".to_string()));

        assert!(cache.detail(42, MediaKind::Movie).is_none());
        assert!(cache.artwork(42, MediaKind::Movie).is_some());
    }

    #[test]
    fn test_absent_artwork_is_a_cacheable_result() {
        let (cache, _store, _clock) = test_cache();
        // A cache miss...
        assert_eq!(cache.artwork(9, MediaKind::Movie), None);

        // ...is distinct from a cached "this item has no logo"
        cache.store_artwork(9, MediaKind::Movie, None);
        assert_eq!(cache.artwork(9, MediaKind::Movie), Some(None));
    }

    #[test]
    fn test_kind_distinguishes_item_keys() {
        let (cache, _store, _clock) = test_cache();
        cache.store_detail(100, MediaKind::Movie, sample_detail(100));

        assert!(cache.detail(100, MediaKind::Tv).is_none());
        assert!(cache.detail(100, MediaKind::Movie).is_some());
    }

    #[test]
    fn test_ready_after_open() {
        let (cache, _store, _clock) = test_cache();
        assert!(cache.is_ready());
    }

    // Without a runtime, writes persist inline; these tests cover the
    // snapshot round trip and hydration fallbacks synchronously.

    #[test]
    fn test_snapshot_roundtrip_across_instances() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        clock.advance(1_000);

        let first =
            MediaCache::open_with_clock(store.clone(), CacheConfig::default(), clock.clone());
        first.store_catalog(MediaKind::Tv, Category::Popular, vec![sample_item(1)]);
        first.store_detail(1, MediaKind::Tv, sample_detail(1));
        assert!(store.blob(SNAPSHOT_KEY).is_some());

        let second =
            MediaCache::open_with_clock(store.clone(), CacheConfig::default(), clock.clone());
        assert!(second.is_ready());
        assert_eq!(
            second.catalog(MediaKind::Tv, Category::Popular),
            Some(vec![sample_item(1)])
        );
        assert_eq!(second.detail(1, MediaKind::Tv), Some(sample_detail(1)));
    }

    #[test]
    fn test_corrupt_snapshot_hydrates_cold() {
        let store = Arc::new(MemoryStore::new());
        store.seed(SNAPSHOT_KEY, "{ not valid json ]");

        let cache = MediaCache::open(store, CacheConfig::default());
        assert!(cache.is_ready());
        assert!(cache.catalog(MediaKind::Movie, Category::Popular).is_none());
    }

    #[test]
    fn test_partial_snapshot_defaults_missing_sections() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        clock.advance(1_000);
        store.seed(
            SNAPSHOT_KEY,
            r#"{"artwork":[["5:movie",{"value":"/logo.png","stored_at_ms":500}]]}"#,
        );

        let cache = MediaCache::open_with_clock(store, CacheConfig::default(), clock);
        assert_eq!(
            cache.artwork(5, MediaKind::Movie),
            Some(Some("/logo.png".to_string()))
        );
        assert!(cache.catalog(MediaKind::Movie, Category::Popular).is_none());
        assert!(cache.detail(5, MediaKind::Movie).is_none());
    }

    #[test]
    fn test_clear_all_empties_memory_and_deletes_blob() {
        let (cache, store, _clock) = test_cache();
        cache.store_detail(42, MediaKind::Movie, sample_detail(42));
        assert!(store.blob(SNAPSHOT_KEY).is_some());

        cache.clear_all();

        assert!(cache.detail(42, MediaKind::Movie).is_none());
        assert!(store.blob(SNAPSHOT_KEY).is_none());
    }

    // Debounce and sweep behavior, under a paused Tokio clock.

    #[tokio::test(start_paused = true)]
    async fn test_debounced_persist_coalesces_writes() {
        let (cache, store, _clock) = test_cache();

        for id in 0..5 {
            cache.store_artwork(id, MediaKind::Movie, Some(format!("/logo{}.png", id)));
        }
        assert_eq!(store.save_count(), 0, "persist must wait out the debounce");

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(store.save_count(), 1, "burst of writes must coalesce");
        let blob = store.blob(SNAPSHOT_KEY).expect("snapshot should exist");
        assert!(blob.contains("/logo4.png"), "snapshot must hold the latest state");
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_write_resets_the_debounce_timer() {
        let (cache, store, _clock) = test_cache();

        cache.store_artwork(1, MediaKind::Movie, Some("/a.png".to_string()));
        tokio::time::sleep(Duration::from_millis(300)).await;

        cache.store_artwork(2, MediaKind::Movie, Some("/b.png".to_string()));
        tokio::time::sleep(Duration::from_millis(300)).await;
        // 600ms since the first write, 300ms since the second: still pending
        assert_eq!(store.save_count(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_persists_only_when_something_expired() {
        let (cache, store, clock) = test_cache();

        cache.store_detail(1, MediaKind::Movie, sample_detail(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.save_count(), 1);

        // Nothing expired yet: sweep is a no-op and must not persist
        cache.clear_expired();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.save_count(), 1);

        // Expire the entry, sweep evicts and persists once
        clock.advance(expiry_ms(Section::Detail) + 1);
        cache.clear_expired();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.save_count(), 2);

        // Idempotent: a second sweep has nothing left to evict
        cache.clear_expired();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exceeded_drops_blob_and_keeps_memory() {
        let (cache, store, _clock) = test_cache();

        cache.store_detail(1, MediaKind::Movie, sample_detail(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(store.blob(SNAPSHOT_KEY).is_some());

        store.fail_next_save(MemoryFailure::Quota);
        cache.store_detail(2, MediaKind::Movie, sample_detail(2));
        tokio::time::sleep(Duration::from_millis(600)).await;

        // The stale durable copy is gone, nothing retried
        assert!(store.blob(SNAPSHOT_KEY).is_none());
        assert_eq!(store.save_count(), 1);

        // In-memory state is untouched and the next persist re-establishes
        // durability
        assert!(cache.detail(1, MediaKind::Movie).is_some());
        assert!(cache.detail(2, MediaKind::Movie).is_some());

        cache.store_detail(3, MediaKind::Movie, sample_detail(3));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(store.blob(SNAPSHOT_KEY).is_some());
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_persist_failure_is_swallowed() {
        let (cache, store, _clock) = test_cache();

        store.fail_next_save(MemoryFailure::Io);
        cache.store_artwork(1, MediaKind::Tv, Some("/x.png".to_string()));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(store.save_count(), 0);
        assert!(cache.artwork(1, MediaKind::Tv).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_evicts_on_interval() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        clock.advance(1_000);
        let config = CacheConfig {
            persist_debounce: Duration::from_millis(10),
            sweep_interval: Duration::from_secs(60),
        };
        let cache = MediaCache::open_with_clock(store.clone(), config, clock.clone());

        cache.store_detail(1, MediaKind::Movie, sample_detail(1));
        clock.advance(expiry_ms(Section::Detail) + 1);

        // Let the interval task tick once
        tokio::time::sleep(Duration::from_secs(61)).await;

        let blob = store.blob(SNAPSHOT_KEY).expect("sweep should persist");
        assert!(!blob.contains("\"Detail 1\""), "swept entry must leave the snapshot");

        cache.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_persist() {
        let (cache, store, _clock) = test_cache();

        cache.store_detail(1, MediaKind::Movie, sample_detail(1));
        assert_eq!(store.save_count(), 0);

        cache.shutdown().await;

        assert_eq!(store.save_count(), 1, "shutdown must flush the pending write");
        assert!(store.blob(SNAPSHOT_KEY).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_cancels_pending_persist() {
        let (cache, store, _clock) = test_cache();

        cache.store_detail(1, MediaKind::Movie, sample_detail(1));
        cache.clear_all();
        tokio::time::sleep(Duration::from_millis(600)).await;

        // The cancelled timer must not resurrect the blob
        assert!(store.blob(SNAPSHOT_KEY).is_none());
        assert_eq!(store.save_count(), 0);
    }
}
