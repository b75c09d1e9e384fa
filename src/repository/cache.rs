// src/repository/cache.rs
//! Read-through cache in front of a work-order store.
//!
//! Listings are kept in an LRU map with a TTL. Status and detail reads
//! always go to the store, since the sync layer polls them for changes.
//! Every write clears the whole cache, failed ones included, since a
//! multi-step write may have changed Notion before failing. A read that
//! started before a write does not store its result.

use super::WorkOrderRepository;
use crate::error::AppError;
use crate::model::{
    BackendMode, Employee, HealthStatus, HoursEntry, NewWorkOrder, SendDataOutcome, Site,
    StatusOptions, Supervisor, WorkOrder, WorkOrderChanges, WorkOrderDetail, WorkOrderFilter,
    WorkOrderMutation, WorkOrderStatus,
};
use crate::types::RecordId;
use lru::LruCache;
use parking_lot::Mutex;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A cached listing.
#[derive(Debug, Clone)]
enum CachedValue {
    Sites(Vec<Site>),
    Supervisors(Vec<Supervisor>),
    Employees(Vec<Employee>),
    StatusOptions(StatusOptions),
    WorkOrders(Vec<WorkOrder>),
    HoursEntries(Vec<HoursEntry>),
}

/// Conversion between a listing type and its cache slot.
trait Cacheable: Sized {
    fn wrap(self) -> CachedValue;
    fn unwrap(value: &CachedValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn wrap(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn unwrap(value: &CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Vec<Site>, Sites);
cacheable!(Vec<Supervisor>, Supervisors);
cacheable!(Vec<Employee>, Employees);
cacheable!(StatusOptions, StatusOptions);
cacheable!(Vec<WorkOrder>, WorkOrders);
cacheable!(Vec<HoursEntry>, HoursEntries);

struct CacheEntry {
    value: CachedValue,
    stored_at: Instant,
}

/// Hit and miss counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A [`WorkOrderRepository`] that caches listing reads of another one.
pub struct CachedRepository<R> {
    inner: R,
    ttl: Duration,
    entries: Option<Mutex<LruCache<String, CacheEntry>>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<R: WorkOrderRepository> CachedRepository<R> {
    /// Wraps `inner`. A zero TTL or capacity turns caching off.
    pub fn new(inner: R, ttl: Duration, capacity: usize) -> Self {
        let entries = NonZeroUsize::new(capacity)
            .filter(|_| !ttl.is_zero())
            .map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            inner,
            ttl,
            entries,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drops every cached listing.
    pub fn invalidate(&self) {
        if let Some(entries) = &self.entries {
            let mut guard = entries.lock();
            self.generation.fetch_add(1, Ordering::AcqRel);
            guard.clear();
        }
    }

    fn lookup<T: Cacheable>(&self, key: &str) -> Option<T> {
        let entries = self.entries.as_ref()?;
        let mut guard = entries.lock();
        let fresh = guard
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() <= self.ttl)
            .and_then(|entry| T::unwrap(&entry.value));
        if fresh.is_none() {
            guard.pop(key);
        }
        fresh
    }

    /// Stores `value` unless the cache was invalidated after `generation`.
    fn store<T: Cacheable>(&self, key: String, value: T, generation: u64) {
        if let Some(entries) = &self.entries {
            let mut guard = entries.lock();
            if self.generation.load(Ordering::Acquire) != generation {
                log::debug!("Cache invalidated during fetch, not storing {}", key);
                return;
            }
            guard.put(
                key,
                CacheEntry {
                    value: value.wrap(),
                    stored_at: Instant::now(),
                },
            );
        }
    }

    async fn read_through<T, F, Fut>(&self, key: String, fetch: F) -> Result<T, AppError>
    where
        T: Cacheable + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if let Some(hit) = self.lookup::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Cache hit: {}", key);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("Cache miss: {}", key);
        let generation = self.generation.load(Ordering::Acquire);
        let value = fetch().await?;
        self.store(key, value.clone(), generation);
        Ok(value)
    }

    fn after_write<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        self.invalidate();
        result
    }
}

#[async_trait::async_trait]
impl<R: WorkOrderRepository> WorkOrderRepository for CachedRepository<R> {
    fn mode(&self) -> BackendMode {
        self.inner.mode()
    }

    async fn health(&self) -> Result<HealthStatus, AppError> {
        let stats = self.stats();
        log::info!("Cache: {} hits, {} misses", stats.hits, stats.misses);
        self.inner.health().await
    }

    async fn sites(&self) -> Result<Vec<Site>, AppError> {
        self.read_through("sites".to_string(), || self.inner.sites())
            .await
    }

    async fn supervisors(&self) -> Result<Vec<Supervisor>, AppError> {
        self.read_through("supervisors".to_string(), || self.inner.supervisors())
            .await
    }

    async fn employees(&self) -> Result<Vec<Employee>, AppError> {
        self.read_through("employees".to_string(), || self.inner.employees())
            .await
    }

    async fn employees_for_site(&self, site: &RecordId) -> Result<Vec<Employee>, AppError> {
        self.read_through(format!("employees_site_{}", site), || {
            self.inner.employees_for_site(site)
        })
        .await
    }

    async fn status_options(&self) -> Result<StatusOptions, AppError> {
        self.read_through("status_options".to_string(), || {
            self.inner.status_options()
        })
        .await
    }

    async fn update_employee_status(
        &self,
        employee: &RecordId,
        estado: &str,
    ) -> Result<Employee, AppError> {
        let result = self.inner.update_employee_status(employee, estado).await;
        self.after_write(result)
    }

    async fn work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        self.read_through(format!("work_orders_{}", filter.cache_key()), || {
            self.inner.work_orders(filter)
        })
        .await
    }

    async fn hours_entries(&self, work_order: &RecordId) -> Result<Vec<HoursEntry>, AppError> {
        self.read_through(format!("hours_{}", work_order), || {
            self.inner.hours_entries(work_order)
        })
        .await
    }

    async fn work_order_detail(&self, work_order: &RecordId) -> Result<WorkOrderDetail, AppError> {
        self.inner.work_order_detail(work_order).await
    }

    async fn work_order_status(&self, work_order: &RecordId) -> Result<WorkOrderStatus, AppError> {
        self.inner.work_order_status(work_order).await
    }

    async fn create_work_order(&self, command: NewWorkOrder) -> Result<WorkOrderMutation, AppError> {
        let result = self.inner.create_work_order(command).await;
        self.after_write(result)
    }

    async fn update_work_order(
        &self,
        work_order: &RecordId,
        changes: WorkOrderChanges,
    ) -> Result<WorkOrderMutation, AppError> {
        let result = self.inner.update_work_order(work_order, changes).await;
        self.after_write(result)
    }

    async fn send_work_order_data(
        &self,
        work_order: &RecordId,
    ) -> Result<SendDataOutcome, AppError> {
        let result = self.inner.send_work_order_data(work_order).await;
        self.after_write(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockWorkOrders;
    use crate::model::{CreateWorkOrderRequest, UpdateWorkOrderRequest};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn cached(ttl: Duration) -> CachedRepository<MockWorkOrders> {
        CachedRepository::new(MockWorkOrders::new(None), ttl, 16)
    }

    fn new_work_order() -> NewWorkOrder {
        CreateWorkOrderRequest {
            site_name: Some("Mantenimiento Sur".into()),
            site_id: Some("obra-3".into()),
            date: Some("2024-04-01".into()),
            supervisor_id: Some("jefe-3".into()),
            employees: vec!["empleado-5".into()],
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    /// Mock store whose first parte listing pauses after reading, until released.
    struct PausedListing {
        inner: MockWorkOrders,
        pause_next: AtomicBool,
        read_done: Notify,
        release: Notify,
    }

    impl PausedListing {
        fn new() -> Self {
            Self {
                inner: MockWorkOrders::new(None),
                pause_next: AtomicBool::new(true),
                read_done: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl WorkOrderRepository for PausedListing {
        fn mode(&self) -> BackendMode {
            self.inner.mode()
        }

        async fn health(&self) -> Result<HealthStatus, AppError> {
            self.inner.health().await
        }

        async fn sites(&self) -> Result<Vec<Site>, AppError> {
            self.inner.sites().await
        }

        async fn supervisors(&self) -> Result<Vec<Supervisor>, AppError> {
            self.inner.supervisors().await
        }

        async fn employees(&self) -> Result<Vec<Employee>, AppError> {
            self.inner.employees().await
        }

        async fn employees_for_site(&self, site: &RecordId) -> Result<Vec<Employee>, AppError> {
            self.inner.employees_for_site(site).await
        }

        async fn status_options(&self) -> Result<StatusOptions, AppError> {
            self.inner.status_options().await
        }

        async fn update_employee_status(
            &self,
            employee: &RecordId,
            estado: &str,
        ) -> Result<Employee, AppError> {
            self.inner.update_employee_status(employee, estado).await
        }

        async fn work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
            let snapshot = self.inner.work_orders(filter).await;
            if self.pause_next.swap(false, Ordering::SeqCst) {
                self.read_done.notify_one();
                self.release.notified().await;
            }
            snapshot
        }

        async fn hours_entries(&self, work_order: &RecordId) -> Result<Vec<HoursEntry>, AppError> {
            self.inner.hours_entries(work_order).await
        }

        async fn work_order_detail(
            &self,
            work_order: &RecordId,
        ) -> Result<WorkOrderDetail, AppError> {
            self.inner.work_order_detail(work_order).await
        }

        async fn work_order_status(
            &self,
            work_order: &RecordId,
        ) -> Result<WorkOrderStatus, AppError> {
            self.inner.work_order_status(work_order).await
        }

        async fn create_work_order(
            &self,
            command: NewWorkOrder,
        ) -> Result<WorkOrderMutation, AppError> {
            self.inner.create_work_order(command).await
        }

        async fn update_work_order(
            &self,
            work_order: &RecordId,
            changes: WorkOrderChanges,
        ) -> Result<WorkOrderMutation, AppError> {
            self.inner.update_work_order(work_order, changes).await
        }

        async fn send_work_order_data(
            &self,
            work_order: &RecordId,
        ) -> Result<SendDataOutcome, AppError> {
            self.inner.send_work_order_data(work_order).await
        }
    }

    #[tokio::test]
    async fn repeated_listing_hits_the_cache() {
        let repo = cached(Duration::from_secs(60));
        repo.sites().await.unwrap();
        repo.sites().await.unwrap();
        repo.employees().await.unwrap();
        assert_eq!(repo.stats(), CacheStats { hits: 1, misses: 2 });
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let repo = cached(Duration::ZERO);
        repo.sites().await.unwrap();
        repo.sites().await.unwrap();
        assert_eq!(repo.stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[tokio::test]
    async fn writes_invalidate_listings() {
        let repo = cached(Duration::from_secs(60));
        let id = RecordId::parse("parte-1").unwrap();
        let before = repo.hours_entries(&id).await.unwrap();
        assert_eq!(before.len(), 2);

        let changes = UpdateWorkOrderRequest {
            employees: vec!["empleado-1".into()],
            ..Default::default()
        }
        .validate()
        .unwrap();
        repo.update_work_order(&id, changes).await.unwrap();

        let after = repo.hours_entries(&id).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(repo.stats().hits, 0);
    }

    #[tokio::test]
    async fn failed_writes_clear_the_cache_too() {
        let repo = cached(Duration::from_secs(60));
        repo.sites().await.unwrap();
        let signed = RecordId::parse("parte-2").unwrap();
        assert!(repo.send_work_order_data(&signed).await.is_err());
        repo.sites().await.unwrap();
        assert_eq!(repo.stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[tokio::test]
    async fn reads_overtaken_by_a_write_are_not_cached() {
        let repo = Arc::new(CachedRepository::new(
            PausedListing::new(),
            Duration::from_secs(60),
            16,
        ));
        let all = WorkOrderFilter::default();

        let reader = {
            let repo = Arc::clone(&repo);
            let all = all.clone();
            tokio::spawn(async move { repo.work_orders(&all).await })
        };
        repo.inner().read_done.notified().await;
        repo.create_work_order(new_work_order()).await.unwrap();
        repo.inner().release.notify_one();

        let raced = reader.await.unwrap().unwrap();
        assert_eq!(raced.len(), 2);

        let following = repo.work_orders(&all).await.unwrap();
        assert_eq!(following.len(), 3);
        assert_eq!(repo.stats().hits, 0);
    }

    #[tokio::test]
    async fn status_reads_bypass_the_cache() {
        let repo = cached(Duration::from_secs(60));
        let id = RecordId::parse("parte-1").unwrap();
        repo.work_order_status(&id).await.unwrap();
        repo.work_order_status(&id).await.unwrap();
        assert_eq!(repo.stats(), CacheStats::default());
    }
}
