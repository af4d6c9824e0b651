use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use log::*;
use parking_lot::Mutex;

use crate::region::{Region, RegionId};

type SharedFetch<R> = Shared<BoxFuture<'static, Result<R, Arc<anyhow::Error>>>>;

struct CacheState<R> {
    records: HashMap<RegionId, R>,
    in_flight: HashMap<RegionId, SharedFetch<R>>,
}

struct Inner<R> {
    name: &'static str,
    state: Mutex<CacheState<R>>,
    fetches: AtomicUsize,
}

enum Lookup<R> {
    Cached(R),
    Pending(SharedFetch<R>),
}

/// Session-scoped store of one enrichment kind keyed by region id.
///
/// Records are kept until the cache is dropped. Concurrent requests for the
/// same uncached key share a single outbound fetch.
pub struct EnrichmentCache<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for EnrichmentCache<R> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<R> EnrichmentCache<R>
where
    R: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                state: Mutex::new(CacheState {
                    records: HashMap::new(),
                    in_flight: HashMap::new(),
                }),
                fetches: AtomicUsize::new(0),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn get(&self, id: &str) -> Option<R> {
        self.inner.state.lock().records.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.state.lock().records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every region already has a record
    pub fn covers(&self, regions: &[Region]) -> bool {
        let state = self.inner.state.lock();
        regions.iter().all(|r| state.records.contains_key(&r.psgc))
    }

    pub fn snapshot(&self) -> HashMap<RegionId, R> {
        self.inner.state.lock().records.clone()
    }

    /// Number of outbound fetches started so far
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    pub fn insert(&self, id: &str, record: R) {
        self.inner.state.lock().records.insert(id.to_string(), record);
    }

    fn lookup<F>(&self, id: &str, fetch: F) -> Lookup<R>
    where
        F: FnOnce() -> BoxFuture<'static, Result<R>>,
    {
        let mut state = self.inner.state.lock();
        if let Some(record) = state.records.get(id) {
            return Lookup::Cached(record.clone());
        }
        if let Some(pending) = state.in_flight.get(id) {
            debug!("{}: joining in-flight fetch for {}", self.inner.name, id);
            return Lookup::Pending(pending.clone());
        }

        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.clone();
        let key = id.to_string();
        let source = fetch();
        let task = async move {
            let result = source.await;
            let mut state = inner.state.lock();
            state.in_flight.remove(&key);
            match result {
                Ok(record) => {
                    state.records.insert(key, record.clone());
                    Ok(record)
                }
                Err(e) => Err(Arc::new(e)),
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(id.to_string(), task.clone());
        Lookup::Pending(task)
    }

    /// Cached record, or a fresh fetch whose failure is replaced by
    /// `fallback` and stored.
    pub async fn get_or_fetch<F, D>(&self, id: &str, fetch: F, fallback: D) -> R
    where
        F: FnOnce() -> BoxFuture<'static, Result<R>>,
        D: FnOnce() -> R,
    {
        let pending = match self.lookup(id, fetch) {
            Lookup::Cached(record) => return record,
            Lookup::Pending(pending) => pending,
        };

        match pending.await {
            Ok(record) => record,
            Err(e) => {
                warn!("{}: fetch for {} failed, storing fallback: {}", self.inner.name, id, e);
                let mut state = self.inner.state.lock();
                state.records.entry(id.to_string()).or_insert_with(fallback).clone()
            }
        }
    }

    /// Cached record, or a fresh fetch whose failure is returned to the caller
    /// and leaves the key empty so a later call retries.
    pub async fn try_get_or_fetch<F>(&self, id: &str, fetch: F) -> Result<R>
    where
        F: FnOnce() -> BoxFuture<'static, Result<R>>,
    {
        match self.lookup(id, fetch) {
            Lookup::Cached(record) => Ok(record),
            Lookup::Pending(pending) => pending.await.map_err(|e| anyhow::anyhow!("{}", e)),
        }
    }

    /// Fetch every region concurrently and wait for all of them to settle
    pub async fn warm_up<F, D>(&self, regions: &[Region], fetch: F, fallback: D)
    where
        F: Fn(&Region) -> BoxFuture<'static, Result<R>>,
        D: Fn() -> R,
    {
        let started = std::time::Instant::now();
        let tasks = regions
            .iter()
            .map(|region| self.get_or_fetch(&region.psgc, || fetch(region), &fallback));
        join_all(tasks).await;

        info!(
            "{}: warm-up finished for {} regions in {:?} ({} cached)",
            self.inner.name,
            regions.len(),
            started.elapsed(),
            self.len()
        );
    }
}
