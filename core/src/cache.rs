//! Time-bounded memoization of chart lookups.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ziwei_chart::ChartData;

use crate::chart_client::{ChartRequest, ChartService};
use crate::error::ServiceError;

/// Hex SHA-256 over the fields that determine a chart.
pub fn fingerprint(request: &ChartRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.birthday.as_bytes());
    hasher.update(b"|");
    hasher.update(request.hour_index.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(request.gender.as_bytes());
    hasher.update(b"|");
    hasher.update([request.is_lunar as u8, request.is_leap as u8]);
    hasher.update(b"|");
    hasher.update(request.target_year.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

struct Entry {
    stored_at: Instant,
    chart: ChartData,
}

/// Wraps a [`ChartService`] and answers repeated identical requests from
/// memory until the entry is older than `ttl`. Failures are passed through
/// and never stored.
pub struct CachedChartService<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl<S: ChartService> CachedChartService<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<ChartData> {
        let mut entries = self.entries.lock().ok()?;
        let now = Instant::now();
        entries.retain(|_, e| now.duration_since(e.stored_at) < self.ttl);
        entries.get(key).map(|e| e.chart.clone())
    }

    fn store(&self, key: String, chart: ChartData) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                Entry {
                    stored_at: Instant::now(),
                    chart,
                },
            );
        }
    }
}

#[async_trait]
impl<S: ChartService> ChartService for CachedChartService<S> {
    async fn fetch_chart(&self, request: &ChartRequest) -> Result<ChartData, ServiceError> {
        let key = fingerprint(request);
        if let Some(chart) = self.lookup(&key) {
            log::debug!("chart cache hit {}", &key[..12]);
            return Ok(chart);
        }

        let chart = self.inner.fetch_chart(request).await?;
        self.store(key, chart.clone());
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ChartService for CountingService {
        async fn fetch_chart(&self, request: &ChartRequest) -> Result<ChartData, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ServiceError::ChartServiceUnavailable { url: "x".into() });
            }
            Ok(ChartData {
                target_year: Some(request.target_year),
                ..Default::default()
            })
        }
    }

    fn request(target_year: i32) -> ChartRequest {
        ChartRequest {
            birthday: "2000-5-23".into(),
            hour_index: 5,
            gender: "女".into(),
            is_lunar: false,
            is_leap: false,
            target_year,
        }
    }

    #[test]
    fn test_fingerprint_depends_on_every_field() {
        let base = request(2026);
        let mut lunar = base.clone();
        lunar.is_lunar = true;
        assert_eq!(fingerprint(&base), fingerprint(&request(2026)));
        assert_ne!(fingerprint(&base), fingerprint(&request(2027)));
        assert_ne!(fingerprint(&base), fingerprint(&lunar));
        assert_eq!(fingerprint(&base).len(), 64);
    }

    #[tokio::test]
    async fn test_repeated_requests_hit_cache() {
        let cache = CachedChartService::new(
            CountingService { calls: AtomicUsize::new(0), fail: false },
            Duration::from_secs(3600),
        );
        cache.fetch_chart(&request(2026)).await.unwrap();
        let chart = cache.fetch_chart(&request(2026)).await.unwrap();
        assert_eq!(chart.target_year, Some(2026));
        cache.fetch_chart(&request(2027)).await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let cache = CachedChartService::new(
            CountingService { calls: AtomicUsize::new(0), fail: false },
            Duration::ZERO,
        );
        cache.fetch_chart(&request(2026)).await.unwrap();
        cache.fetch_chart(&request(2026)).await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = CachedChartService::new(
            CountingService { calls: AtomicUsize::new(0), fail: true },
            Duration::from_secs(3600),
        );
        assert!(cache.fetch_chart(&request(2026)).await.is_err());
        assert!(cache.fetch_chart(&request(2026)).await.is_err());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
