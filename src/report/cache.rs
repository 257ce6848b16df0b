//! Caller-side memoization of [`AgreementMetrics`].
//!
//! The engine itself is stateless. Callers that analyze the same snapshot
//! repeatedly (a dashboard refresh, a watch loop) can put this cache in
//! front of it. Keys hash the full input and config, so any change to either
//! produces a new key and stale entries are never returned.

use super::summary::{analyze, AgreementMetrics};
use crate::config::EvalmapConfig;
use crate::core::PaperRecord;
use crate::errors::Result;
use std::collections::{HashMap, VecDeque};
use xxhash_rust::xxh64::xxh64;

const DEFAULT_CAPACITY: usize = 16;

/// Cache key for one (input snapshot, configuration) pair
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct MetricsCacheKey {
    /// Hash of the serialized paper records
    pub input_hash: u64,
    /// Hash of the serialized configuration
    pub config_hash: u64,
}

impl MetricsCacheKey {
    pub fn generate(papers: &[PaperRecord], config: &EvalmapConfig) -> Result<Self> {
        let input = serde_json::to_vec(papers)?;
        let config = serde_json::to_vec(config)?;
        Ok(Self {
            input_hash: xxh64(&input, 0),
            config_hash: xxh64(&config, 0),
        })
    }
}

/// Bounded in-memory cache; the oldest entry is evicted first.
#[derive(Debug)]
pub struct MetricsCache {
    entries: HashMap<MetricsCacheKey, AgreementMetrics>,
    order: VecDeque<MetricsCacheKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for MetricsCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MetricsCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &MetricsCacheKey) -> Option<&AgreementMetrics> {
        match self.entries.get(key) {
            Some(metrics) => {
                self.hits += 1;
                tracing::debug!("Metrics cache hit ({:016x})", key.input_hash);
                Some(metrics)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: MetricsCacheKey, metrics: AgreementMetrics) {
        if self.entries.insert(key, metrics).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    /// Return the cached result for this snapshot, computing it on a miss.
    pub fn analyze(
        &mut self,
        papers: &[PaperRecord],
        config: &EvalmapConfig,
    ) -> Result<AgreementMetrics> {
        let key = MetricsCacheKey::generate(papers, config)?;
        if let Some(metrics) = self.get(&key) {
            return Ok(metrics.clone());
        }
        tracing::debug!("Metrics cache miss ({:016x})", key.input_hash);
        let metrics = analyze(papers, config);
        self.put(key, metrics.clone());
        Ok(metrics)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> String {
        format!(
            "MetricsCache: {} entries (capacity {}), {} hits, {} misses",
            self.entries.len(),
            self.capacity,
            self.hits,
            self.misses
        )
    }
}
