//! 查询统计
//!
//! 所有计数器都是原子变量，并发查询只做 `fetch_add`，互不阻塞。
//! 外部通过 `snapshot()` 读取，不直接暴露计数器。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::services::geoip::Source;

#[derive(Debug, Default)]
pub struct QueryStats {
    total_queries: AtomicU64,
    success_queries: AtomicU64,
    failed_queries: AtomicU64,
    qqwry_hits: AtomicU64,
    geolite_hits: AtomicU64,
    combined_hits: AtomicU64,
    /// 纳秒
    total_duration: AtomicU64,
}

/// 查询统计快照
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QueryStatsSnapshot {
    pub total_queries: u64,
    pub success_queries: u64,
    pub failed_queries: u64,
    /// 只有纯真 IP 库有结果
    pub qqwry_hits: u64,
    /// 只有 GeoLite2 有结果
    pub geolite_hits: u64,
    /// 两个数据源合并
    pub combined_hits: u64,
    pub avg_duration: Duration,
    /// 成功率（百分比）
    pub success_rate: f64,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_query(&self) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.success_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录本次结果来自哪个数据源
    pub(crate) fn record_source(&self, source: Source) {
        let counter = match source {
            Source::QQwry => &self.qqwry_hits,
            Source::GeoLite => &self.geolite_hits,
            Source::Combined => &self.combined_hits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duration(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_duration.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> QueryStatsSnapshot {
        let total_queries = self.total_queries.load(Ordering::Relaxed);
        let success_queries = self.success_queries.load(Ordering::Relaxed);
        let total_duration = self.total_duration.load(Ordering::Relaxed);

        let (avg_duration, success_rate) = if total_queries == 0 {
            (Duration::ZERO, 0.0)
        } else {
            (
                Duration::from_nanos(total_duration / total_queries),
                success_queries as f64 / total_queries as f64 * 100.0,
            )
        };

        QueryStatsSnapshot {
            total_queries,
            success_queries,
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            qqwry_hits: self.qqwry_hits.load(Ordering::Relaxed),
            geolite_hits: self.geolite_hits.load(Ordering::Relaxed),
            combined_hits: self.combined_hits.load(Ordering::Relaxed),
            avg_duration,
            success_rate,
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.success_queries,
            &self.failed_queries,
            &self.qqwry_hits,
            &self.geolite_hits,
            &self.combined_hits,
            &self.total_duration,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
