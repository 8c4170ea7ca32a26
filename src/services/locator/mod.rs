//! 双数据源 IP 定位器
//!
//! 同时查询纯真 IP 库和 GeoLite2，按详细程度合并结果，
//! 结果按 IP 字符串缓存在 LRU 中。

mod merge;
mod stats;

pub use merge::merge_locations;
pub use stats::{QueryStats, QueryStatsSnapshot};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, LruCache};
use crate::config::LocatorConfig;
use crate::errors::{LocatorError, Result};
use crate::services::geoip::{
    GEOLITE_PROVIDER, GeoLiteProvider, GeoProvider, Location, QQWRY_PROVIDER, QQwryProvider,
    Source,
};

/// 单个数据源的状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub available: bool,
    pub errors: Vec<String>,
}

pub struct Locator {
    qqwry: Option<Arc<dyn GeoProvider>>,
    geolite: Option<Arc<dyn GeoProvider>>,
    cache: Option<LruCache<Arc<Location>>>,
    init_errors: BTreeMap<&'static str, Vec<String>>,
    stats: QueryStats,
    debug: bool,
}

impl Locator {
    /// 按配置加载数据库
    ///
    /// 单个数据库加载失败只记录错误，至少要有一个数据源可用。
    pub fn new(config: &LocatorConfig) -> Result<Self> {
        let mut init_errors: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();

        let qqwry = match config.database.qqwry_path.as_deref() {
            Some(path) => match QQwryProvider::new(path) {
                Ok(provider) => Some(Arc::new(provider) as Arc<dyn GeoProvider>),
                Err(e) => {
                    warn!("QQwry: failed to initialize from {}: {}", path, e);
                    init_errors
                        .entry(QQWRY_PROVIDER)
                        .or_default()
                        .push(format!("qqwry init failed: {}", e));
                    None
                }
            },
            None => None,
        };

        let geolite = match config.database.geolite_path.as_deref() {
            Some(path) => match GeoLiteProvider::new(path) {
                Ok(provider) => Some(Arc::new(provider) as Arc<dyn GeoProvider>),
                Err(e) => {
                    warn!("GeoLite: failed to initialize from {}: {}", path, e);
                    init_errors
                        .entry(GEOLITE_PROVIDER)
                        .or_default()
                        .push(format!("geolite init failed: {}", e));
                    None
                }
            },
            None => None,
        };

        if qqwry.is_none() && geolite.is_none() {
            let detail = if init_errors.is_empty() {
                "no database path configured".to_string()
            } else {
                init_errors
                    .values()
                    .flatten()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            return Err(LocatorError::no_provider(detail));
        }

        let mut locator = Self::from_providers(config, qqwry, geolite)?;
        locator.init_errors = init_errors;
        Ok(locator)
    }

    /// 使用已经构造好的数据源
    pub fn from_providers(
        config: &LocatorConfig,
        qqwry: Option<Arc<dyn GeoProvider>>,
        geolite: Option<Arc<dyn GeoProvider>>,
    ) -> Result<Self> {
        if qqwry.is_none() && geolite.is_none() {
            return Err(LocatorError::no_provider("no provider supplied"));
        }

        let cache = config
            .cache
            .enabled
            .then(|| LruCache::new(config.cache.capacity));

        info!(
            "Locator ready: qqwry={}, geolite={}, cache={}",
            qqwry.is_some(),
            geolite.is_some(),
            cache
                .as_ref()
                .map(|c| c.capacity().to_string())
                .unwrap_or_else(|| "disabled".to_string())
        );

        Ok(Self {
            qqwry,
            geolite,
            cache,
            init_errors: BTreeMap::new(),
            stats: QueryStats::new(),
            debug: config.debug,
        })
    }

    /// 查询 IP 地理位置
    pub async fn query(&self, ip: &str) -> Result<Arc<Location>> {
        let started = Instant::now();
        self.stats.record_query();

        let result = self.query_inner(ip).await;
        self.stats.record_duration(started.elapsed());
        result
    }

    async fn query_inner(&self, ip: &str) -> Result<Arc<Location>> {
        if let Some(cache) = &self.cache
            && let Some(location) = cache.get(ip)
        {
            self.stats.record_success();
            debug!("Locator: cache hit for {}", ip);
            return Ok(location);
        }

        if self.qqwry.is_none() && self.geolite.is_none() {
            return Err(LocatorError::no_provider("no provider available"));
        }

        // 两个数据源并发查询
        let qqwry_task = self.qqwry.clone().map(|p| spawn_query(p, ip));
        let geolite_task = self.geolite.clone().map(|p| spawn_query(p, ip));

        let (qqwry_location, qqwry_error) =
            split_outcome(join_query(QQWRY_PROVIDER, qqwry_task).await);
        let (geolite_location, geolite_error) =
            split_outcome(join_query(GEOLITE_PROVIDER, geolite_task).await);

        let location = match (qqwry_location, geolite_location) {
            (Some(qqwry), Some(geolite)) => merge_locations(&qqwry, &geolite, self.debug),
            (Some(mut qqwry), None) => {
                if let Some(e) = &geolite_error {
                    debug!("GeoLite lookup for {} failed: {}", ip, e);
                }
                qqwry.source = Source::QQwry;
                qqwry
            }
            (None, Some(mut geolite)) => {
                if let Some(e) = &qqwry_error {
                    debug!("QQwry lookup for {} failed: {}", ip, e);
                }
                geolite.source = Source::GeoLite;
                geolite
            }
            (None, None) => {
                self.stats.record_failure();
                // 优先返回纯真 IP 库的错误
                return Err(qqwry_error.or(geolite_error).unwrap_or_else(|| {
                    LocatorError::no_data(format!("no location data for {}", ip))
                }));
            }
        };

        self.stats.record_source(location.source);
        self.stats.record_success();

        let location = Arc::new(location);
        if let Some(cache) = &self.cache {
            cache.put(ip, Arc::clone(&location));
        }
        Ok(location)
    }

    /// 缓存统计，未启用缓存时返回 None
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(LruCache::stats)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn query_stats(&self) -> QueryStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// 各数据源是否可用
    pub fn provider_status(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            (QQWRY_PROVIDER, self.qqwry.is_some()),
            (GEOLITE_PROVIDER, self.geolite.is_some()),
        ])
    }

    /// 各数据源是否可用及初始化错误
    pub fn provider_info(&self) -> BTreeMap<&'static str, ProviderInfo> {
        self.provider_status()
            .into_iter()
            .map(|(name, available)| {
                let errors = self.init_errors.get(name).cloned().unwrap_or_default();
                (name, ProviderInfo { available, errors })
            })
            .collect()
    }

    /// 关闭所有数据源，汇总关闭失败的错误
    pub fn close(&self) -> Result<()> {
        let errors: Vec<String> = [&self.qqwry, &self.geolite]
            .into_iter()
            .flatten()
            .filter_map(|provider| {
                provider
                    .close()
                    .err()
                    .map(|e| format!("{}: {}", provider.name(), e))
            })
            .collect();

        if errors.is_empty() {
            debug!("Locator: all providers closed");
            Ok(())
        } else {
            warn!("Locator: close failed: {}", errors.join("; "));
            Err(LocatorError::close(errors.join("; ")))
        }
    }
}

fn spawn_query(provider: Arc<dyn GeoProvider>, ip: &str) -> JoinHandle<Result<Location>> {
    let ip = ip.to_string();
    tokio::spawn(async move { provider.query(&ip).await })
}

/// 等待查询任务，任务 panic 视为该数据源出错
async fn join_query(
    name: &'static str,
    task: Option<JoinHandle<Result<Location>>>,
) -> Option<Result<Location>> {
    let task = task?;
    Some(task.await.unwrap_or_else(|e| {
        warn!("{} lookup task failed: {}", name, e);
        Err(LocatorError::provider(format!("{} lookup task failed: {}", name, e)))
    }))
}

/// 空结果按无数据处理，不算错误
fn split_outcome(outcome: Option<Result<Location>>) -> (Option<Location>, Option<LocatorError>) {
    match outcome {
        Some(Ok(location)) if !location.is_empty() => (Some(location), None),
        Some(Ok(_)) | None => (None, None),
        Some(Err(e)) => (None, Some(e)),
    }
}
