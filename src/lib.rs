//! iplocator - 双数据源 IP 地理位置查询
//!
//! 同时查询纯真 IP 库（qqwry.dat）和 MaxMind GeoLite2，
//! 按详细程度合并两边的结果，并对结果做 LRU 缓存。
//!
//! # Features
//! - **cli**: 命令行工具 `iplocator`（默认开启）
//!
//! # Architecture
//! - `services::geoip`: 数据源（纯真 IP 库读取器、GeoLite2）
//! - `services::locator`: 并发查询、结果合并、查询统计
//! - `cache`: 线程安全的 LRU 缓存
//! - `config`: 配置加载
//! - `system`: 日志初始化
//!
//! ```no_run
//! use iplocator::{Locator, LocatorConfig};
//!
//! # async fn run() -> iplocator::errors::Result<()> {
//! let mut config = LocatorConfig::default();
//! config.database.qqwry_path = Some("data/qqwry.dat".to_string());
//! config.database.geolite_path = Some("data/GeoLite2-City.mmdb".to_string());
//!
//! let locator = Locator::new(&config)?;
//! let location = locator.query("114.114.114.114").await?;
//! println!("{} {} {}", location.country, location.province, location.city);
//! locator.close()?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod services;
pub mod system;

pub use config::LocatorConfig;
pub use errors::{LocatorError, Result};
pub use services::geoip::{Location, Source};
pub use services::locator::Locator;
