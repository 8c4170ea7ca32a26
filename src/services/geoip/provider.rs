//! GeoIP Provider 抽象层
//!
//! 两个数据源通过同一个 trait 接入查询器：
//! - QQwryProvider：纯真 IP 库，仅 IPv4，带运营商信息
//! - GeoLiteProvider：MaxMind GeoLite2，IPv4/IPv6，带经纬度和时区

use async_trait::async_trait;

use super::location::Location;
use crate::errors::Result;

/// 主数据源名称
pub const QQWRY_PROVIDER: &str = "qqwry";
/// 次数据源名称
pub const GEOLITE_PROVIDER: &str = "geolite";

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// 查询 IP 地址的地理位置
    async fn query(&self, ip: &str) -> Result<Location>;

    /// 获取 provider 名称（用于日志和状态展示）
    fn name(&self) -> &'static str;

    /// 释放数据库，之后的查询返回 `DatabaseNotFound`
    fn close(&self) -> Result<()>;
}
