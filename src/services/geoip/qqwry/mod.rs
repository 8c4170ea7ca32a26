//! 纯真 IP 库 Provider
//!
//! 国家字段形如 `中国–北京–北京–朝阳区`，按长破折号拆成国家/省/市/区，
//! 地区字段作为运营商信息。

mod reader;

pub use reader::{INDEX_LEN, QQwryReader, QQwryRecord};

use std::net::IpAddr;
use std::path::Path;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tracing::{info, trace};

use super::location::{Location, Source};
use super::provider::{GeoProvider, QQWRY_PROVIDER};
use crate::errors::{LocatorError, Result};

/// 地理层级分隔符 (U+2013)
const REGION_SEPARATOR: char = '–';

/// 纯真 IP 库查询提供者
pub struct QQwryProvider {
    reader: ArcSwapOption<QQwryReader>,
}

impl QQwryProvider {
    /// 从文件路径创建
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = QQwryReader::open(path.as_ref())?;
        info!(
            "QQwry: loaded {} with {} index records",
            path.as_ref().display(),
            reader.record_count()
        );
        Ok(Self::from_reader(reader))
    }

    pub fn from_reader(reader: QQwryReader) -> Self {
        Self {
            reader: ArcSwapOption::from_pointee(reader),
        }
    }

    fn lookup(&self, ip: &str) -> Result<Location> {
        let reader = self
            .reader
            .load_full()
            .ok_or_else(|| LocatorError::database_not_found("qqwry database is closed"))?;

        // 只支持 IPv4
        let addr: IpAddr = ip.parse()?;
        if addr.is_ipv6() {
            return Err(LocatorError::no_data(format!(
                "qqwry does not cover IPv6 address {}",
                ip
            )));
        }

        let record = reader.find(ip).map_err(|e| match e {
            LocatorError::InvalidIp(_) => e,
            other => LocatorError::no_data(other.message().to_string()),
        })?;

        let location = record_to_location(record);
        trace!(
            "QQwry lookup for {}: country={:?}, province={:?}, city={:?}, isp={:?}",
            ip, location.country, location.province, location.city, location.isp
        );
        Ok(location)
    }
}

/// 按分隔符填充国家/省/市/区
fn record_to_location(record: QQwryRecord) -> Location {
    let mut parts = record.country.split(REGION_SEPARATOR).map(str::trim);
    let mut next_part = || parts.next().unwrap_or_default().to_string();

    let country = next_part();
    let province = next_part();
    let city = next_part();
    let district = next_part();

    Location {
        ip: record.ip,
        country,
        province,
        city,
        district,
        isp: record.area,
        source: Source::QQwry,
        ..Default::default()
    }
}

#[async_trait]
impl GeoProvider for QQwryProvider {
    async fn query(&self, ip: &str) -> Result<Location> {
        self.lookup(ip)
    }

    fn name(&self) -> &'static str {
        QQWRY_PROVIDER
    }

    fn close(&self) -> Result<()> {
        self.reader.store(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, area: &str) -> QQwryRecord {
        QQwryRecord {
            ip: "1.2.3.4".to_string(),
            country: country.to_string(),
            area: area.to_string(),
        }
    }

    #[test]
    fn test_split_full_hierarchy() {
        let loc = record_to_location(record("中国–北京–北京–朝阳区", "联通"));
        assert_eq!(loc.country, "中国");
        assert_eq!(loc.province, "北京");
        assert_eq!(loc.city, "北京");
        assert_eq!(loc.district, "朝阳区");
        assert_eq!(loc.isp, "联通");
        assert_eq!(loc.source, Source::QQwry);
        assert_eq!(loc.detail_score(), 15);
    }

    #[test]
    fn test_split_trims_and_tolerates_short_values() {
        let loc = record_to_location(record(" 美国 ", ""));
        assert_eq!(loc.country, "美国");
        assert!(loc.province.is_empty());
        assert!(loc.city.is_empty());
        assert!(loc.isp.is_empty());

        let loc = record_to_location(record("中国 – 广东", "电信"));
        assert_eq!(loc.country, "中国");
        assert_eq!(loc.province, "广东");
    }

    #[test]
    fn test_split_ignores_ascii_hyphen() {
        let loc = record_to_location(record("IANA-保留地址", ""));
        assert_eq!(loc.country, "IANA-保留地址");
        assert!(loc.province.is_empty());
    }
}
