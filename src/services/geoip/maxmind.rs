//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 GeoLite2-City.mmdb 文件查询，支持 IPv4 和 IPv6。
//! 名称优先取简体中文，没有时回退到英文。

use std::net::IpAddr;
use std::path::Path;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use maxminddb::Reader;
use tracing::{info, trace};

use super::location::{Location, Source};
use super::provider::{GEOLITE_PROVIDER, GeoProvider};
use crate::errors::{LocatorError, Result};

/// GeoLite2 查询提供者
pub struct GeoLiteProvider {
    reader: ArcSwapOption<Reader<Vec<u8>>>,
}

impl GeoLiteProvider {
    /// 从文件路径创建 GeoLite2 Provider
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LocatorError::database_not_found(format!(
                "{}: no such file",
                path.display()
            )));
        }

        let reader = Reader::open_readfile(path).map_err(|e| {
            LocatorError::database_invalid(format!("{}: {}", path.display(), e))
        })?;
        info!(
            "GeoLite: loaded {} ({})",
            path.display(),
            reader.metadata.database_type
        );

        Ok(Self {
            reader: ArcSwapOption::from_pointee(reader),
        })
    }

    fn lookup(&self, ip: &str) -> Result<Location> {
        let reader = self
            .reader
            .load_full()
            .ok_or_else(|| LocatorError::database_not_found("geolite database is closed"))?;

        let ip_addr: IpAddr = ip.parse()?;

        let result = reader.lookup(ip_addr)?;
        if !result.has_data() {
            return Err(LocatorError::no_data(format!("geolite has no record for {}", ip)));
        }
        let city: maxminddb::geoip2::City = result
            .decode()?
            .ok_or_else(|| LocatorError::no_data(format!("geolite has no record for {}", ip)))?;

        // 国家名称备选：国家中文 -> 注册国家中文 -> 国家英文 -> 注册国家英文
        let country = city
            .country
            .names
            .simplified_chinese
            .or(city.registered_country.names.simplified_chinese)
            .or(city.country.names.english)
            .or(city.registered_country.names.english);

        let province = city
            .subdivisions
            .first()
            .and_then(|s| s.names.simplified_chinese.or(s.names.english));

        let city_name = city.city.names.simplified_chinese.or(city.city.names.english);

        let location = Location {
            ip: ip.to_string(),
            country: country.unwrap_or_default().to_string(),
            province: province.unwrap_or_default().to_string(),
            city: city_name.unwrap_or_default().to_string(),
            latitude: city.location.latitude.unwrap_or_default(),
            longitude: city.location.longitude.unwrap_or_default(),
            time_zone: city.location.time_zone.unwrap_or_default().to_string(),
            source: Source::GeoLite,
            ..Default::default()
        };

        trace!(
            "GeoLite lookup for {}: country={:?}, province={:?}, city={:?}",
            ip, location.country, location.province, location.city
        );
        Ok(location)
    }
}

#[async_trait]
impl GeoProvider for GeoLiteProvider {
    async fn query(&self, ip: &str) -> Result<Location> {
        self.lookup(ip)
    }

    fn name(&self) -> &'static str {
        GEOLITE_PROVIDER
    }

    fn close(&self) -> Result<()> {
        self.reader.store(None);
        Ok(())
    }
}
