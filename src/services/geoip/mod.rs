//! GeoIP 数据源模块
//!
//! 提供 IP 地址地理位置查询功能，支持：
//! - 纯真 IP 库（qqwry.dat，自定义二进制格式）
//! - MaxMind GeoLite2 本地数据库

mod location;
mod maxmind;
mod provider;
pub mod qqwry;

pub use location::{Location, Source};
pub use maxmind::GeoLiteProvider;
pub use provider::{GEOLITE_PROVIDER, GeoProvider, QQWRY_PROVIDER};
pub use qqwry::{QQwryProvider, QQwryReader, QQwryRecord};
