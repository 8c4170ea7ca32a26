//! Service layer
//!
//! - `geoip`: 单个数据源的查询
//! - `locator`: 组合多个数据源

pub mod geoip;
pub mod locator;
