use serde::Serialize;
use strum::{AsRefStr, Display};

/// 数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, AsRefStr, Display)]
pub enum Source {
    /// 纯真 IP 库（主数据源）
    #[default]
    #[serde(rename = "qqwry")]
    #[strum(serialize = "qqwry")]
    QQwry,
    /// GeoLite2 数据库（次数据源）
    #[serde(rename = "geolite2")]
    #[strum(serialize = "geolite2")]
    GeoLite,
    /// 两个数据源合并的结果
    #[serde(rename = "combined")]
    #[strum(serialize = "combined")]
    Combined,
}

/// 统一的 IP 地理位置信息
///
/// 空字符串表示字段缺失；经纬度 (0, 0) 表示没有坐标。
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Location {
    pub ip: String,
    /// 国家
    pub country: String,
    /// 省/州
    pub province: String,
    /// 市
    pub city: String,
    /// 区/县
    pub district: String,
    /// 运营商
    pub isp: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "timezone")]
    pub time_zone: String,
    pub source: Source,
}

impl Location {
    /// 国家、省、市全部为空
    pub fn is_empty(&self) -> bool {
        self.country.is_empty() && self.province.is_empty() && self.city.is_empty()
    }

    /// 有省份或城市信息
    pub fn has_detailed_info(&self) -> bool {
        !self.province.is_empty() || !self.city.is_empty()
    }

    /// 地理信息详细程度分数，只用于两个结果之间的比较
    ///
    /// 国家(1) + 省/州(2) + 市(4) + 区/县(8)
    pub fn detail_score(&self) -> u8 {
        let mut score = 0;
        if !self.country.is_empty() {
            score += 1;
        }
        if !self.province.is_empty() {
            score += 2;
        }
        if !self.city.is_empty() {
            score += 4;
        }
        if !self.district.is_empty() {
            score += 8;
        }
        score
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}
