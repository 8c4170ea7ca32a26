//! 双数据源结果合并
//!
//! 1. 比较两边的详细程度分数，分数高的作为基础（相等时纯真 IP 库优先）
//! 2. 基础结果缺失的国家/省/市/区由另一边补充，只补空缺，不覆盖
//! 3. 运营商优先取纯真 IP 库；经纬度和时区优先取 GeoLite2
//!
//! 第 3 条跟数据源类型绑定，与第 1 条选出的基础无关。

use tracing::debug;

use crate::services::geoip::{GEOLITE_PROVIDER, Location, QQWRY_PROVIDER, Source};

/// 仅在 debug 开关打开时输出合并过程
macro_rules! merge_trace {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            debug!(target: "iplocator::merge", $($arg)+);
        }
    };
}

/// 合并两个非空结果，输入不会被修改
pub fn merge_locations(qqwry: &Location, geolite: &Location, trace: bool) -> Location {
    let qqwry_score = qqwry.detail_score();
    let geolite_score = geolite.detail_score();

    merge_trace!(
        trace,
        "qqwry score={} country={:?} province={:?} city={:?} district={:?} isp={:?}",
        qqwry_score,
        qqwry.country,
        qqwry.province,
        qqwry.city,
        qqwry.district,
        qqwry.isp
    );
    merge_trace!(
        trace,
        "geolite score={} country={:?} province={:?} city={:?} district={:?} coords=({:.4},{:.4}) tz={:?}",
        geolite_score,
        geolite.country,
        geolite.province,
        geolite.city,
        geolite.district,
        geolite.latitude,
        geolite.longitude,
        geolite.time_zone
    );

    let (base, supplement, base_name, supplement_name) = if qqwry_score >= geolite_score {
        (qqwry, geolite, QQWRY_PROVIDER, GEOLITE_PROVIDER)
    } else {
        (geolite, qqwry, GEOLITE_PROVIDER, QQWRY_PROVIDER)
    };

    merge_trace!(
        trace,
        "using {} as base ({} vs {})",
        base_name,
        base.detail_score(),
        supplement.detail_score()
    );

    let mut merged = Location {
        ip: base.ip.clone(),
        country: base.country.clone(),
        province: base.province.clone(),
        city: base.city.clone(),
        district: base.district.clone(),
        source: Source::Combined,
        ..Default::default()
    };

    for (field, target, candidate) in [
        ("country", &mut merged.country, &supplement.country),
        ("province", &mut merged.province, &supplement.province),
        ("city", &mut merged.city, &supplement.city),
        ("district", &mut merged.district, &supplement.district),
    ] {
        if target.is_empty() && !candidate.is_empty() {
            merge_trace!(trace, "  {} filled from {}: {}", field, supplement_name, candidate);
            target.clone_from(candidate);
        }
    }

    merged.isp = if !qqwry.isp.is_empty() {
        merge_trace!(trace, "  isp from {}: {}", QQWRY_PROVIDER, qqwry.isp);
        qqwry.isp.clone()
    } else {
        geolite.isp.clone()
    };

    let coordinates = if geolite.has_coordinates() { geolite } else { qqwry };
    merged.latitude = coordinates.latitude;
    merged.longitude = coordinates.longitude;

    merged.time_zone = if !geolite.time_zone.is_empty() {
        geolite.time_zone.clone()
    } else {
        qqwry.time_zone.clone()
    };

    merge_trace!(
        trace,
        "  coords=({:.4},{:.4}) tz={:?}",
        merged.latitude,
        merged.longitude,
        merged.time_zone
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qqwry(country: &str, province: &str, city: &str, district: &str) -> Location {
        Location {
            ip: "1.2.3.4".to_string(),
            country: country.to_string(),
            province: province.to_string(),
            city: city.to_string(),
            district: district.to_string(),
            isp: "电信".to_string(),
            source: Source::QQwry,
            ..Default::default()
        }
    }

    fn geolite(country: &str, province: &str, city: &str, district: &str) -> Location {
        Location {
            ip: "1.2.3.4".to_string(),
            country: country.to_string(),
            province: province.to_string(),
            city: city.to_string(),
            district: district.to_string(),
            latitude: 39.9042,
            longitude: 116.4074,
            time_zone: "Asia/Shanghai".to_string(),
            source: Source::GeoLite,
            ..Default::default()
        }
    }

    #[test]
    fn test_higher_score_wins_verbatim() {
        let q = qqwry("中国", "北京", "北京", "");
        let g = geolite("中国", "北京市", "北京", "朝阳区");

        let merged = merge_locations(&q, &g, false);
        assert_eq!(merged.country, "中国");
        assert_eq!(merged.province, "北京市");
        assert_eq!(merged.city, "北京");
        assert_eq!(merged.district, "朝阳区");
        assert_eq!(merged.source, Source::Combined);
    }

    #[test]
    fn test_gap_filling() {
        let q = qqwry("中国", "", "", "");
        let g = geolite("", "广东", "深圳", "");

        let merged = merge_locations(&q, &g, true);
        assert_eq!(merged.country, "中国");
        assert_eq!(merged.province, "广东");
        assert_eq!(merged.city, "深圳");
        assert!(merged.district.is_empty());
        assert_eq!(merged.source, Source::Combined);
    }

    #[test]
    fn test_tie_prefers_qqwry() {
        let q = qqwry("中国", "浙江", "杭州", "");
        let g = geolite("China", "Zhejiang", "Hangzhou", "");

        let merged = merge_locations(&q, &g, false);
        assert_eq!(merged.province, "浙江");
        assert_eq!(merged.city, "杭州");
    }

    #[test]
    fn test_point_attributes_follow_source_type() {
        // GeoLite2 分数更高，但运营商仍然来自纯真 IP 库
        let q = qqwry("中国", "", "", "");
        let g = geolite("中国", "北京", "北京", "");

        let merged = merge_locations(&q, &g, false);
        assert_eq!(merged.isp, "电信");
        assert_eq!(merged.latitude, 39.9042);
        assert_eq!(merged.longitude, 116.4074);
        assert_eq!(merged.time_zone, "Asia/Shanghai");
    }

    #[test]
    fn test_point_attributes_fall_back() {
        let mut q = qqwry("中国", "北京", "", "");
        q.latitude = 1.5;
        q.longitude = 2.5;
        q.time_zone = "Asia/Chongqing".to_string();
        let mut g = geolite("中国", "", "", "");
        g.latitude = 0.0;
        g.longitude = 0.0;
        g.time_zone.clear();
        g.isp = "China Telecom".to_string();
        q.isp.clear();

        let merged = merge_locations(&q, &g, false);
        assert_eq!(merged.isp, "China Telecom");
        assert_eq!((merged.latitude, merged.longitude), (1.5, 2.5));
        assert_eq!(merged.time_zone, "Asia/Chongqing");
    }

    #[test]
    fn test_inputs_are_untouched() {
        let q = qqwry("中国", "", "", "");
        let g = geolite("", "广东", "", "");
        let (q_before, g_before) = (q.clone(), g.clone());

        let _ = merge_locations(&q, &g, false);
        assert_eq!(q, q_before);
        assert_eq!(g, g_before);
    }
}
