//! 纯真 IP 库读取器（内存版）
//!
//! 文件格式（除 IP 转整数外均为小端序）：
//! - 文件头 8 字节：索引区起始偏移 (u32) + 索引区最后一条的偏移 (u32)
//! - 索引区：每条 7 字节，4 字节起始 IP + 3 字节记录偏移
//! - 记录区：4 字节结束 IP，之后是国家/地区字段，
//!   字段可能以 1 字节模式标记 (0x01/0x02) + 3 字节偏移的形式重定向
//!
//! 整个文件在构造时读入内存，之后只读，多线程并发查询无需加锁。

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use encoding_rs::GBK;
use tracing::{debug, trace};

use crate::errors::{LocatorError, Result};

/// 索引记录长度
pub const INDEX_LEN: usize = 7;
const HEADER_LEN: usize = 8;
/// 国家和地区都重定向
const REDIRECT_MODE_1: u8 = 0x01;
/// 仅重定向当前字段
const REDIRECT_MODE_2: u8 = 0x02;

/// 查询结果（已转为 UTF-8）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QQwryRecord {
    pub ip: String,
    pub country: String,
    pub area: String,
}

/// 一次查询中解出的原始 GBK 字节，借用自数据库缓冲区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawRecord<'a> {
    country: &'a [u8],
    area: &'a [u8],
}

pub struct QQwryReader {
    data: Vec<u8>,
    index_start: usize,
    index_end: usize,
}

impl QQwryReader {
    /// 一次性把数据库加载到内存
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                LocatorError::database_not_found(format!("{}: {}", path.display(), e))
            }
            _ => LocatorError::database_invalid(format!("{}: {}", path.display(), e)),
        })?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(LocatorError::database_invalid(format!(
                "file too short: {} bytes",
                data.len()
            )));
        }

        let index_start = read_u32_le(&data, 0) as usize;
        let index_end = read_u32_le(&data, 4) as usize;

        if index_start > index_end
            || (index_end - index_start) % INDEX_LEN != 0
            || index_end + INDEX_LEN > data.len()
        {
            return Err(LocatorError::database_invalid(format!(
                "index region {}..{} does not fit in {} bytes",
                index_start,
                index_end,
                data.len()
            )));
        }

        debug!(
            "QQwry database loaded: {} bytes, {} index records",
            data.len(),
            (index_end - index_start) / INDEX_LEN + 1
        );

        Ok(Self {
            data,
            index_start,
            index_end,
        })
    }

    /// 索引记录条数（含最后一条边界记录）
    pub fn record_count(&self) -> usize {
        (self.index_end - self.index_start) / INDEX_LEN + 1
    }

    /// 查询 IPv4 地址
    ///
    /// 也接受 IPv4 映射的 IPv6 地址（`::ffff:a.b.c.d`）。
    pub fn find(&self, ip: &str) -> Result<QQwryRecord> {
        let addr = parse_ipv4(ip)?;
        let target = u32::from(addr);

        let offset = self
            .search_index(target)
            .ok_or_else(|| LocatorError::no_data(format!("{} is not in any indexed range", ip)))?;

        // 记录开头 4 字节是结束 IP
        let raw = self.read_location(offset + 4);
        trace!(
            "QQwry raw record for {}: country={} bytes, area={} bytes",
            ip,
            raw.country.len(),
            raw.area.len()
        );

        Ok(QQwryRecord {
            ip: ip.to_string(),
            country: decode_gbk(raw.country),
            area: decode_gbk(raw.area),
        })
    }

    /// 二分查找索引，返回记录偏移
    ///
    /// `start`/`end` 是字节偏移，中点按记录对齐。只剩一条记录宽度时，
    /// `end` 处的起始 IP 作为上界（不含）。
    fn search_index(&self, target: u32) -> Option<usize> {
        let mut start = self.index_start;
        let mut end = self.index_end;

        // 只有一条记录时它只是边界
        if start == end || target < self.read_u32(start) {
            return None;
        }

        loop {
            let mid = middle_offset(start, end);

            if end - start == INDEX_LEN {
                if target < self.read_u32(end) {
                    return non_zero(self.read_u24(mid + 4));
                }
                return None;
            }

            let mid_ip = self.read_u32(mid);
            if mid_ip > target {
                end = mid;
            } else if mid_ip < target {
                start = mid;
            } else {
                return non_zero(self.read_u24(mid + 4));
            }
        }
    }

    /// 读取国家和地区字段，最多跟随两层重定向
    fn read_location(&self, offset: usize) -> RawRecord<'_> {
        match self.read_mode(offset) {
            REDIRECT_MODE_1 => {
                let mut country_offset = self.read_u24(offset + 1);
                let country = if self.read_mode(country_offset) == REDIRECT_MODE_2 {
                    let country = self.read_string(self.read_u24(country_offset + 1));
                    country_offset += 4;
                    country
                } else {
                    let country = self.read_string(country_offset);
                    country_offset += country.len() + 1;
                    country
                };
                RawRecord {
                    country,
                    area: self.read_area(country_offset),
                }
            }
            REDIRECT_MODE_2 => RawRecord {
                country: self.read_string(self.read_u24(offset + 1)),
                area: self.read_area(offset + 4),
            },
            _ => {
                let country = self.read_string(offset);
                RawRecord {
                    country,
                    area: self.read_area(offset + country.len() + 1),
                }
            }
        }
    }

    fn read_area(&self, offset: usize) -> &[u8] {
        match self.read_mode(offset) {
            REDIRECT_MODE_1 | REDIRECT_MODE_2 => match self.read_u24(offset + 1) {
                0 => &[],
                area_offset => self.read_string(area_offset),
            },
            _ => self.read_string(offset),
        }
    }

    /// 读取以 0 结尾的字符串，越界返回空
    fn read_string(&self, offset: usize) -> &[u8] {
        let Some(rest) = self.data.get(offset..) else {
            return &[];
        };
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        &rest[..len]
    }

    fn read_mode(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }

    /// 3 字节小端序整数，越界返回 0
    fn read_u24(&self, offset: usize) -> usize {
        match self.data.get(offset..offset + 3) {
            Some(&[b0, b1, b2]) => b0 as usize | (b1 as usize) << 8 | (b2 as usize) << 16,
            _ => 0,
        }
    }

    fn read_u32(&self, offset: usize) -> u32 {
        read_u32_le(&self.data, offset)
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .unwrap_or(0)
}

fn middle_offset(start: usize, end: usize) -> usize {
    let records = ((end - start) / INDEX_LEN) >> 1;
    start + records * INDEX_LEN
}

fn non_zero(offset: usize) -> Option<usize> {
    (offset != 0).then_some(offset)
}

fn parse_ipv4(ip: &str) -> Result<Ipv4Addr> {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Ok(v4),
        Ok(IpAddr::V6(v6)) => v6
            .to_ipv4_mapped()
            .ok_or_else(|| LocatorError::invalid_ip(format!("{} is not an IPv4 address", ip))),
        Err(e) => Err(LocatorError::invalid_ip(format!("{}: {}", ip, e))),
    }
}

/// GBK 转 UTF-8，转换失败时按原始字节返回
fn decode_gbk(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let (text, had_errors) = GBK.decode_without_bom_handling(raw);
    if had_errors {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        text.into_owned()
    }
}
