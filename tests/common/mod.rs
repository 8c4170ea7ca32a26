//! 测试用纯真 IP 库生成器
//!
//! 生成体积很小但格式完整的 qqwry.dat，覆盖所有重定向模式，
//! 字符串按 GBK 编码写入。
#![allow(dead_code)]

use std::io::Write;
use std::net::Ipv4Addr;

use encoding_rs::GBK;
use tempfile::NamedTempFile;

const MODE_ALL: u8 = 0x01;
const MODE_FIELD: u8 = 0x02;

/// 记录的存储方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// 国家、地区都直接跟在结束 IP 后面
    Inline,
    /// 国家用 0x02 重定向，地区内联
    CountryRedirect,
    /// 国家内联，地区用 0x02 重定向
    AreaRedirect,
    /// 地区重定向偏移为 0，表示没有地区
    EmptyArea,
    /// 0x01 整体重定向到“国家 + 地区”块
    FullRedirect,
    /// 0x01 重定向后，块内国家和地区又各自 0x02 重定向
    NestedRedirect,
}

#[derive(Debug, Clone)]
struct Entry {
    start: u32,
    country: String,
    area: String,
    layout: Layout,
}

/// 按起始 IP 升序添加记录，最后一条索引是边界
#[derive(Debug, Clone)]
pub struct QQwryBuilder {
    entries: Vec<Entry>,
    sentinel: u32,
}

impl Default for QQwryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QQwryBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            sentinel: u32::MAX,
        }
    }

    pub fn entry(mut self, start: &str, country: &str, area: &str, layout: Layout) -> Self {
        self.entries.push(Entry {
            start: ip_to_u32(start),
            country: country.to_string(),
            area: area.to_string(),
            layout,
        });
        self
    }

    /// 边界记录的起始 IP（不含）
    pub fn sentinel(mut self, ip: &str) -> Self {
        self.sentinel = ip_to_u32(ip);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![0u8; 8];

        // 字符串池：重定向的目标
        let mut pool = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let country = push_cstr(&mut data, &entry.country);
            let area = push_cstr(&mut data, &entry.area);

            let block = match entry.layout {
                Layout::FullRedirect => {
                    let block = data.len();
                    push_cstr(&mut data, &entry.country);
                    push_cstr(&mut data, &entry.area);
                    block
                }
                Layout::NestedRedirect => {
                    let block = data.len();
                    push_pointer(&mut data, MODE_FIELD, country);
                    push_pointer(&mut data, MODE_FIELD, area);
                    block
                }
                _ => 0,
            };
            pool.push((country, area, block));
        }

        // 记录区
        let mut record_offsets = Vec::with_capacity(self.entries.len());
        for (i, (entry, &(country, area, block))) in self.entries.iter().zip(&pool).enumerate() {
            record_offsets.push(data.len());

            let end_ip = self
                .entries
                .get(i + 1)
                .map(|next| next.start)
                .unwrap_or(self.sentinel)
                .saturating_sub(1);
            data.extend_from_slice(&end_ip.to_le_bytes());

            match entry.layout {
                Layout::Inline => {
                    push_cstr(&mut data, &entry.country);
                    push_cstr(&mut data, &entry.area);
                }
                Layout::CountryRedirect => {
                    push_pointer(&mut data, MODE_FIELD, country);
                    push_cstr(&mut data, &entry.area);
                }
                Layout::AreaRedirect => {
                    push_cstr(&mut data, &entry.country);
                    push_pointer(&mut data, MODE_FIELD, area);
                }
                Layout::EmptyArea => {
                    push_cstr(&mut data, &entry.country);
                    push_pointer(&mut data, MODE_FIELD, 0);
                }
                Layout::FullRedirect | Layout::NestedRedirect => {
                    push_pointer(&mut data, MODE_ALL, block);
                }
            }
        }

        // 索引区
        let index_start = data.len();
        for (entry, &offset) in self.entries.iter().zip(&record_offsets) {
            data.extend_from_slice(&entry.start.to_le_bytes());
            push_u24(&mut data, offset);
        }
        let index_end = data.len();
        data.extend_from_slice(&self.sentinel.to_le_bytes());
        push_u24(&mut data, record_offsets.last().copied().unwrap_or(0));

        data[0..4].copy_from_slice(&(index_start as u32).to_le_bytes());
        data[4..8].copy_from_slice(&(index_end as u32).to_le_bytes());
        data
    }

    pub fn write_temp(&self) -> NamedTempFile {
        write_temp(&self.build())
    }
}

/// 覆盖所有存储方式的样例库
pub fn sample_builder() -> QQwryBuilder {
    QQwryBuilder::new()
        .entry("1.0.0.0", "美国", "APNIC DNS", Layout::Inline)
        .entry("1.0.1.0", "中国–福建–福州", "电信", Layout::CountryRedirect)
        .entry("36.0.0.0", "中国–北京–北京–朝阳区", "联通", Layout::FullRedirect)
        .entry("58.0.0.0", "中国–广东–深圳", "电信", Layout::NestedRedirect)
        .entry("101.0.0.0", "中国–浙江–杭州", "阿里云", Layout::AreaRedirect)
        .entry("114.114.114.0", "中国–江苏–南京", "", Layout::EmptyArea)
        .sentinel("224.0.0.0")
}

pub fn sample_database() -> Vec<u8> {
    sample_builder().build()
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

fn ip_to_u32(ip: &str) -> u32 {
    u32::from(ip.parse::<Ipv4Addr>().expect("fixture ip"))
}

fn push_cstr(data: &mut Vec<u8>, text: &str) -> usize {
    let offset = data.len();
    let (encoded, _, unmappable) = GBK.encode(text);
    assert!(!unmappable, "fixture text not representable in GBK: {}", text);
    data.extend_from_slice(&encoded);
    data.push(0);
    offset
}

fn push_pointer(data: &mut Vec<u8>, mode: u8, offset: usize) {
    data.push(mode);
    push_u24(data, offset);
}

fn push_u24(data: &mut Vec<u8>, value: usize) {
    data.extend_from_slice(&(value as u32).to_le_bytes()[..3]);
}
