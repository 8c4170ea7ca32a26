//! Command-line interface definitions using clap
//!
//! 命令行参数优先级高于配置文件和环境变量。

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::LocatorConfig;
use crate::services::geoip::{Location, Source};

/// iplocator - 纯真 IP 库 + GeoLite2 双数据源 IP 定位
#[derive(Debug, Parser)]
#[command(name = "iplocator")]
#[command(version)]
#[command(about = "Dual-source IP geolocation (QQwry + GeoLite2)", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// IP addresses to locate (reads stdin when omitted)
    pub ips: Vec<String>,

    /// Configuration file path
    #[arg(long, short = 'c', default_value = "config.toml")]
    pub config: String,

    /// Path to qqwry.dat (overrides config)
    #[arg(long)]
    pub qqwry: Option<String>,

    /// Path to GeoLite2-City.mmdb (overrides config)
    #[arg(long)]
    pub geolite: Option<String>,

    /// Disable the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Result cache capacity
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Log merge decisions
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Print query and cache statistics at the end
    #[arg(long)]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate example configuration file
    GenerateConfig {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// 把命令行参数覆盖到配置上
    pub fn apply_overrides(&self, config: &mut LocatorConfig) {
        if let Some(path) = &self.qqwry {
            config.database.qqwry_path = Some(path.clone());
        }
        if let Some(path) = &self.geolite {
            config.database.geolite_path = Some(path.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(size) = self.cache_size {
            config.cache.capacity = size;
        }
        if self.debug {
            config.debug = true;
            config.logging.level = "debug".to_string();
        }
    }
}

/// 单条查询结果的终端输出
pub fn format_location(location: &Location) -> String {
    let label = location.source.as_ref();
    let source = match location.source {
        Source::QQwry => label.yellow(),
        Source::GeoLite => label.blue(),
        Source::Combined => label.green(),
    };

    let region = [
        &location.country,
        &location.province,
        &location.city,
        &location.district,
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .map(String::as_str)
    .collect::<Vec<_>>()
    .join(" ");

    let mut out = format!(
        "{} {} [{}]",
        location.ip.cyan().bold(),
        region.white(),
        source
    );
    if !location.isp.is_empty() {
        out.push_str(&format!("\n  {} {}", "ISP:".dimmed(), location.isp));
    }
    if location.has_coordinates() {
        out.push_str(&format!(
            "\n  {} {:.4}, {:.4}",
            "Coordinates:".dimmed(),
            location.latitude,
            location.longitude
        ));
    }
    if !location.time_zone.is_empty() {
        out.push_str(&format!("\n  {} {}", "Timezone:".dimmed(), location.time_zone));
    }
    out
}
