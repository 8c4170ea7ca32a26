use std::io::{self, BufRead, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use iplocator::cli::{Cli, Commands, format_location};
use iplocator::config::LocatorConfig;
use iplocator::services::locator::Locator;
use iplocator::system::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output_path, force }) = &cli.command {
        return generate_config(output_path.as_deref(), *force);
    }

    // 配置优先级：命令行 > ENV > 配置文件 > 默认值
    let mut config = LocatorConfig::load(&cli.config);
    cli.apply_overrides(&mut config);
    let _guard = init_logging(&config.logging);

    let ips = collect_ips(&cli)?;
    if ips.is_empty() {
        bail!("no IP address given (pass addresses as arguments or pipe them on stdin)");
    }

    let locator = Locator::new(&config).context("failed to initialize locator")?;
    debug!("Locating {} address(es)", ips.len());

    let mut failures = 0usize;
    let mut json_results = Vec::with_capacity(ips.len());

    for ip in &ips {
        match locator.query(ip).await {
            Ok(location) => {
                if cli.json {
                    json_results.push(serde_json::to_value(&*location)?);
                } else {
                    println!("{}", format_location(&location));
                }
            }
            Err(e) => {
                failures += 1;
                if cli.json {
                    json_results.push(json!({
                        "ip": ip,
                        "error": { "code": e.code(), "message": e.message() },
                    }));
                } else {
                    eprintln!("{} {}", ip.cyan().bold(), e.format_colored());
                }
            }
        }
    }

    if cli.json {
        let mut output = json!({ "results": json_results });
        if cli.stats {
            output["stats"] = json!({
                "query": locator.query_stats(),
                "cache": locator.cache_stats(),
                "providers": locator.provider_info(),
            });
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if cli.stats {
        print_stats(&locator);
    }

    locator.close().context("failed to close databases")?;

    if failures > 0 {
        bail!("{} of {} lookup(s) failed", failures, ips.len());
    }
    Ok(())
}

/// 命令行没有给 IP 时从标准输入逐行读取
fn collect_ips(cli: &Cli) -> Result<Vec<String>> {
    if !cli.ips.is_empty() {
        return Ok(cli.ips.clone());
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(Vec::new());
    }

    let mut ips = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let ip = line.trim();
        if !ip.is_empty() && !ip.starts_with('#') {
            ips.push(ip.to_string());
        }
    }
    Ok(ips)
}

fn print_stats(locator: &Locator) {
    let stats = locator.query_stats();
    println!();
    println!("{}", "Query statistics".bold());
    println!(
        "  total {}  success {}  failed {}  ({:.1}%)",
        stats.total_queries,
        stats.success_queries.to_string().green(),
        stats.failed_queries.to_string().red(),
        stats.success_rate
    );
    println!(
        "  qqwry {}  geolite2 {}  combined {}  avg {:?}",
        stats.qqwry_hits, stats.geolite_hits, stats.combined_hits, stats.avg_duration
    );

    match locator.cache_stats() {
        Some(cache) => println!(
            "{} {}/{}  hits {}  misses {}  ({:.1}%)",
            "Cache".bold(),
            cache.size,
            cache.capacity,
            cache.hits,
            cache.misses,
            cache.hit_rate
        ),
        None => println!("{} {}", "Cache".bold(), "disabled".dimmed()),
    }

    for (name, info) in locator.provider_info() {
        let state = if info.available {
            "available".green()
        } else {
            "unavailable".red()
        };
        println!("{} {} {}", "Provider".bold(), name, state);
        for error in info.errors {
            println!("  {}", error.dimmed());
        }
    }
}

fn generate_config(output_path: Option<&str>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or("config.example.toml");

    if !force && Path::new(path).exists() {
        bail!("{} already exists, pass --force to overwrite", path);
    }

    LocatorConfig::sample()
        .save_to_file(path)
        .map_err(|e| anyhow::anyhow!("unable to write configuration file {}: {}", path, e))?;

    println!(
        "{} {}",
        "Configuration file generated".green(),
        path.blue()
    );
    println!(
        "  {}",
        "Edit the database paths before running queries".dimmed()
    );
    Ok(())
}
