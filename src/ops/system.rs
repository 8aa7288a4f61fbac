//! System information operations
//!
//! The parsers target the usual GNU/Linux and BusyBox output of `df`, `free`,
//! `ps` and `uptime`. Anything else degrades to partial records.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{split_fields, Outcome};
use crate::error::Result;
use crate::ssh::{quote, quote_path, CommandRunner};

/// Sectioned hostname / OS / uptime / load report
pub const SYSTEM_INFO_COMMAND: &str = "echo '=== Hostname ==='; hostname; \
echo '=== OS ==='; if [ -r /etc/os-release ]; then head -n 5 /etc/os-release; else uname -a; fi; \
echo '=== Uptime ==='; uptime; \
echo '=== Load ==='; cat /proc/loadavg 2>/dev/null || uptime";

/// Memory report, falling back to `vm_stat` where `free` is missing
pub const MEMORY_COMMAND: &str = "free -h 2>/dev/null || vm_stat";

/// Load averages over 1, 5 and 15 minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Host overview
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemInfo {
    pub hostname: Option<String>,

    /// `/etc/os-release` fields, or `uname` when that file is missing
    pub os: BTreeMap<String, String>,

    pub uptime: Option<String>,
    pub load_average: Option<LoadAverage>,
}

/// Parse the output of [`SYSTEM_INFO_COMMAND`]
pub fn parse_system_info(stdout: &str) -> SystemInfo {
    let mut sections: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    let mut current = None;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed
            .strip_prefix("=== ")
            .and_then(|rest| rest.strip_suffix(" ==="))
        {
            current = Some(name.to_lowercase());
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if let Some(name) = &current {
            sections.entry(name.clone()).or_default().push(trimmed);
        }
    }

    let first = |name: &str| {
        sections
            .get(name)
            .and_then(|lines| lines.first())
            .map(|line| line.to_string())
    };

    let mut os = BTreeMap::new();
    for line in sections.get("os").into_iter().flatten() {
        match line.split_once('=') {
            Some((key, value)) => {
                os.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
            }
            None => {
                os.insert("uname".to_string(), line.to_string());
            }
        }
    }

    let uptime = first("uptime");
    let load_average = first("load")
        .as_deref()
        .and_then(parse_load_average)
        .or_else(|| uptime.as_deref().and_then(parse_load_average));

    SystemInfo {
        hostname: first("hostname"),
        os,
        uptime,
        load_average,
    }
}

/// Read load averages from `/proc/loadavg` or an `uptime` line
pub fn parse_load_average(line: &str) -> Option<LoadAverage> {
    let numbers = match line.find("load average") {
        Some(idx) => line[idx..].split_once(':')?.1,
        None => line,
    };

    let mut values = numbers
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>());

    match (values.next(), values.next(), values.next()) {
        (Some(Ok(one)), Some(Ok(five)), Some(Ok(fifteen))) => Some(LoadAverage { one, five, fifteen }),
        _ => None,
    }
}

/// Gather hostname, OS release, uptime and load
pub async fn system_info(runner: &dyn CommandRunner) -> Result<Outcome<SystemInfo>> {
    let output = runner
        .run(SYSTEM_INFO_COMMAND, runner.default_timeout())
        .await?;
    Ok(Outcome::from_output(output, |o| parse_system_info(&o.stdout)))
}

/// One mounted filesystem, sizes as printed by `df -h`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub filesystem: String,
    pub size: String,
    pub used: String,
    pub available: String,
    pub use_percent: String,
    pub mounted_on: String,
}

/// Build the `df` command; POSIX output keeps one filesystem per line
pub fn disk_usage_command(path: Option<&str>) -> String {
    match path {
        Some(path) if !path.trim().is_empty() => format!("df -hP {}", quote_path(path)),
        _ => "df -hP".to_string(),
    }
}

/// Parse `df -hP` output
pub fn parse_disk_usage(stdout: &str) -> Vec<DiskUsage> {
    let mut disks = Vec::new();
    // Long device names may still wrap onto their own line
    let mut pending: Option<&str> = None;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("Filesystem") {
            continue;
        }

        let (filesystem, fields) = match pending.take() {
            Some(filesystem) => (filesystem, split_fields(trimmed, 5)),
            None => {
                let fields = split_fields(trimmed, 6);
                if fields.len() == 1 {
                    pending = Some(fields[0]);
                    continue;
                }
                match fields.split_first() {
                    Some((filesystem, rest)) => (*filesystem, rest.to_vec()),
                    None => continue,
                }
            }
        };

        if let &[size, used, available, use_percent, mounted_on] = &fields[..] {
            disks.push(DiskUsage {
                filesystem: filesystem.to_string(),
                size: size.to_string(),
                used: used.to_string(),
                available: available.to_string(),
                use_percent: use_percent.to_string(),
                mounted_on: mounted_on.to_string(),
            });
        }
    }

    disks
}

/// Disk usage for all filesystems, or the one holding `path`
pub async fn disk_usage(
    runner: &dyn CommandRunner,
    path: Option<&str>,
) -> Result<Outcome<Vec<DiskUsage>>> {
    let output = runner
        .run(&disk_usage_command(path), runner.default_timeout())
        .await?;
    Ok(Outcome::from_output(output, |o| parse_disk_usage(&o.stdout)))
}

/// Memory and swap figures keyed by the column names the host printed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub memory: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub swap: BTreeMap<String, String>,
}

/// Parse `free -h` output, or `vm_stat` key/value lines
pub fn parse_memory_usage(stdout: &str) -> MemoryUsage {
    let mut usage = MemoryUsage::default();
    let mut header: Option<Vec<&str>> = None;

    for line in stdout.lines() {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        match first.strip_suffix(':') {
            Some(label) if header.is_some() => {
                let target = match label.to_lowercase().as_str() {
                    "mem" => &mut usage.memory,
                    "swap" => &mut usage.swap,
                    _ => continue,
                };
                if let Some(columns) = &header {
                    for (column, value) in columns.iter().zip(tokens) {
                        target.insert(column.to_string(), value.to_string());
                    }
                }
            }
            None if header.is_none() && !line.contains(':') => {
                header = Some(line.split_whitespace().collect());
            }
            _ => {}
        }
    }

    if usage.memory.is_empty() && usage.swap.is_empty() {
        // vm_stat: "Pages free:                 12345."
        for line in stdout.lines() {
            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim().trim_end_matches('.');
                if !key.trim().is_empty() && !value.is_empty() {
                    usage
                        .memory
                        .insert(key.trim().to_string(), value.to_string());
                }
            }
        }
    }

    usage
}

/// Memory usage
pub async fn memory_usage(runner: &dyn CommandRunner) -> Result<Outcome<MemoryUsage>> {
    let output = runner.run(MEMORY_COMMAND, runner.default_timeout()).await?;
    Ok(Outcome::from_output(output, |o| parse_memory_usage(&o.stdout)))
}

/// One row of `ps aux`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInfo {
    pub user: String,
    pub pid: u32,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    /// Virtual size in KiB
    pub vsz: u64,
    /// Resident set size in KiB
    pub rss: u64,
    pub tty: String,
    pub stat: String,
    pub start: String,
    pub time: String,
    pub command: String,
}

/// Build the process listing command
///
/// Without a filter, the `top` busiest processes by CPU. With a filter,
/// the first `top` processes whose line matches it (case-insensitive).
pub fn process_list_command(filter: Option<&str>, top: u32) -> String {
    let top = top.max(1);
    match filter {
        Some(filter) if !filter.is_empty() => format!(
            "ps aux | grep -i -e {} | grep -v grep | head -n {}",
            quote(filter),
            top
        ),
        _ => format!(
            "{{ ps aux --sort=-%cpu 2>/dev/null || ps aux; }} | head -n {}",
            top.saturating_add(1)
        ),
    }
}

/// Parse `ps aux` rows; the header and malformed rows are skipped
pub fn parse_process_list(stdout: &str) -> Vec<ProcessInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let fields = split_fields(line, 11);
            let &[user, pid, cpu, mem, vsz, rss, tty, stat, start, time, command] = &fields[..] else {
                return None;
            };
            Some(ProcessInfo {
                user: user.to_string(),
                pid: pid.parse().ok()?,
                cpu_percent: cpu.parse().unwrap_or(0.0),
                mem_percent: mem.parse().unwrap_or(0.0),
                vsz: vsz.parse().unwrap_or(0),
                rss: rss.parse().unwrap_or(0),
                tty: tty.to_string(),
                stat: stat.to_string(),
                start: start.to_string(),
                time: time.to_string(),
                command: command.to_string(),
            })
        })
        .collect()
}

/// List running processes
pub async fn process_list(
    runner: &dyn CommandRunner,
    filter: Option<&str>,
    top: u32,
) -> Result<Outcome<Vec<ProcessInfo>>> {
    let output = runner
        .run(&process_list_command(filter, top), runner.default_timeout())
        .await?;
    Ok(Outcome::from_output(output, |o| parse_process_list(&o.stdout)))
}
