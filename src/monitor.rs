//! Periodic resource monitoring and URL availability checking.
//!
//! Two config-gated side loops. The resource monitor samples process CPU
//! and memory plus system CPU and memory from `/proc`, appends one
//! timestamped line per interval to a log file, and raises a dummy alert
//! when process memory crosses a threshold. The URL checker fetches a
//! configured URL, logs status, response time and size, and raises a
//! dummy alert on oversized responses. The proxy core consumes none of
//! this data.

use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::{MonitorConfig, UrlCheckConfig};

// Linux USER_HZ; /proc/self/stat CPU times are reported in these ticks.
const CLOCK_TICKS_PER_SEC: f64 = 100.0;

const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(500);

pub async fn run(cfg: MonitorConfig) -> anyhow::Result<()> {
    let interval = Duration::from_secs(cfg.interval_secs);
    tracing::info!(
        interval_secs = cfg.interval_secs,
        log_path = %cfg.log_path,
        "Resource monitor started"
    );

    loop {
        let entry = sample().await;
        tracing::info!("{}", entry.format_line());

        if let Err(e) = append_line(&cfg.log_path, &entry.format_line()).await {
            tracing::warn!(error = %e, "Failed to write monitor log entry");
        }

        if let Some(rss) = entry.process_rss_mb {
            if rss > cfg.alert_rss_mb {
                send_memory_alert_stub(rss, cfg.alert_rss_mb);
            }
        }

        tokio::time::sleep(interval).await;
    }
}

/// One monitoring sample. Fields are `None` when the corresponding
/// `/proc` source could not be read.
#[derive(Debug)]
pub struct Sample {
    pub timestamp: String,
    pub process_cpu_percent: Option<f64>,
    pub process_rss_mb: Option<f64>,
    pub system_used_mb: Option<f64>,
    pub system_cpu_percent: Option<f64>,
}

impl Sample {
    pub fn format_line(&self) -> String {
        fn fmt(v: Option<f64>, unit: &str) -> String {
            match v {
                Some(v) => format!("{:.2}{}", v, unit),
                None => "n/a".to_string(),
            }
        }

        format!(
            "{} | Process CPU: {} | Process Memory: {} | System Memory Used: {} | System CPU Usage: {}",
            self.timestamp,
            fmt(self.process_cpu_percent, "%"),
            fmt(self.process_rss_mb, " MB"),
            fmt(self.system_used_mb, " MB"),
            fmt(self.system_cpu_percent, "%"),
        )
    }
}

async fn sample() -> Sample {
    let (process_cpu_percent, system_cpu_percent) = cpu_percentages().await;

    Sample {
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        process_cpu_percent,
        process_rss_mb: process_rss_mb(),
        system_used_mb: system_memory_used_mb(),
        system_cpu_percent,
    }
}

/// Process and system CPU usage over one shared sampling window.
/// Process usage is normalized by the number of cores.
async fn cpu_percentages() -> (Option<f64>, Option<f64>) {
    let process_start = process_cpu_ticks();
    let system_start = system_cpu_totals();

    tokio::time::sleep(CPU_SAMPLE_WINDOW).await;

    let process_end = process_cpu_ticks();
    let system_end = system_cpu_totals();

    let process = match (process_start, process_end) {
        (Some(start), Some(end)) => {
            let cpu_secs = end.saturating_sub(start) as f64 / CLOCK_TICKS_PER_SEC;
            let elapsed_secs = CPU_SAMPLE_WINDOW.as_secs_f64();
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1) as f64;
            Some(cpu_secs / (elapsed_secs * cores) * 100.0)
        }
        _ => None,
    };

    let system = match (system_start, system_end) {
        (Some((busy0, total0)), Some((busy1, total1))) => {
            let total = total1.saturating_sub(total0);
            if total == 0 {
                None
            } else {
                Some(busy1.saturating_sub(busy0) as f64 / total as f64 * 100.0)
            }
        }
        _ => None,
    };

    (process, system)
}

fn process_cpu_ticks() -> Option<u64> {
    let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
    parse_stat_cpu_ticks(&stat)
}

/// utime + stime from a `/proc/<pid>/stat` line. The comm field may
/// contain spaces, so fields are counted from the closing paren.
pub fn parse_stat_cpu_ticks(stat: &str) -> Option<u64> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    // After comm, utime is field 11 and stime field 12 (0-indexed from state)
    let utime: u64 = fields.nth(11)?.parse().ok()?;
    let stime: u64 = fields.next()?.parse().ok()?;
    Some(utime + stime)
}

fn system_cpu_totals() -> Option<(u64, u64)> {
    let stat = std::fs::read_to_string("/proc/stat").ok()?;
    parse_proc_stat_cpu(&stat)
}

/// (busy, total) tick counts from the aggregate `cpu` line of
/// `/proc/stat`. Idle and iowait count as idle time.
pub fn parse_proc_stat_cpu(stat: &str) -> Option<(u64, u64)> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let ticks: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();

    // user nice system idle iowait irq softirq steal ...
    if ticks.len() < 5 {
        return None;
    }
    let idle = ticks[3] + ticks[4];
    let total: u64 = ticks.iter().sum();
    Some((total - idle, total))
}

fn process_rss_mb() -> Option<f64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss_kb(&status).map(|kb| kb as f64 / 1024.0)
}

/// VmRSS in kB from `/proc/<pid>/status` contents.
pub fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

fn system_memory_used_mb() -> Option<f64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_meminfo_used_kb(&meminfo).map(|kb| kb as f64 / 1024.0)
}

/// MemTotal - MemAvailable in kB from `/proc/meminfo` contents.
pub fn parse_meminfo_used_kb(meminfo: &str) -> Option<u64> {
    fn field(meminfo: &str, name: &str) -> Option<u64> {
        meminfo
            .lines()
            .find(|line| line.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    }

    let total = field(meminfo, "MemTotal:")?;
    let available = field(meminfo, "MemAvailable:")?;
    Some(total.saturating_sub(available))
}

// --- URL availability checker ---

pub async fn run_url_check(cfg: UrlCheckConfig) -> anyhow::Result<()> {
    let interval = Duration::from_secs(cfg.interval_secs);
    tracing::info!(
        url = %cfg.url,
        interval_secs = cfg.interval_secs,
        log_path = %cfg.log_path,
        "URL availability checker started"
    );

    loop {
        let entry = check_url(&cfg.url).await;
        tracing::info!("{}", entry.format_line());

        if let Err(e) = append_line(&cfg.log_path, &entry.format_line()).await {
            tracing::warn!(error = %e, "Failed to write URL check log entry");
        }

        if entry.response_size > cfg.alert_size_bytes {
            send_large_response_alert_stub(entry.response_size, cfg.alert_size_bytes);
        }

        tokio::time::sleep(interval).await;
    }
}

/// Outcome of one URL check.
#[derive(Debug)]
pub struct UrlCheck {
    pub timestamp: String,
    pub url: String,
    pub status: String,
    pub response_time_ms: u128,
    pub response_size: usize,
}

impl UrlCheck {
    pub fn format_line(&self) -> String {
        format!(
            "{} | Link: {} | Status: {} | Response Time: {} ms | Response Size: {} bytes",
            self.timestamp, self.url, self.status, self.response_time_ms, self.response_size,
        )
    }
}

/// Fetch the URL once and record status, elapsed time, and body size.
/// Transport failures become an `Error: ...` status, never a panic.
pub async fn check_url(url: &str) -> UrlCheck {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let started = Instant::now();

    let (status, response_size) = match fetch_url(url).await {
        Ok((status, size)) => (status_label(status), size),
        Err(e) => (format!("Error: {}", e), 0),
    };

    UrlCheck {
        timestamp,
        url: url.to_string(),
        status,
        response_time_ms: started.elapsed().as_millis(),
        response_size,
    }
}

/// "Success (200)" for 2xx statuses, "Failed (503)" otherwise.
pub fn status_label(status: u16) -> String {
    if (200..300).contains(&status) {
        format!("Success ({})", status)
    } else {
        format!("Failed ({})", status)
    }
}

async fn fetch_url(url: &str) -> anyhow::Result<(u16, usize)> {
    let parsed = url::Url::parse(url).with_context(|| format!("invalid URL: {}", url))?;
    let host = parsed.host_str().context("URL missing host")?;
    let port = parsed.port_or_known_default().unwrap_or(80);

    let mut path = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }
    if path.is_empty() {
        path.push('/');
    }

    let mut stream = TcpStream::connect((host, port))
        .await
        .context("failed to connect")?;

    let host_header = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host_header
    );
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    // Connection: close makes the response EOF-delimited
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;

    let headers_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .context("incomplete response")?;

    let status_line = std::str::from_utf8(&raw[..headers_end])
        .context("invalid UTF-8 in response headers")?
        .lines()
        .next()
        .context("empty response")?;
    let status = parse_status_code(status_line).context("invalid status line")?;

    Ok((status, raw.len() - (headers_end + 4)))
}

/// Status code from an HTTP status line such as `HTTP/1.1 200 OK`.
pub fn parse_status_code(status_line: &str) -> Option<u16> {
    status_line.split_whitespace().nth(1)?.parse().ok()
}

async fn append_line(path: &str, line: &str) -> anyhow::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("failed to open monitor log {}", path))?;

    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}

// Email delivery is a collaborator stub: raising an alert only logs it.
fn send_memory_alert_stub(rss_mb: f64, threshold_mb: f64) {
    tracing::warn!(
        rss_mb,
        threshold_mb,
        "ALERT: process memory above threshold, sending notification email (stub)"
    );
}

fn send_large_response_alert_stub(size_bytes: usize, threshold_bytes: usize) {
    tracing::warn!(
        size_bytes,
        threshold_bytes,
        "ALERT: large response detected, sending notification email (stub)"
    );
}
