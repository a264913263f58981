//! Command-line interface for the benchmarking binary

use clap::Parser;
use std::time::Duration;

/// Measure latency to every region and rank them by median round trip
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "regionping")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Probes per region [default: 10]
    #[arg(short = 'n', long = "number", value_name = "N")]
    pub repetitions: Option<u32>,

    /// Probes in flight at once [default: 10]
    #[arg(short = 'c', long, value_name = "C")]
    pub concurrency: Option<usize>,

    /// Per-probe timeout such as 500ms or 2s; 0 disables it [default: 0]
    #[arg(short = 't', long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Only probe this region and print its median
    #[arg(short = 'r', long, value_name = "REGION")]
    pub region: Option<String>,

    /// Print only the fastest region that is not global
    #[arg(long, conflicts_with_all = ["csv", "csv_cum"])]
    pub top: bool,

    /// Stream every probe as CSV; disables verbose output
    #[arg(long, conflicts_with = "csv_cum")]
    pub csv: bool,

    /// Cumulative per-region CSV; disables verbose output
    #[arg(long = "csv-cum")]
    pub csv_cum: bool,

    /// Log every probe as it starts and completes
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Fetch the region directory from this URL instead of the builtin table
    #[arg(long, value_name = "URL")]
    pub endpoints_url: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Validate CLI arguments clap cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("Concurrency (-c) must be greater than 0".to_string());
        }

        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                return Err("Region (-r) cannot be empty".to_string());
            }
            if self.top {
                return Err("--top cannot be combined with -r".to_string());
            }
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Parse a duration such as `0`, `300ms`, `1.5s` or `1m30s`.
///
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A bare `0` means zero.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Invalid duration: empty value".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let value: f64 = number
            .parse()
            .map_err(|_| format!("Invalid duration '{}': bad number '{}'", s, number))?;

        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("Invalid duration '{}': missing unit", s)),
            other => return Err(format!("Invalid duration '{}': unknown unit '{}'", s, other)),
        };

        nanos += value * scale;
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(format!("Invalid duration '{}': out of range", s));
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
