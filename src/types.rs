//! Type definitions and aliases

use std::time::Duration;
use colored::Color;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// How a finished benchmark run is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Numbered list of every region ordered by median latency
    #[default]
    Table,
    /// Only the fastest region that is not the global anycast endpoint
    Top,
    /// Raw per-probe rows streamed while the run is in progress
    Csv,
    /// One aggregated row per region in rank order
    CsvCumulative,
    /// Median of the one region the run was restricted to
    Single,
}

impl OutputMode {
    /// Machine readable modes must not interleave log lines with their rows
    pub fn is_machine_readable(&self) -> bool {
        matches!(self, Self::Csv | Self::CsvCumulative)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Top => "top",
            Self::Csv => "csv",
            Self::CsvCumulative => "csv-cum",
            Self::Single => "single",
        }
    }
}

/// Latency classification used to color medians
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Excellent,  // < 50ms
    Good,       // 50-100ms
    Fair,       // 100-300ms
    Poor,       // 300-1000ms
    VeryPoor,   // >= 1000ms
}

impl PerformanceLevel {
    /// Classify a median latency
    pub fn from_duration(duration: Duration) -> Self {
        let ms = duration.as_secs_f64() * 1000.0;
        if ms < 50.0 {
            Self::Excellent
        } else if ms < 100.0 {
            Self::Good
        } else if ms < 300.0 {
            Self::Fair
        } else if ms < 1000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    /// Get color for this performance level
    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_thresholds() {
        assert_eq!(PerformanceLevel::from_duration(Duration::from_millis(12)), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_duration(Duration::from_millis(50)), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::from_duration(Duration::from_millis(150)), PerformanceLevel::Fair);
        assert_eq!(PerformanceLevel::from_duration(Duration::from_millis(999)), PerformanceLevel::Poor);
        assert_eq!(PerformanceLevel::from_duration(Duration::from_secs(2)), PerformanceLevel::VeryPoor);
    }

    #[test]
    fn test_output_mode_flags() {
        assert_eq!(OutputMode::default(), OutputMode::Table);
        assert!(OutputMode::Csv.is_machine_readable());
        assert!(OutputMode::CsvCumulative.is_machine_readable());
        assert!(!OutputMode::Top.is_machine_readable());
        assert_eq!(OutputMode::CsvCumulative.name(), "csv-cum");
    }
}
