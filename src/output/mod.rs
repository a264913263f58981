//! Result rendering
//!
//! [`Reporter`] ranks region aggregates by median latency and renders them
//! in one of the [`OutputMode`]s. Everything returns a `String`; printing
//! is left to the binary.

use crate::{
    error::{AppError, Result},
    models::ProbeResult,
    stats::RegionAggregate,
    types::{OutputMode, PerformanceLevel},
};
use colored::Colorize;
use std::fmt::Write;

/// Column padding used by the ranked table
const COLUMN_PADDING: usize = 2;
const MIN_CELL_WIDTH: usize = 3;

pub const CUMULATIVE_CSV_HEADER: &str = "region,latency_ns,errors";
pub const PROBE_CSV_HEADER: &str = "region,url,latency_ns,failed";

#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    use_color: bool,
}

impl Reporter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Sort ascending by median.
    ///
    /// The sort is stable, so ties keep aggregation order.
    pub fn rank(mut aggregates: Vec<RegionAggregate>) -> Vec<RegionAggregate> {
        aggregates.sort_by_key(|a| a.median());
        aggregates
    }

    /// Fastest region that is not the global anycast endpoint.
    ///
    /// Falls back to global only when nothing else was probed.
    pub fn top(ranked: &[RegionAggregate]) -> Option<&RegionAggregate> {
        ranked
            .iter()
            .find(|a| a.region() != crate::defaults::GLOBAL_REGION)
            .or_else(|| ranked.first())
    }

    /// Render a finished run. `Csv` rows are streamed while probing, so
    /// there is nothing left to render for it here.
    pub fn render(&self, mode: OutputMode, aggregates: Vec<RegionAggregate>) -> Result<String> {
        let ranked = Self::rank(aggregates);
        match mode {
            OutputMode::Table => self.format_table(&ranked),
            OutputMode::Top => self.format_top(&ranked),
            OutputMode::Csv => Ok(String::new()),
            OutputMode::CsvCumulative => Self::format_csv_cumulative(&ranked),
            OutputMode::Single => self.format_single(&ranked),
        }
    }

    /// ` 1.  [region]  median  (N errors)` with aligned columns
    pub fn format_table(&self, ranked: &[RegionAggregate]) -> Result<String> {
        let rank_width = cell_width(ranked.len().to_string().len() + 1).max(cell_width(3));
        let region_width = cell_width(ranked.iter().map(|a| a.region().len() + 2).max().unwrap_or(0));
        let median_width = cell_width(ranked.iter().map(|a| format_duration(a).chars().count()).max().unwrap_or(0));

        let mut output = String::new();
        for (i, aggregate) in ranked.iter().enumerate() {
            let rank = format!("{:>2}.", i + 1);
            let region = format!("[{}]", aggregate.region());
            let median = format_duration(aggregate);

            write!(output, "{:<rank_width$}{:<region_width$}", rank, region)
                .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;

            if aggregate.error_count() > 0 {
                let padding = " ".repeat(median_width.saturating_sub(median.chars().count()));
                write!(output, "{}{}({} errors)", self.colorize_median(aggregate, &median), padding, aggregate.error_count())
                    .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;
            } else {
                write!(output, "{}", self.colorize_median(aggregate, &median))
                    .map_err(|e| AppError::io(format!("Failed to format table: {}", e)))?;
            }
            output.push('\n');
        }

        Ok(output)
    }

    /// Just the region id of the top pick
    pub fn format_top(&self, ranked: &[RegionAggregate]) -> Result<String> {
        Self::top(ranked)
            .map(|a| format!("{}\n", a.region()))
            .ok_or_else(|| AppError::test_execution("no samples were collected, nothing to pick"))
    }

    /// `region,latency_ns,errors`, header first, rank order
    pub fn format_csv_cumulative(ranked: &[RegionAggregate]) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", CUMULATIVE_CSV_HEADER)
            .map_err(|e| AppError::io(format!("Failed to format CSV: {}", e)))?;
        for aggregate in ranked {
            writeln!(output, "{},{},{}", aggregate.region(), aggregate.median().as_nanos(), aggregate.error_count())
                .map_err(|e| AppError::io(format!("Failed to format CSV: {}", e)))?;
        }
        Ok(output)
    }

    /// One raw probe as `region,url,latency_ns,failed`
    pub fn format_probe_row(result: &ProbeResult) -> String {
        format!("{},{},{},{}", result.region, result.url, result.latency_ns(), result.failed)
    }

    /// Median of the one region a restricted run probed
    pub fn format_single(&self, ranked: &[RegionAggregate]) -> Result<String> {
        let aggregate = ranked
            .first()
            .ok_or_else(|| AppError::test_execution("no samples were collected for the requested region"))?;
        Ok(format!("{}\n", self.colorize_median(aggregate, &format_duration(aggregate))))
    }

    fn colorize_median(&self, aggregate: &RegionAggregate, text: &str) -> String {
        if self.use_color {
            text.color(PerformanceLevel::from_duration(aggregate.median()).color()).to_string()
        } else {
            text.to_string()
        }
    }
}

fn cell_width(content: usize) -> usize {
    content.max(MIN_CELL_WIDTH) + COLUMN_PADDING
}

fn format_duration(aggregate: &RegionAggregate) -> String {
    format!("{:?}", aggregate.median())
}
