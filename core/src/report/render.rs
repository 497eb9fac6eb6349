use std::fmt::Write as _;
use std::str::FromStr;

use serde::Deserialize;

use super::{Report, ReportRow};
use crate::error::HarnessError;

/// Output formats the report can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(HarnessError::config(format!(
                "unknown output format '{}' (expected table, json or csv)",
                other
            ))),
        }
    }
}

const TABLE_HEADERS: [&str; 7] = ["Case", "Binding", "Mode", "Mean", "Allocated", "Ratio", "Alloc Ratio"];

pub(crate) fn format_nanos(ns: f64) -> String {
    if ns >= 1_000_000_000.0 {
        format!("{:.3} s", ns / 1_000_000_000.0)
    } else if ns >= 1_000_000.0 {
        format!("{:.3} ms", ns / 1_000_000.0)
    } else if ns >= 1_000.0 {
        format!("{:.3} us", ns / 1_000.0)
    } else {
        format!("{:.1} ns", ns)
    }
}

pub(crate) fn format_bytes(bytes: f64) -> String {
    if bytes >= 1024.0 * 1024.0 {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    } else if bytes >= 1024.0 {
        format!("{:.2} KB", bytes / 1024.0)
    } else {
        format!("{:.0} B", bytes)
    }
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map(|r| format!("{:.2}", r)).unwrap_or_else(|| "n/a".to_string())
}

fn table_cells(row: &ReportRow) -> [String; 7] {
    let case = if row.baseline {
        format!("{} (baseline)", row.case)
    } else {
        row.case.clone()
    };
    [
        case,
        row.binding.clone(),
        row.mode.to_string(),
        format_nanos(row.mean_ns),
        format_bytes(row.mean_alloc_bytes),
        format_ratio(row.time_ratio),
        format_ratio(row.alloc_ratio),
    ]
}

impl Report {
    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Table => Ok(self.render_table()),
            OutputFormat::Json => self.to_json(),
            OutputFormat::Csv => Ok(self.render_csv()),
        }
    }

    pub fn render_table(&self) -> String {
        let body: Vec<[String; 7]> = self.rows.iter().map(table_cells).collect();
        let mut widths = TABLE_HEADERS.map(str::len);
        for cells in &body {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let write_line = |out: &mut String, cells: &[&str]| {
            let line: Vec<String> = cells
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(idx, (cell, width))| {
                    // Text columns align left, numbers right.
                    if idx < 3 {
                        format!("{:<width$}", cell, width = width)
                    } else {
                        format!("{:>width$}", cell, width = width)
                    }
                })
                .collect();
            let _ = writeln!(out, "| {} |", line.join(" | "));
        };

        write_line(&mut out, &TABLE_HEADERS);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(out, "|-{}-|", rule.join("-|-"));
        for cells in &body {
            let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
            write_line(&mut out, &refs);
        }

        if !self.excluded.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Excluded cells:");
            for cell in &self.excluded {
                let _ = writeln!(out, "  {} [{}]: {}", cell.case, cell.binding, cell.error);
            }
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_csv(&self) -> String {
        let mut out = String::from(
            "case,binding,mode,baseline,samples,mean_ns,min_ns,max_ns,mean_alloc_bytes,time_ratio,alloc_ratio\n",
        );
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{},\"{}\",{},{},{},{:.3},{},{},{:.1},{},{}",
                row.case,
                row.binding,
                row.mode,
                row.baseline,
                row.samples,
                row.mean_ns,
                row.min_ns,
                row.max_ns,
                row.mean_alloc_bytes,
                row.time_ratio.map(|r| format!("{:.6}", r)).unwrap_or_default(),
                row.alloc_ratio.map(|r| format!("{:.6}", r)).unwrap_or_default(),
            );
        }
        out
    }
}
