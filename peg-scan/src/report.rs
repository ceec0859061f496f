//! Report rendering.

use peg_common::config::OutputFormat;
use peg_common::util::truncate_with_ellipsis;
use std::fmt::Write;

use crate::aggregator::{PegReport, AVERAGE_LABEL};

const NAME_HEADER: &str = "Fund Name";
const VALUE_HEADER: &str = "Forward PEG";
const MAX_NAME_CHARS: usize = 60;

/// Render a report in the requested format.
pub fn render(report: &PegReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_table(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Two-column table, one row per fund plus the average row.
pub fn render_table(report: &PegReport) -> String {
    let mut rows: Vec<(String, String)> = report
        .funds
        .iter()
        .map(|f| (truncate_with_ellipsis(&f.title, MAX_NAME_CHARS), format!("{:.2}", f.peg)))
        .collect();
    rows.push((AVERAGE_LABEL.to_string(), format!("{:.2}", report.average)));

    let name_width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .chain(std::iter::once(NAME_HEADER.len()))
        .max()
        .unwrap_or(NAME_HEADER.len());
    let value_width = rows
        .iter()
        .map(|(_, value)| value.len())
        .chain(std::iter::once(VALUE_HEADER.len()))
        .max()
        .unwrap_or(VALUE_HEADER.len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<name_width$}  {:>value_width$}", NAME_HEADER, VALUE_HEADER);
    let _ = writeln!(out, "{}  {}", "-".repeat(name_width), "-".repeat(value_width));

    let last = rows.len() - 1;
    for (i, (name, value)) in rows.iter().enumerate() {
        if i == last {
            let _ = writeln!(out, "{}  {}", "-".repeat(name_width), "-".repeat(value_width));
        }
        let pad = name_width - name.chars().count();
        let _ = writeln!(out, "{}{}  {:>value_width$}", name, " ".repeat(pad), value);
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failed funds:");
        for failure in &report.failures {
            let _ = writeln!(out, "  #{} {}: {}", failure.index, failure.address, failure.error);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{FundFailure, FundResult};
    use crate::ratio::CacheStats;

    fn fund(index: usize, title: &str, peg: f64) -> FundResult {
        FundResult {
            index,
            title: title.into(),
            peg,
            holdings: 2,
            resolved: 2,
            weight_sum: 100.0,
        }
    }

    fn report() -> PegReport {
        PegReport {
            funds: vec![fund(0, "Alpha Large Cap Fund", 1.4), fund(2, "Beta Bluechip", 0.0)],
            average: 0.7,
            failures: vec![],
            cache: CacheStats::default(),
        }
    }

    #[test]
    fn test_table_rows_and_average() {
        let table = render_table(&report());
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("Fund Name"));
        assert!(lines[0].ends_with("Forward PEG"));
        assert!(lines[2].starts_with("Alpha Large Cap Fund"));
        assert!(lines[2].ends_with("1.40"));
        assert!(lines[3].ends_with("0.00"));
        assert!(lines[5].starts_with("Average PEG"));
        assert!(lines[5].ends_with("0.70"));
    }

    #[test]
    fn test_table_lists_failures() {
        let mut r = report();
        r.failures.push(FundFailure {
            index: 1,
            address: "https://x/large-broken".into(),
            error: "holdings boundary not found".into(),
        });
        let table = render_table(&r);
        assert!(table.contains("Failed funds:"));
        assert!(table.contains("#1 https://x/large-broken"));
    }

    #[test]
    fn test_empty_report_still_has_average() {
        let r = PegReport {
            funds: vec![],
            average: 0.0,
            failures: vec![],
            cache: CacheStats::default(),
        };
        let table = render_table(&r);
        assert!(table.contains("Average PEG"));
        assert!(table.trim_end().ends_with("0.00"));
    }

    #[test]
    fn test_json_output() {
        let json = render(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["average"], 0.7);
        assert_eq!(value["funds"][0]["title"], "Alpha Large Cap Fund");
        assert_eq!(value["funds"][1]["peg"], 0.0);
    }
}
